//! 答案 Oracle 客户端 - 业务能力层
//!
//! 封装与答题服务器的所有交互。服务器怎么推理不归这里管，
//! 这里只定义请求载荷和响应解析。
//!
//! 职责：
//! - verify：启动时确认服务器可达
//! - solve：按题型构建提示词，POST /api/solve，返回自由文本
//! - 把 HTTP 故障映射成带类型的 OracleError，重试策略交给流程层

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::OracleError;
use crate::models::{QuestionBody, QuestionData};

/// 求解请求超时
const SOLVE_TIMEOUT: Duration = Duration::from_secs(30);
/// 健康检查超时
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct SolveResponse {
    answer: String,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorResponse {
    #[serde(default)]
    error: String,
}

/// Oracle 客户端
pub struct OracleClient {
    http: reqwest::Client,
    server_url: String,
    access_key: String,
    model: String,
    temperature: f64,
}

impl OracleClient {
    /// 创建新的 Oracle 客户端
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(SOLVE_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            server_url: config.server_url.trim_end_matches('/').to_string(),
            access_key: config.access_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        }
    }

    /// 启动时确认服务器可达
    pub async fn verify(&self) -> Result<(), OracleError> {
        let url = format!("{}/health", self.server_url);
        let resp = self
            .http
            .get(&url)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| OracleError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;

        if resp.status().is_success() {
            info!("✓ 已连接到答题服务器");
            Ok(())
        } else {
            Err(OracleError::ServerError {
                status: resp.status().as_u16(),
                message: "健康检查失败".to_string(),
            })
        }
    }

    /// 把一道题发给服务器，返回自由文本回答
    pub async fn solve(&self, question: &QuestionData) -> Result<String, OracleError> {
        let prompt = build_prompt(question);
        debug!("提示词长度: {} 字符", prompt.chars().count());

        let url = format!("{}/api/solve", self.server_url);
        let payload = json!({
            "access_key": self.access_key,
            "prompt": prompt,
            "model": self.model,
            "temperature": self.temperature,
        });

        let resp = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| OracleError::Unreachable {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        match status.as_u16() {
            200 => {
                let body: SolveResponse =
                    resp.json().await.map_err(|e| OracleError::ServerError {
                        status: 200,
                        message: format!("响应解析失败: {}", e),
                    })?;
                debug!("服务器响应: {}", body.answer);
                Ok(body.answer)
            }
            403 => {
                let body: ErrorResponse = resp.json().await.unwrap_or_default();
                let message = if body.error.to_lowercase().contains("expired") {
                    "访问密钥已过期，请续费".to_string()
                } else {
                    "访问密钥无效".to_string()
                };
                Err(OracleError::Unauthorized { message })
            }
            429 => Err(OracleError::RateLimited),
            _ => {
                let body: ErrorResponse = resp.json().await.unwrap_or_default();
                Err(OracleError::ServerError {
                    status: status.as_u16(),
                    message: if body.error.is_empty() {
                        "未知服务器错误".to_string()
                    } else {
                        body.error
                    },
                })
            }
        }
    }
}

// ========== 提示词构建 ==========

/// 按题型构建提示词（阅读材料永远在最前面）
pub fn build_prompt(qd: &QuestionData) -> String {
    let ctx = if qd.context_text.is_empty() {
        String::new()
    } else {
        format!(
            "The following passage is from the textbook. Use it as your PRIMARY \
             source when answering:\n\n{}\n\n",
            qd.context_text
        )
    };

    match &qd.body {
        QuestionBody::Ordering { items, .. } => {
            let items_text = items
                .iter()
                .map(|item| format!("- {}", item))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{ctx}Put the following items in the correct order.\n\n\
                 Question: {}\n\n\
                 Items (currently in this order):\n{items_text}\n\n\
                 Reply with ONLY the items in the correct order, one per line, \
                 numbered 1, 2, 3, etc. Use the EXACT text of each item.\n\n\
                 Correct order:",
                qd.prompt_text
            )
        }
        QuestionBody::Matching {
            source_labels,
            target_labels,
            ..
        } => {
            let sources_text = source_labels
                .iter()
                .map(|s| format!("- {}", s))
                .collect::<Vec<_>>()
                .join("\n");
            let targets_text = target_labels
                .iter()
                .map(|t| format!("- {}", t))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{ctx}Match each item on the left with the correct item on the right.\n\n\
                 Question: {}\n\n\
                 Left items:\n{sources_text}\n\n\
                 Right items:\n{targets_text}\n\n\
                 Reply with each match on its own line in the format:\n\
                 Left Item -> Right Item\n\
                 Use the EXACT text of each item.\n\n\
                 Matches:",
                qd.prompt_text
            )
        }
        QuestionBody::McSingle { choices } => {
            let choices_text = choices
                .iter()
                .map(|c| format!("{}) {}", c.label, c.text))
                .collect::<Vec<_>>()
                .join("\n");
            let labels = choices
                .iter()
                .map(|c| c.label.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{ctx}Question: {}\n\n{choices_text}\n\n\
                 Think step-by-step, then on the LAST line write ONLY:\n\
                 ANSWER: <letter>\n\
                 where <letter> is one of {labels}.",
                qd.prompt_text
            )
        }
        QuestionBody::McMulti { choices } => {
            let choices_text = choices
                .iter()
                .map(|c| format!("{}) {}", c.label, c.text))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "{ctx}Question: {}\n\n{choices_text}\n\n\
                 Select ALL correct options. Think step-by-step, then on the LAST \
                 line write ONLY:\n\
                 ANSWER: <letters separated by commas>\n\
                 Example: ANSWER: A, C",
                qd.prompt_text
            )
        }
        QuestionBody::Fill { blank_count, .. } => {
            if *blank_count > 1 {
                format!(
                    "{ctx}Question: {}\n\n\
                     This question has exactly {blank_count} blanks to fill in. \
                     Each blank may require one or more words.\n\n\
                     Think step-by-step using the textbook passage above, then on \
                     the LAST line write ONLY:\n\
                     ANSWER: answer1; answer2; answer3\n\
                     Separate each blank's answer with a semicolon. Use the exact \
                     terminology from the textbook passage when possible.",
                    qd.prompt_text
                )
            } else {
                format!(
                    "{ctx}Question: {}\n\n\
                     Fill in the blank. The answer may be one or more words.\n\n\
                     Think step-by-step using the textbook passage above, then on \
                     the LAST line write ONLY:\n\
                     ANSWER: <your answer>\n\
                     Use the exact terminology from the textbook passage when possible.",
                    qd.prompt_text
                )
            }
        }
        QuestionBody::Dropdown { selects } => {
            let mut dropdown_info = String::new();
            for (i, select) in selects.iter().enumerate() {
                dropdown_info.push_str(&format!(
                    "Blank {} options: {}\n",
                    i + 1,
                    select.options.join(", ")
                ));
            }
            format!(
                "{ctx}Sentence: {}\n\n{dropdown_info}\n\
                 Fill in each blank with the correct option from the choices given. \
                 Think step-by-step, then on the LAST line write ONLY:\n\
                 ANSWER: 1: chosen_option; 2: chosen_option",
                qd.prompt_text
            )
        }
        QuestionBody::Unknown => {
            format!(
                "{ctx}Question: {}\n\n\
                 Think step-by-step, then on the LAST line write ONLY:\n\
                 ANSWER: <your answer>",
                qd.prompt_text
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, ElementRef};

    fn mc_single(context: &str) -> QuestionData {
        QuestionData {
            prompt_text: "What is 2+2?".into(),
            context_text: context.into(),
            body: QuestionBody::McSingle {
                choices: vec![
                    Choice {
                        label: "A".into(),
                        text: "3".into(),
                        target: ElementRef::new("input", 0),
                    },
                    Choice {
                        label: "B".into(),
                        text: "4".into(),
                        target: ElementRef::new("input", 1),
                    },
                ],
            },
        }
    }

    #[test]
    fn test_mc_single_prompt_has_choices() {
        let prompt = build_prompt(&mc_single(""));
        assert!(prompt.contains("A) 3"));
        assert!(prompt.contains("B) 4"));
        assert!(prompt.contains("ANSWER:"));
        assert!(prompt.contains("one of A, B"));
    }

    #[test]
    fn test_context_appears_before_question() {
        let prompt = build_prompt(&mc_single("Important passage here."));
        let ctx_pos = prompt.find("Important passage here").unwrap();
        let q_pos = prompt.find("Question: What is 2+2?").unwrap();
        assert!(ctx_pos < q_pos);
    }

    #[test]
    fn test_fill_multi_blank_prompt() {
        let qd = QuestionData {
            prompt_text: "Fill ___ and ___".into(),
            context_text: String::new(),
            body: QuestionBody::Fill {
                input_refs: vec![ElementRef::new("input", 0), ElementRef::new("input", 1)],
                blank_count: 2,
            },
        };
        let prompt = build_prompt(&qd);
        assert!(prompt.contains("2 blanks"));
        assert!(prompt.contains("semicolon"));
    }

    #[test]
    fn test_ordering_prompt_lists_items() {
        let qd = QuestionData {
            prompt_text: "Order these".into(),
            context_text: String::new(),
            body: QuestionBody::Ordering {
                items: vec!["Alpha".into(), "Beta".into()],
                item_refs: vec![],
            },
        };
        let prompt = build_prompt(&qd);
        assert!(prompt.contains("- Alpha"));
        assert!(prompt.contains("- Beta"));
        assert!(prompt.to_lowercase().contains("correct order"));
    }

    #[test]
    fn test_dropdown_prompt_lists_options() {
        let qd = QuestionData {
            prompt_text: "Pick ___".into(),
            context_text: String::new(),
            body: QuestionBody::Dropdown {
                selects: vec![crate::models::DropdownSelect {
                    options: vec!["cat".into(), "dog".into()],
                    target: ElementRef::new("select", 0),
                }],
            },
        };
        let prompt = build_prompt(&qd);
        assert!(prompt.contains("Blank 1 options: cat, dog"));
    }
}
