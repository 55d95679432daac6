//! 答案解释器 - 业务能力层
//!
//! 把 Oracle 的自由文本解析成与题型匹配的 Action。
//! 纯函数：同样的文本和题目永远得到同样的动作。
//! 解析不动的内容降级成空/部分字段，绝不抛错——
//! 能不能执行由执行器和主循环判断。

use regex::Regex;

use crate::models::{Action, ActionOp, MatchPair, QuestionBody, QuestionData};

/// 从思维链回复里取出最终答案行
///
/// 优先取第一个 `ANSWER:` 行（大小写不敏感），没有就取
/// 最后一个非空行。
pub fn extract_answer_line(response_text: &str) -> String {
    let text = response_text.trim();
    if let Ok(re) = Regex::new(r"(?im)^ANSWER:\s*(.+)$") {
        if let Some(caps) = re.captures(text) {
            if let Some(m) = caps.get(1) {
                return m.as_str().trim().to_string();
            }
        }
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .next_back()
        .unwrap_or(text)
        .to_string()
}

/// `ANSWER:` 标记之后的全部文本（用于多行答案的题型）
fn answer_tail(response_text: &str) -> String {
    let text = response_text.trim();
    if let Ok(re) = Regex::new(r"(?i)ANSWER:") {
        if let Some(m) = re.find(text) {
            return text[m.end()..].trim().to_string();
        }
    }
    text.to_string()
}

/// 单选字母归一化：去掉 `)` `.` `:`，超过一个字符取首字符
fn normalize_letter(token: &str) -> String {
    let cleaned = token
        .to_uppercase()
        .replace(')', "")
        .replace('.', "")
        .replace(':', "")
        .trim()
        .to_string();
    match cleaned.chars().next() {
        Some(first) if cleaned.chars().count() > 1 => first.to_string(),
        _ => cleaned,
    }
}

/// 把 Oracle 的回复解析成可执行动作
pub fn interpret(response_text: &str, qd: &QuestionData) -> Action {
    match &qd.body {
        QuestionBody::Ordering {
            items, item_refs, ..
        } => {
            let tail = answer_tail(response_text);
            let marker = Regex::new(r"^\d+[\.\)\:]\s*").ok();
            let mut ordered_items = Vec::new();
            for line in tail.lines() {
                let mut line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if let Some(re) = &marker {
                    line = re.replace(&line, "").trim().to_string();
                }
                line = line.trim_start_matches('-').trim().to_string();
                if !line.is_empty() {
                    ordered_items.push(line);
                }
            }

            Action {
                answer_text: ordered_items.join(" -> "),
                op: ActionOp::Ordering {
                    ordered_items,
                    original_items: items.clone(),
                    item_refs: item_refs.clone(),
                },
            }
        }

        QuestionBody::Matching {
            source_labels,
            source_refs,
            ..
        } => {
            let tail = answer_tail(response_text);
            let mut matches = Vec::new();
            for line in tail.lines() {
                let line = line.trim();
                if let Some((left, right)) = line.split_once("->") {
                    matches.push(MatchPair {
                        source: left.trim().trim_start_matches(['-', ' ']).to_string(),
                        target: right.trim().to_string(),
                    });
                } else if line.contains(':')
                    && !line.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true)
                {
                    if let Some((left, right)) = line.split_once(':') {
                        matches.push(MatchPair {
                            source: left.trim().trim_start_matches(['-', ' ']).to_string(),
                            target: right.trim().to_string(),
                        });
                    }
                }
            }

            Action {
                answer_text: matches
                    .iter()
                    .map(|m| format!("{}->{}", m.source, m.target))
                    .collect::<Vec<_>>()
                    .join(", "),
                op: ActionOp::Matching {
                    matches,
                    source_labels: source_labels.clone(),
                    drop_zones: source_refs.clone(),
                },
            }
        }

        QuestionBody::McSingle { choices } => {
            let letter = normalize_letter(&extract_answer_line(response_text));
            let target = choices
                .iter()
                .find(|c| c.label.to_uppercase() == letter)
                .map(|c| c.target.clone());

            Action {
                answer_text: letter,
                op: ActionOp::Click {
                    targets: target.into_iter().collect(),
                },
            }
        }

        QuestionBody::McMulti { choices } => {
            let answer = extract_answer_line(response_text);
            let letters: Vec<String> = answer
                .split(',')
                .map(|token| {
                    token
                        .trim()
                        .to_uppercase()
                        .replace(')', "")
                        .replace('.', "")
                })
                .collect();

            // 逐个解析，解析不到的字母跳过
            let targets = letters
                .iter()
                .filter_map(|letter| {
                    choices
                        .iter()
                        .find(|c| c.label.to_uppercase() == *letter)
                        .map(|c| c.target.clone())
                })
                .collect();

            Action {
                answer_text: letters.join(", "),
                op: ActionOp::MultiClick { targets },
            }
        }

        QuestionBody::Fill {
            input_refs,
            blank_count,
        } => {
            let answer = extract_answer_line(response_text);
            let values = if *blank_count > 1 {
                split_fill_values(&answer, input_refs.len())
            } else {
                vec![answer]
            };

            Action {
                answer_text: values.join("; "),
                op: ActionOp::MultiType {
                    targets: input_refs.clone(),
                    values,
                },
            }
        }

        QuestionBody::Dropdown { selects } => {
            let answer = extract_answer_line(response_text);
            let mut values = Vec::new();
            for part in answer.split(|c| c == ';' || c == '\n') {
                let part = part.trim();
                if let Some((_, value)) = part.split_once(':') {
                    values.push(value.trim().to_string());
                } else if !part.is_empty() {
                    values.push(part.to_string());
                }
            }

            Action {
                answer_text: values.join(", "),
                op: ActionOp::Dropdown {
                    targets: selects.iter().map(|s| s.target.clone()).collect(),
                    values,
                },
            }
        }

        QuestionBody::Unknown => {
            let answer = extract_answer_line(response_text);
            Action {
                answer_text: answer.clone(),
                op: ActionOp::Type {
                    targets: Vec::new(),
                    values: vec![answer],
                },
            }
        }
    }
}

/// 多空填空的取值切分
///
/// 依次尝试 `;`、`,`、换行，第一个切出多段的分隔符胜出；
/// 去掉每段开头的 `N.` / `N:` 编号；不足补空串，超出截断。
fn split_fill_values(answer: &str, blank_count: usize) -> Vec<String> {
    let mut values: Vec<String> = answer
        .split(';')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect();
    if values.len() == 1 && blank_count > 1 {
        values = answer
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
    }
    if values.len() == 1 && blank_count > 1 {
        values = answer
            .split('\n')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect();
    }

    if let Ok(re) = Regex::new(r"^\d+[\.:]\s*") {
        values = values
            .iter()
            .map(|v| re.replace(v, "").to_string())
            .collect();
    }

    values.resize(blank_count, String::new());
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Choice, DropdownSelect, ElementRef};

    fn mc_question(multi: bool, labels: &[&str]) -> QuestionData {
        let choices = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Choice {
                label: label.to_string(),
                text: format!("Choice {}", label),
                target: ElementRef::new("input.form-check-input", i),
            })
            .collect();
        QuestionData {
            prompt_text: "Test question".into(),
            context_text: String::new(),
            body: if multi {
                QuestionBody::McMulti { choices }
            } else {
                QuestionBody::McSingle { choices }
            },
        }
    }

    // ========== 答案行提取 ==========

    #[test]
    fn test_extract_simple_answer() {
        assert_eq!(extract_answer_line("Some reasoning here.\nANSWER: B"), "B");
    }

    #[test]
    fn test_extract_case_insensitive() {
        assert_eq!(extract_answer_line("Thinking...\nanswer: C"), "C");
    }

    #[test]
    fn test_extract_answer_with_text() {
        assert_eq!(
            extract_answer_line("Step 1: ...\nStep 2: ...\nANSWER: mitosis"),
            "mitosis"
        );
    }

    #[test]
    fn test_no_marker_returns_last_line() {
        assert_eq!(extract_answer_line("line1\nline2"), "line2");
        assert_eq!(
            extract_answer_line("First line\nSecond line\nThe answer is B"),
            "The answer is B"
        );
    }

    #[test]
    fn test_multiple_markers_uses_first() {
        assert_eq!(
            extract_answer_line("ANSWER: x\nMore thinking...\nANSWER: y"),
            "x"
        );
    }

    // ========== 单选 ==========

    #[test]
    fn test_mc_single_letter() {
        let qd = mc_question(false, &["A", "B", "C"]);
        let action = interpret("ANSWER: B", &qd);
        assert_eq!(action.answer_text, "B");
        match action.op {
            ActionOp::Click { targets } => {
                assert_eq!(targets, vec![ElementRef::new("input.form-check-input", 1)]);
            }
            _ => panic!("应该是 Click 动作"),
        }
    }

    #[test]
    fn test_mc_single_letter_with_paren() {
        let qd = mc_question(false, &["A", "B", "C"]);
        let action = interpret("ANSWER: A)", &qd);
        assert_eq!(action.answer_text, "A");
    }

    #[test]
    fn test_mc_single_chain_of_thought() {
        let qd = mc_question(false, &["A", "B", "C", "D"]);
        let text = "The question asks about X.\nOption A is wrong because...\nOption C is correct.\nANSWER: C";
        let action = interpret(text, &qd);
        assert_eq!(action.answer_text, "C");
        match action.op {
            ActionOp::Click { targets } => assert_eq!(targets[0].index, 2),
            _ => panic!("应该是 Click 动作"),
        }
    }

    #[test]
    fn test_mc_single_no_matching_choice() {
        // 没有匹配的字母不是错误，目标列表为空即可
        let qd = mc_question(false, &["A", "B"]);
        let action = interpret("ANSWER: Z", &qd);
        assert_eq!(action.answer_text, "Z");
        match action.op {
            ActionOp::Click { targets } => assert!(targets.is_empty()),
            _ => panic!("应该是 Click 动作"),
        }
    }

    // ========== 多选 ==========

    #[test]
    fn test_mc_multi_select() {
        let qd = mc_question(true, &["A", "B", "C", "D"]);
        let action = interpret("ANSWER: A, C", &qd);
        assert_eq!(action.answer_text, "A, C");
        match action.op {
            ActionOp::MultiClick { targets } => {
                assert_eq!(targets.len(), 2);
                assert_eq!(targets[0].index, 0);
                assert_eq!(targets[1].index, 2);
            }
            _ => panic!("应该是 MultiClick 动作"),
        }
    }

    #[test]
    fn test_mc_multi_end_to_end_scenario() {
        // 带思维链的完整回复：B、D 两个目标
        let qd = mc_question(true, &["A", "B", "C", "D"]);
        let action = interpret("Thinking...\nANSWER: B, D", &qd);
        match action.op {
            ActionOp::MultiClick { targets } => {
                assert_eq!(
                    targets,
                    vec![
                        ElementRef::new("input.form-check-input", 1),
                        ElementRef::new("input.form-check-input", 3),
                    ]
                );
            }
            _ => panic!("应该是 MultiClick 动作"),
        }
    }

    #[test]
    fn test_mc_multi_skips_unmatched_letters() {
        let qd = mc_question(true, &["A", "B"]);
        let action = interpret("ANSWER: A, Z", &qd);
        match action.op {
            ActionOp::MultiClick { targets } => assert_eq!(targets.len(), 1),
            _ => panic!("应该是 MultiClick 动作"),
        }
    }

    // ========== 填空 ==========

    fn fill_question(blank_count: usize) -> QuestionData {
        QuestionData {
            prompt_text: "Test".into(),
            context_text: String::new(),
            body: QuestionBody::Fill {
                input_refs: (0..blank_count)
                    .map(|i| ElementRef::new("input[type='text']", i))
                    .collect(),
                blank_count,
            },
        }
    }

    #[test]
    fn test_fill_single_blank() {
        let action = interpret("ANSWER: mitosis", &fill_question(1));
        match action.op {
            ActionOp::MultiType { values, .. } => assert_eq!(values, vec!["mitosis"]),
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    #[test]
    fn test_fill_multi_blank_semicolons() {
        let action = interpret("ANSWER: cell; membrane", &fill_question(2));
        match action.op {
            ActionOp::MultiType { values, .. } => {
                assert_eq!(values, vec!["cell", "membrane"]);
            }
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    #[test]
    fn test_fill_multi_blank_commas() {
        let action = interpret("ANSWER: one, two, three", &fill_question(3));
        match action.op {
            ActionOp::MultiType { values, .. } => {
                assert_eq!(values, vec!["one", "two", "three"]);
            }
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    #[test]
    fn test_fill_pads_missing_values() {
        // 只有一个答案也要补齐到 blank_count 个
        let action = interpret("ANSWER: only one", &fill_question(3));
        match action.op {
            ActionOp::MultiType { values, .. } => {
                assert_eq!(values.len(), 3);
                assert_eq!(values[0], "only one");
                assert_eq!(values[1], "");
                assert_eq!(values[2], "");
            }
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    #[test]
    fn test_fill_strips_numbering() {
        let action = interpret("ANSWER: 1. cell; 2. wall", &fill_question(2));
        match action.op {
            ActionOp::MultiType { values, .. } => {
                assert_eq!(values, vec!["cell", "wall"]);
            }
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    #[test]
    fn test_fill_truncates_excess_values() {
        let action = interpret("ANSWER: a; b; c; d", &fill_question(2));
        match action.op {
            ActionOp::MultiType { values, .. } => assert_eq!(values, vec!["a", "b"]),
            _ => panic!("应该是 MultiType 动作"),
        }
    }

    // ========== 排序 ==========

    fn ordering_question(items: &[&str]) -> QuestionData {
        QuestionData {
            prompt_text: "Order these".into(),
            context_text: String::new(),
            body: QuestionBody::Ordering {
                items: items.iter().map(|s| s.to_string()).collect(),
                item_refs: (0..items.len())
                    .map(|i| ElementRef::new(".choice-item", i))
                    .collect(),
            },
        }
    }

    #[test]
    fn test_ordering_numbered_list() {
        let action = interpret("1. Gamma\n2. Alpha\n3. Beta", &ordering_question(&["Alpha", "Beta", "Gamma"]));
        match action.op {
            ActionOp::Ordering { ordered_items, original_items, .. } => {
                assert_eq!(ordered_items, vec!["Gamma", "Alpha", "Beta"]);
                assert_eq!(original_items, vec!["Alpha", "Beta", "Gamma"]);
            }
            _ => panic!("应该是 Ordering 动作"),
        }
    }

    #[test]
    fn test_ordering_with_answer_prefix() {
        let action = interpret(
            "Thinking...\nANSWER:\n1. B\n2. C\n3. A",
            &ordering_question(&["A", "B", "C"]),
        );
        match action.op {
            ActionOp::Ordering { ordered_items, .. } => {
                assert_eq!(ordered_items, vec!["B", "C", "A"]);
            }
            _ => panic!("应该是 Ordering 动作"),
        }
    }

    #[test]
    fn test_ordering_dash_markers() {
        let action = interpret("- Beta\n- Alpha", &ordering_question(&["Alpha", "Beta"]));
        match action.op {
            ActionOp::Ordering { ordered_items, .. } => {
                assert_eq!(ordered_items, vec!["Beta", "Alpha"]);
            }
            _ => panic!("应该是 Ordering 动作"),
        }
    }

    // ========== 连线 ==========

    fn matching_question() -> QuestionData {
        QuestionData {
            prompt_text: "Match".into(),
            context_text: String::new(),
            body: QuestionBody::Matching {
                source_labels: vec!["Left1".into(), "Left2".into()],
                target_labels: vec!["Right1".into(), "Right2".into()],
                source_refs: vec![
                    ElementRef::new(".match-zone", 0),
                    ElementRef::new(".match-zone", 1),
                ],
                target_refs: vec![
                    ElementRef::new(".choice-item-wrapper", 0),
                    ElementRef::new(".choice-item-wrapper", 1),
                ],
            },
        }
    }

    #[test]
    fn test_matching_arrow_format() {
        let action = interpret("Left1 -> Right2\nLeft2 -> Right1", &matching_question());
        match action.op {
            ActionOp::Matching { matches, .. } => {
                assert_eq!(matches.len(), 2);
                assert_eq!(
                    matches[0],
                    MatchPair {
                        source: "Left1".into(),
                        target: "Right2".into()
                    }
                );
                assert_eq!(
                    matches[1],
                    MatchPair {
                        source: "Left2".into(),
                        target: "Right1".into()
                    }
                );
            }
            _ => panic!("应该是 Matching 动作"),
        }
    }

    #[test]
    fn test_matching_colon_format() {
        let action = interpret("Initiator: Buys product", &matching_question());
        match action.op {
            ActionOp::Matching { matches, .. } => {
                assert_eq!(matches[0].source, "Initiator");
                assert_eq!(matches[0].target, "Buys product");
            }
            _ => panic!("应该是 Matching 动作"),
        }
    }

    #[test]
    fn test_matching_unparseable_line_dropped() {
        // 没有箭头也没有冒号的行直接丢弃，不报错
        let action = interpret(
            "Left1 -> Right2\nthis line has no separator",
            &matching_question(),
        );
        match action.op {
            ActionOp::Matching { matches, .. } => assert_eq!(matches.len(), 1),
            _ => panic!("应该是 Matching 动作"),
        }
    }

    #[test]
    fn test_matching_numeric_colon_line_dropped() {
        // "1: xxx" 这类编号行不算配对
        let action = interpret("1: not a pair", &matching_question());
        match action.op {
            ActionOp::Matching { matches, .. } => assert!(matches.is_empty()),
            _ => panic!("应该是 Matching 动作"),
        }
    }

    // ========== 下拉 ==========

    #[test]
    fn test_dropdown_parsing() {
        let qd = QuestionData {
            prompt_text: "Fill ___".into(),
            context_text: String::new(),
            body: QuestionBody::Dropdown {
                selects: vec![
                    DropdownSelect {
                        options: vec!["a".into(), "b".into()],
                        target: ElementRef::new("select", 0),
                    },
                    DropdownSelect {
                        options: vec!["c".into(), "d".into()],
                        target: ElementRef::new("select", 1),
                    },
                ],
            },
        };
        let action = interpret("ANSWER: 1: b; 2: c", &qd);
        match action.op {
            ActionOp::Dropdown { values, targets } => {
                assert_eq!(values, vec!["b", "c"]);
                assert_eq!(targets.len(), 2);
            }
            _ => panic!("应该是 Dropdown 动作"),
        }
    }

    #[test]
    fn test_dropdown_plain_values() {
        let qd = QuestionData {
            prompt_text: "Fill ___".into(),
            context_text: String::new(),
            body: QuestionBody::Dropdown {
                selects: vec![DropdownSelect {
                    options: vec!["x".into()],
                    target: ElementRef::new("select", 0),
                }],
            },
        };
        let action = interpret("ANSWER: verbatim value", &qd);
        match action.op {
            ActionOp::Dropdown { values, .. } => {
                assert_eq!(values, vec!["verbatim value"]);
            }
            _ => panic!("应该是 Dropdown 动作"),
        }
    }
}
