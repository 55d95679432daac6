//! 单题处理流程 - 流程层
//!
//! 定义"一道题"的完整处理顺序：
//! 提取 → 模拟阅读 → 求解（带一次重试）→ 解释 → 故意答错注入
//! → 执行 → 信心提交 → 资源复习检查 → 下一题
//!
//! 不持有 Page 资源，只依赖业务能力（services）。

use anyhow::Result;
use rand::Rng;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::OracleError;
use crate::infrastructure::DomQuery;
use crate::models::{Action, QuestionData, QuestionKind};
use crate::services::{
    ActionExecutor, ErrorInjector, Navigator, OracleClient, PageClassifier, QuestionExtractor,
};
use crate::utils::logging::truncate_text;
use crate::utils::{ControlHandle, Pacing};
use crate::workflow::QuestionCtx;

/// 单题处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// 已作答
    Answered {
        /// 这题是不是故意答错的
        intentional_miss: bool,
    },
    /// 跳过（题型无法识别 / 答案不可用）
    Skipped,
}

/// 重试前的固定退避
const RETRY_BACKOFF: std::time::Duration = std::time::Duration::from_secs(3);

/// 单题处理流程
pub struct QuestionFlow {
    classifier: PageClassifier,
    extractor: QuestionExtractor,
    oracle: OracleClient,
    injector: ErrorInjector,
    executor: ActionExecutor,
    navigator: Navigator,
    pacing: Pacing,
}

impl QuestionFlow {
    pub fn new(config: &Config) -> Self {
        let pacing = Pacing::from_config(config);
        Self {
            classifier: PageClassifier::new(),
            extractor: QuestionExtractor::new(),
            oracle: OracleClient::new(config),
            injector: ErrorInjector::new(config.target_accuracy),
            executor: ActionExecutor::new(pacing.clone()),
            navigator: Navigator::new(pacing.clone()),
            pacing,
        }
    }

    /// 处理当前页面上的一道题
    pub async fn run(
        &self,
        dom: &DomQuery,
        ctx: &QuestionCtx,
        control: &ControlHandle,
    ) -> Result<ProcessResult> {
        let question = self.extractor.extract(dom).await;

        if question.kind() == QuestionKind::Unknown {
            info!("[Q{}] 题型无法识别，跳过", ctx.question_num);
            return self.skip_question(dom, control).await;
        }

        info!(
            "[Q{}] {}",
            ctx.question_num,
            truncate_text(&question.prompt_text, 60)
        );

        // 模拟阅读题干，偶尔滚动一下
        let reading = self.pacing.reading_time(&question.prompt_text);
        control.sleep_cancellable(reading).await;
        self.random_scroll(dom).await;

        // 求解（带一次重试）
        let action = match self.solve_with_retry(&question, ctx).await? {
            Some(action) => action,
            None => return self.skip_question(dom, control).await,
        };

        let (action, was_miss) = self.injector.maybe_inject(action, &question);

        if action.is_empty() {
            warn!(
                "[Q{}] 答案解析后没有可执行内容，跳过",
                ctx.question_num
            );
            return self.skip_question(dom, control).await;
        }

        self.executor.execute(&action, dom).await;
        let miss_tag = if was_miss { " (故意答错)" } else { "" };
        info!(
            "[Q{}]   -> [{}] {}{}",
            ctx.question_num,
            action.kind(),
            action.answer_text,
            miss_tag
        );

        // 提交
        sleep(self.pacing.sample(0.5, 1.5)).await;
        self.navigator.submit_with_confidence(dom).await;

        // 提交后可能被要求复习概念资源
        sleep(self.pacing.sample(1.5, 2.5)).await;
        if self.classifier.needs_resource_review(dom).await {
            info!("[Q{}] 需要复习概念资源，绕行阅读", ctx.question_num);
            self.navigator.handle_recharge_page(dom).await;
            sleep(self.pacing.sample(1.0, 2.0)).await;
        }

        sleep(self.pacing.sample(1.0, 2.0)).await;
        self.navigator.click_next_question(dom).await;

        let delay = self.pacing.question_delay();
        info!("[Q{}]   等待 {:.1}s...", ctx.question_num, delay.as_secs_f64());
        control.sleep_cancellable(delay).await;

        Ok(ProcessResult::Answered {
            intentional_miss: was_miss,
        })
    }

    /// 向 Oracle 要答案并解释成动作，失败退避后重试一次
    ///
    /// 凭证失效直接向上传播；重试仍失败则返回 None（跳过此题）。
    async fn solve_with_retry(
        &self,
        question: &QuestionData,
        ctx: &QuestionCtx,
    ) -> Result<Option<Action>> {
        match self.oracle.solve(question).await {
            Ok(answer) => Ok(Some(crate::services::interpreter::interpret(
                &answer, question,
            ))),
            Err(e) if !e.is_retryable() => {
                error!("[Q{}] {}", ctx.question_num, e);
                Err(e.into())
            }
            Err(e) => {
                warn!("[Q{}] 服务器错误: {}，重试中...", ctx.question_num, e);
                sleep(RETRY_BACKOFF).await;
                match self.oracle.solve(question).await {
                    Ok(answer) => Ok(Some(crate::services::interpreter::interpret(
                        &answer, question,
                    ))),
                    Err(e2) if !e2.is_retryable() => {
                        error!("[Q{}] {}", ctx.question_num, e2);
                        Err(e2.into())
                    }
                    Err(e2) => {
                        warn!(
                            "[Q{}] 服务器再次出错: {}，跳过此题",
                            ctx.question_num, e2
                        );
                        Ok(None)
                    }
                }
            }
        }
    }

    /// 跳过当前题：推进页面并等一个题间隔
    async fn skip_question(
        &self,
        dom: &DomQuery,
        control: &ControlHandle,
    ) -> Result<ProcessResult> {
        sleep(self.pacing.sample(2.0, 4.0)).await;
        self.navigator.click_next_button(dom).await;
        control.sleep_cancellable(self.pacing.question_delay()).await;
        Ok(ProcessResult::Skipped)
    }

    /// 30% 概率在作答前轻轻滚动一下页面
    async fn random_scroll(&self, dom: &DomQuery) {
        let (roll, amount): (f64, i64) = {
            let mut rng = rand::rng();
            (rng.random_range(0.0..1.0), rng.random_range(-150..=150))
        };
        if roll < 0.3 {
            let amount = if amount == 0 { 50 } else { amount };
            dom.scroll_by(amount).await;
            sleep(self.pacing.sample(0.3, 0.8)).await;
        }
    }

    /// 启动前校验 Oracle 可达性
    pub async fn verify_oracle(&self) -> Result<(), OracleError> {
        self.oracle.verify().await
    }
}
