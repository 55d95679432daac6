//! 答题主循环 - 编排层
//!
//! 单线程协作式循环：分类 → 分发 → 推进，一次只处理一道题。
//! 控制线程通过 ControlHandle 请求暂停/停止，循环在每个迭代
//! 间隙和所有长睡眠里检查标志。

use anyhow::Result;
use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser::connect_to_browser_and_page;
use crate::config::Config;
use crate::error::{AppError, OracleError};
use crate::infrastructure::DomQuery;
use crate::models::PageState;
use crate::services::{Navigator, PageClassifier};
use crate::utils::{logging, ControlHandle, Pacing};
use crate::workflow::{ProcessResult, QuestionCtx, QuestionFlow};

/// 连续 unknown 达到这个数就提示一次并重新计数
const UNKNOWN_NOTICE_THRESHOLD: usize = 10;

/// 答题计数（对 GUI 暴露的状态面）
#[derive(Debug, Default, Clone, Copy)]
pub struct SolveStats {
    /// 已处理的题数
    pub questions_answered: usize,
    /// 其中答对的题数（不含故意答错和跳过）
    pub correct_count: usize,
}

/// 应用主结构
pub struct App {
    _browser: Browser,
    dom: DomQuery,
    flow: QuestionFlow,
    classifier: PageClassifier,
    navigator: Navigator,
    pacing: Pacing,
    control: ControlHandle,
    stats: SolveStats,
}

impl App {
    /// 初始化应用：校验配置、连接浏览器、校验 Oracle
    pub async fn initialize(config: Config) -> Result<Self> {
        if config.access_key.is_empty() {
            return Err(AppError::config("访问密钥未设置，请先填写访问密钥").into());
        }

        logging::init_log_file(&config.output_log_file)?;
        log_startup(&config);

        let flow = QuestionFlow::new(&config);
        flow.verify_oracle().await?;

        let (browser, page) =
            connect_to_browser_and_page(config.browser_debug_port, &config.tab_url_keywords)
                .await?;
        info!("✓ 已连接到浏览器，等待题目页面...");

        let pacing = Pacing::from_config(&config);
        Ok(Self {
            _browser: browser,
            dom: DomQuery::new(page),
            flow,
            classifier: PageClassifier::new(),
            navigator: Navigator::new(pacing.clone()),
            pacing,
            control: ControlHandle::new(),
            stats: SolveStats::default(),
        })
    }

    /// 控制句柄（GUI / 控制线程用它请求暂停和停止）
    pub fn control(&self) -> ControlHandle {
        self.control.clone()
    }

    /// 当前计数
    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// 运行答题主循环
    pub async fn run(&mut self) -> Result<()> {
        let mut consecutive_unknown = 0usize;

        loop {
            if self.control.should_stop() {
                break;
            }
            self.control.wait_if_paused().await;
            if self.control.should_stop() {
                break;
            }

            let state = self.classifier.classify(&self.dom).await;
            info!("页面状态: {}", state);

            match state {
                PageState::Loading => {
                    consecutive_unknown = 0;
                    self.control
                        .sleep_cancellable(std::time::Duration::from_secs(1))
                        .await;
                }

                PageState::Complete => {
                    info!(
                        "🎉 作业完成！共处理 {} 题，答对 {} 题",
                        self.stats.questions_answered, self.stats.correct_count
                    );
                    break;
                }

                PageState::Recharge => {
                    consecutive_unknown = 0;
                    info!("检测到概念资源页，打开并读完再回来...");
                    self.navigator.handle_recharge_page(&self.dom).await;
                    sleep(self.pacing.sample(1.0, 2.0)).await;
                    self.navigator.click_next_question(&self.dom).await;
                    self.control
                        .sleep_cancellable(self.pacing.question_delay())
                        .await;
                }

                PageState::Reading => {
                    consecutive_unknown = 0;
                    info!("检测到阅读页，点击下一步...");
                    sleep(self.pacing.sample(1.0, 3.0)).await;
                    self.navigator.click_next_button(&self.dom).await;
                    self.control
                        .sleep_cancellable(self.pacing.question_delay())
                        .await;
                }

                PageState::Content => {
                    consecutive_unknown = 0;
                    info!("检测到过渡内容页，点击 Continue...");
                    self.navigator.click_continue(&self.dom).await;
                    sleep(self.pacing.sample(1.0, 2.0)).await;
                }

                PageState::Unknown => {
                    consecutive_unknown += 1;
                    if consecutive_unknown > UNKNOWN_NOTICE_THRESHOLD {
                        info!("长时间未检测到题目内容，继续等待...");
                        consecutive_unknown = 0;
                    }
                    self.control
                        .sleep_cancellable(std::time::Duration::from_secs(2))
                        .await;
                }

                PageState::Question => {
                    consecutive_unknown = 0;
                    self.stats.questions_answered += 1;
                    let ctx = QuestionCtx::new(self.stats.questions_answered);

                    match self.flow.run(&self.dom, &ctx, &self.control).await {
                        Ok(ProcessResult::Answered { intentional_miss }) => {
                            if !intentional_miss {
                                self.stats.correct_count += 1;
                            }
                        }
                        Ok(ProcessResult::Skipped) => {}
                        Err(e) => {
                            // 凭证失效终止整个运行，其他错误吸收后继续
                            if let Some(OracleError::Unauthorized { .. }) =
                                e.downcast_ref::<OracleError>()
                            {
                                error!("❌ {}，终止运行", e);
                                return Err(e);
                            }
                            warn!("处理题目时出错: {}，稍后继续", e);
                            self.control
                                .sleep_cancellable(std::time::Duration::from_secs(3))
                                .await;
                        }
                    }
                    info!(
                        "📊 进度: 已答 {} 题 / 答对 {} 题",
                        self.stats.questions_answered, self.stats.correct_count
                    );
                }
            }
        }

        info!(
            "答题循环结束。共处理 {} 题，答对 {} 题",
            self.stats.questions_answered, self.stats.correct_count
        );
        Ok(())
    }
}

// ========== 日志辅助函数 ==========

fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 自动答题模式");
    info!("📊 目标正确率: {:.0}%", config.target_accuracy * 100.0);
    info!(
        "⏱️ 题间延迟: {:.1}s - {:.1}s",
        config.min_delay, config.max_delay
    );
    info!("{}", "=".repeat(60));
}
