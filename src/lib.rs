//! # Quiz Auto Solver
//!
//! 针对单页答题应用的自动作答程序：观察当前页面、判定页面状态、
//! 提取题目结构、向外部推理服务要答案、把答案变成一串拟人化的
//! 页面交互并执行。
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `DomQuery` - 唯一的 page owner，提供查询/执行/帧上下文能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个 Question
//! - `PageClassifier` - 页面状态判定能力
//! - `QuestionExtractor` - 题目结构提取能力
//! - `OracleClient` - 外部求解能力
//! - `interpreter` - 自由文本 → 动作解析能力
//! - `ErrorInjector` - 故意答错能力
//! - `ActionExecutor` - 动作执行能力（含重排与拖拽配对）
//! - `Navigator` - 页面推进能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一道题"的完整处理流程
//! - `QuestionCtx` - 上下文封装（题号）
//! - `QuestionFlow` - 流程编排（extract → solve → interpret → execute）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/solve_loop` - 答题主循环，管理状态分发、
//!   计数和协作式取消

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod selectors;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::connect_to_browser_and_page;
pub use config::Config;
pub use error::{AppError, AppResult, OracleError};
pub use infrastructure::DomQuery;
pub use models::{Action, ElementRef, PageState, QuestionData, QuestionKind};
pub use orchestrator::{App, SolveStats};
pub use utils::ControlHandle;
pub use workflow::{ProcessResult, QuestionCtx, QuestionFlow};
