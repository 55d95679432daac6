//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 管理应用生命周期和答题主循环：
//! - 连接浏览器、校验 Oracle（初始化）
//! - 轮询页面状态并按状态分发（主循环）
//! - 维护 questionsAnswered / correctCount 计数
//! - 响应协作式暂停/停止请求
//!
//! ## 层次关系
//!
//! ```text
//! solve_loop::App（分类 → 按状态分发）
//!     ↓
//! workflow::QuestionFlow（处理单个 Question）
//!     ↓
//! services（能力层：classify / extract / solve / execute / navigate）
//!     ↓
//! infrastructure（基础设施：DomQuery）
//! ```
//!
//! 只做调度和统计，不做具体业务判断。

pub mod solve_loop;

pub use solve_loop::{App, SolveStats};
