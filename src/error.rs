//! 错误类型定义
//!
//! 分类原则：
//! - DOM 形状意外（元素不在、引用失效）不是错误，是数据——
//!   分类器和提取器对这类情况永远不返回 Err
//! - 只有凭证失效和不可恢复的网络故障才向上传播到主循环

use thiserror::Error;

/// Oracle 服务错误
///
/// 主循环按变体决定重试还是中止。
#[derive(Debug, Error)]
pub enum OracleError {
    /// 访问密钥无效或已过期，必须中止整个运行
    #[error("访问密钥无效: {message}")]
    Unauthorized { message: String },
    /// 请求频率限制
    #[error("请求频率限制，请稍后再试")]
    RateLimited,
    /// 服务器不可达（网络层失败）
    #[error("无法连接到服务器 {url}: {message}")]
    Unreachable { url: String, message: String },
    /// 服务器返回了非 200 的错误响应
    #[error("服务器错误 (状态 {status}): {message}")]
    ServerError { status: u16, message: String },
}

impl OracleError {
    /// 是否值得在固定退避后重试一次
    pub fn is_retryable(&self) -> bool {
        !matches!(self, OracleError::Unauthorized { .. })
    }
}

/// 应用程序错误
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),
    /// Oracle 服务错误
    #[error("Oracle错误: {0}")]
    Oracle(#[from] OracleError),
    /// 提取器无法识别题目结构
    #[error("无法识别题目结构: {message}")]
    Extraction { message: String },
    /// 动作引用的目标无法解析
    #[error("动作目标无法解析: {target}")]
    ActionUnresolvable { target: String },
    /// 配置错误
    #[error("配置错误: {message}")]
    Config { message: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {0}")]
    Json(#[from] serde_json::Error),
    /// 文件读写失败
    #[error("文件错误: {0}")]
    Io(#[from] std::io::Error),
    /// 其他错误（包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

// ========== 便捷构造函数 ==========

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        AppError::Extraction {
            message: message.into(),
        }
    }

    pub fn action_unresolvable(target: impl Into<String>) -> Self {
        AppError::ActionUnresolvable {
            target: target.into(),
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
