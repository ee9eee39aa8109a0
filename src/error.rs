//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// URL Poller 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum PollerError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// HTTP客户端构建错误
    #[error("HTTP客户端错误: {0}")]
    Http(#[from] reqwest::Error),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 探测失败
///
/// 流水线中唯一的错误类型。它不会中断任何任务，
/// 只会被折叠成状态文本并累加资源的连续错误计数。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProbeFailure(pub String);

impl ProbeFailure {
    /// 创建新的探测失败
    pub fn new(description: impl Into<String>) -> Self {
        Self(description.into())
    }

    /// 失败描述
    pub fn description(&self) -> &str {
        &self.0
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, PollerError>;
