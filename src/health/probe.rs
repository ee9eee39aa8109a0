//! 探测器实现
//!
//! 定义探测接口，并提供基于HTTP HEAD请求的默认实现

use crate::error::{ProbeFailure, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::error::Error as _;
use std::time::Duration;
use tracing::debug;

/// 探测器trait，定义单次存活检查接口
///
/// 流水线只依赖这个契约：成功时返回状态文本，失败时返回 [`ProbeFailure`]。
/// 任何满足契约的实现（HTTP HEAD、TCP连接、ping）都可以互换。
#[async_trait]
pub trait Probe: Send + Sync {
    /// 对指定端点执行一次探测
    ///
    /// # 参数
    /// * `endpoint` - 端点标识（通常是URL）
    ///
    /// # 返回
    /// * `Result<String, ProbeFailure>` - 状态文本或失败描述
    async fn probe(&self, endpoint: &str) -> std::result::Result<String, ProbeFailure>;
}

/// HTTP HEAD 探测器
pub struct HttpProbe {
    /// HTTP客户端
    client: Client,
}

impl HttpProbe {
    /// 创建新的HTTP探测器
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时时间
    ///
    /// # 返回
    /// * `Result<Self>` - 探测器实例
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self { client })
    }

    /// 将HTTP状态码渲染为状态行，例如 `200 OK`
    fn status_line(status: StatusCode) -> String {
        match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        }
    }

    /// 把请求错误连同其 `source()` 链渲染为失败描述
    ///
    /// reqwest 把DNS失败也归为连接错误，只有底层原因才能区分，
    /// 例如 `error sending request: client error (Connect): dns error: ...`。
    fn describe_request_error(error: reqwest::Error) -> String {
        let error = error.without_url();
        let mut description = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            let cause_text = cause.to_string();
            if !description.contains(&cause_text) {
                description.push_str(": ");
                description.push_str(&cause_text);
            }
            source = cause.source();
        }
        description
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, endpoint: &str) -> std::result::Result<String, ProbeFailure> {
        // 任何HTTP响应都视为探测成功，只有传输层错误才算失败
        match self.client.head(endpoint).send().await {
            Ok(response) => {
                let status = Self::status_line(response.status());
                debug!(endpoint, status = %status, "HEAD 请求完成");
                Ok(status)
            }
            Err(e) => Err(ProbeFailure::new(Self::describe_request_error(e))),
        }
    }
}
