//! 被轮询的资源
//!
//! 资源是流水线中流转的工作单元。发送 `Resource` 即转移所有权，
//! 因此同一时刻只会有一个任务持有并修改它。

use crate::health::probe::Probe;
use std::time::Duration;
use tracing::{debug, warn};

/// 退避策略
///
/// 延迟 = 基础轮询间隔 + 单位退避时间 × 连续错误次数。
/// 增长是线性且不设上限的：一直不健康的资源会被越来越少地探测。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// 基础轮询间隔
    pub poll_interval: Duration,
    /// 每次连续错误追加的时间
    pub error_backoff: Duration,
}

impl BackoffPolicy {
    /// 创建新的退避策略
    pub fn new(poll_interval: Duration, error_backoff: Duration) -> Self {
        Self {
            poll_interval,
            error_backoff,
        }
    }

    /// 计算给定连续错误次数下的延迟
    pub fn delay_for(&self, consecutive_errors: u32) -> Duration {
        self.poll_interval
            .saturating_add(self.error_backoff.saturating_mul(consecutive_errors))
    }
}

/// 被轮询的资源：端点加上连续错误计数
#[derive(Debug)]
pub struct Resource {
    url: String,
    err_count: u32,
}

impl Resource {
    /// 创建新资源，连续错误计数为0
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            err_count: 0,
        }
    }

    /// 资源URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// 当前连续错误次数
    pub fn consecutive_errors(&self) -> u32 {
        self.err_count
    }

    /// 探测资源并返回状态文本
    ///
    /// 成功时清零错误计数，失败时计数加一并返回失败描述。
    /// 失败只是数据，这个方法本身不会失败。
    pub async fn poll(&mut self, probe: &dyn Probe) -> String {
        match probe.probe(&self.url).await {
            Ok(status) => {
                if self.err_count > 0 {
                    debug!(url = %self.url, previous_errors = self.err_count, "资源恢复");
                }
                self.err_count = 0;
                status
            }
            Err(failure) => {
                self.err_count = self.err_count.saturating_add(1);
                warn!(
                    url = %self.url,
                    consecutive_errors = self.err_count,
                    "探测失败: {}",
                    failure
                );
                failure.to_string()
            }
        }
    }

    /// 下次探测前需要等待的时间
    pub fn delay_duration(&self, policy: &BackoffPolicy) -> Duration {
        policy.delay_for(self.err_count)
    }
}
