//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// 主配置结构，包含全局配置和资源列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 被轮询的资源列表（顺序即播种顺序）
    pub resources: Vec<ResourceConfig>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 每个资源的基础轮询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// 每次连续错误追加的退避时间（秒）
    #[serde(default = "default_error_backoff")]
    pub error_backoff_seconds: u64,
    /// 状态报告间隔（秒）
    #[serde(default = "default_status_interval")]
    pub status_interval_seconds: u64,
    /// 轮询工作者数量
    #[serde(default = "default_pollers")]
    pub pollers: usize,
    /// 单次探测请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub request_timeout_seconds: u64,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// 资源配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceConfig {
    /// 资源URL
    pub url: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            error_backoff_seconds: default_error_backoff(),
            status_interval_seconds: default_status_interval(),
            pollers: default_pollers(),
            request_timeout_seconds: default_timeout(),
            log_level: default_log_level(),
        }
    }
}

impl GlobalConfig {
    /// 基础轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    /// 单位退避时间
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_seconds)
    }

    /// 状态报告间隔
    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_seconds)
    }

    /// 请求超时时间
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl Config {
    /// 按配置顺序返回所有资源URL
    pub fn urls(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.url.clone()).collect()
    }
}

// 默认值函数
fn default_poll_interval() -> u64 {
    60
}
fn default_error_backoff() -> u64 {
    10
}
fn default_status_interval() -> u64 {
    10
}
fn default_pollers() -> usize {
    2
}
fn default_timeout() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    // 验证全局配置
    if config.global.poll_interval_seconds == 0 {
        return Err("轮询间隔不能为0".to_string());
    }

    // 为0时连续错误不再拉长延迟
    if config.global.error_backoff_seconds == 0 {
        return Err("错误退避时间不能为0".to_string());
    }

    if config.global.status_interval_seconds == 0 {
        return Err("状态报告间隔不能为0".to_string());
    }

    if config.global.request_timeout_seconds == 0 {
        return Err("请求超时时间不能为0".to_string());
    }

    if config.global.pollers == 0 {
        return Err("轮询工作者数量不能为0".to_string());
    }

    // 验证日志级别
    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    // 验证资源配置
    if config.resources.is_empty() {
        return Err("至少需要配置一个资源".to_string());
    }

    let mut seen = HashSet::new();
    for resource in &config.resources {
        if !resource.url.starts_with("http://") && !resource.url.starts_with("https://") {
            return Err(format!("资源URL格式无效: {}", resource.url));
        }

        // 状态表以URL为键，重复的URL会互相覆盖
        if !seen.insert(resource.url.as_str()) {
            return Err(format!("资源URL重复: {}", resource.url));
        }
    }

    Ok(())
}
