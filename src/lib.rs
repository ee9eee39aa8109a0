//! URL Poller - 并发URL轮询工具
//!
//! 一组固定的网络资源被反复探测：
//! - 固定数量的轮询工作者并发执行探测
//! - 每个资源按连续错误次数线性退避
//! - 唯一的状态监视器持有最新状态并周期性报告
//! - 资源通过通道转移所有权，全程无锁

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;

// 重新导出主要类型
pub use config::{Config, GlobalConfig, ResourceConfig};
pub use error::{PollerError, ProbeFailure};
pub use health::{Dispatcher, PipelineSettings, Probe, Resource, StateMonitor};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
