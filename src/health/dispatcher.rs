//! 流水线调度中心
//!
//! 负责创建待处理、完成、状态三个通道，启动状态监视器和轮询工作者，
//! 播种初始资源，并在完成队列上循环：每收到一个资源就交给调度器延迟重排。

use crate::config::Config;
use crate::error::{ConfigError, Result};
use crate::health::monitor::StateMonitor;
use crate::health::poller::{PendingQueue, Poller};
use crate::health::probe::Probe;
use crate::health::report::Reporter;
use crate::health::resource::{BackoffPolicy, Resource};
use crate::health::scheduler::Scheduler;
use std::future::{pending, Future};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 流水线运行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// 轮询工作者数量
    pub pollers: usize,
    /// 退避策略
    pub backoff: BackoffPolicy,
    /// 状态报告间隔
    pub status_interval: Duration,
}

impl PipelineSettings {
    /// 从配置文件构建运行参数
    pub fn from_config(config: &Config) -> Self {
        Self {
            pollers: config.global.pollers,
            backoff: BackoffPolicy::new(
                config.global.poll_interval(),
                config.global.error_backoff(),
            ),
            status_interval: config.global.status_interval(),
        }
    }

    /// 检查运行参数
    ///
    /// 没有工作者时流水线会立即结束；报告间隔为0时计时器无法创建；
    /// 任一退避参数为0都会破坏延迟随错误次数严格递增的性质。
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.pollers == 0 {
            return Err("轮询工作者数量不能为0".to_string());
        }
        if self.status_interval.is_zero() {
            return Err("状态报告间隔不能为0".to_string());
        }
        if self.backoff.poll_interval.is_zero() {
            return Err("轮询间隔不能为0".to_string());
        }
        if self.backoff.error_backoff.is_zero() {
            return Err("错误退避时间不能为0".to_string());
        }
        Ok(())
    }
}

/// 流水线调度中心
pub struct Dispatcher<R> {
    /// 运行参数
    settings: PipelineSettings,
    /// 被轮询的URL，按播种顺序排列
    urls: Vec<String>,
    /// 探测器
    probe: Arc<dyn Probe>,
    /// 报告输出端
    reporter: R,
}

impl<R: Reporter> Dispatcher<R> {
    /// 创建新的调度中心
    ///
    /// # 参数
    /// * `settings` - 运行参数
    /// * `urls` - 被轮询的URL列表
    /// * `probe` - 探测器
    /// * `reporter` - 报告输出端
    ///
    /// # 返回
    /// * `Result<Self>` - 运行参数无效时返回 [`ConfigError::ValidationError`]
    pub fn new(
        settings: PipelineSettings,
        urls: Vec<String>,
        probe: Arc<dyn Probe>,
        reporter: R,
    ) -> Result<Self> {
        settings.validate().map_err(ConfigError::ValidationError)?;

        Ok(Self {
            settings,
            urls,
            probe,
            reporter,
        })
    }

    /// 运行流水线，永不返回
    pub async fn run(self) {
        self.run_until(pending::<()>()).await
    }

    /// 运行流水线，直到 `shutdown` 完成
    ///
    /// 关闭时会取消播种任务、所有工作者和所有延迟中的资源，
    /// 然后等待状态监视器退出。
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let Self {
            settings,
            urls,
            probe,
            reporter,
        } = self;

        info!(
            pollers = settings.pollers,
            resources = urls.len(),
            "启动轮询流水线"
        );

        // 容量为1的通道最接近无缓冲的交接语义
        let (pending_tx, pending_rx) = mpsc::channel::<Resource>(1);
        let (complete_tx, mut complete_rx) = mpsc::channel::<Resource>(1);

        let (status_tx, monitor) = StateMonitor::new(settings.status_interval, reporter).spawn();

        let pending_rx: PendingQueue = Arc::new(Mutex::new(pending_rx));
        let mut workers: Vec<JoinHandle<()>> = (0..settings.pollers)
            .map(|id| {
                Poller::new(
                    id,
                    Arc::clone(&probe),
                    Arc::clone(&pending_rx),
                    complete_tx.clone(),
                    status_tx.clone(),
                )
                .spawn()
            })
            .collect();
        drop(pending_rx);
        drop(complete_tx);
        drop(status_tx);

        // 播种必须和下面的完成循环并发进行，否则工作者少于资源时会死锁
        let seeder = Self::spawn_seeder(urls, pending_tx.clone());

        let mut scheduler = Scheduler::new(settings.backoff, pending_tx);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("收到关闭信号，正在停止轮询流水线");
                    break;
                }
                completed = complete_rx.recv() => match completed {
                    Some(resource) => scheduler.schedule(resource),
                    None => {
                        debug!("所有工作者均已退出");
                        break;
                    }
                },
            }
        }

        seeder.abort();
        scheduler.shutdown().await;
        for worker in &workers {
            worker.abort();
        }
        for worker in workers.drain(..) {
            let _ = worker.await;
        }

        // 工作者退出后所有状态发送端都已丢弃，监视器随之结束
        let _ = monitor.await;
        info!("轮询流水线已停止");
    }

    /// 启动播种任务：为每个URL发送一个全新的资源
    fn spawn_seeder(urls: Vec<String>, pending: mpsc::Sender<Resource>) -> JoinHandle<()> {
        tokio::spawn(async move {
            for url in urls {
                if pending.send(Resource::new(url)).await.is_err() {
                    return;
                }
            }
            debug!("初始资源播种完成");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GlobalConfig, ResourceConfig};
    use crate::error::PollerError;
    use crate::health::probe::HttpProbe;
    use crate::health::report::LogReporter;

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            global: GlobalConfig {
                poll_interval_seconds: 60,
                error_backoff_seconds: 10,
                status_interval_seconds: 5,
                pollers: 3,
                ..GlobalConfig::default()
            },
            resources: vec![ResourceConfig {
                url: "http://a/".to_string(),
            }],
        };

        let settings = PipelineSettings::from_config(&config);

        assert_eq!(settings.pollers, 3);
        assert_eq!(settings.status_interval, Duration::from_secs(5));
        assert_eq!(settings.backoff.delay_for(0), Duration::from_secs(60));
        assert_eq!(settings.backoff.delay_for(2), Duration::from_secs(80));
        assert!(settings.validate().is_ok());
    }

    fn valid_settings() -> PipelineSettings {
        PipelineSettings {
            pollers: 2,
            backoff: BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(1)),
            status_interval: Duration::from_secs(1),
        }
    }

    fn build(settings: PipelineSettings) -> Result<Dispatcher<LogReporter>> {
        let probe: Arc<dyn Probe> = Arc::new(HttpProbe::new(Duration::from_secs(1))?);
        Dispatcher::new(settings, vec!["http://a/".to_string()], probe, LogReporter)
    }

    #[tokio::test]
    async fn test_dispatcher_rejects_invalid_settings() {
        assert!(build(valid_settings()).is_ok());

        let no_pollers = PipelineSettings {
            pollers: 0,
            ..valid_settings()
        };
        let no_status_interval = PipelineSettings {
            status_interval: Duration::ZERO,
            ..valid_settings()
        };
        let flat_backoff = PipelineSettings {
            backoff: BackoffPolicy::new(Duration::from_secs(1), Duration::ZERO),
            ..valid_settings()
        };

        for (settings, expected) in [
            (no_pollers, "工作者"),
            (no_status_interval, "报告间隔"),
            (flat_backoff, "错误退避"),
        ] {
            match build(settings) {
                Err(PollerError::Config(ConfigError::ValidationError(msg))) => {
                    assert!(msg.contains(expected), "{msg}");
                }
                Err(other) => panic!("unexpected error: {other}"),
                Ok(_) => panic!("settings accepted: {expected}"),
            }
        }
    }
}
