//! 状态监视器
//!
//! 状态表只属于监视器自己的任务。其他组件只能拿到一个只写的
//! `mpsc::Sender<State>`，通过发送状态更新来间接修改它，
//! 因此状态表不需要任何锁。

use crate::health::report::{Reporter, Snapshot};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// 状态更新通道的缓冲大小
const UPDATE_BUFFER: usize = 1;

/// 某个URL的最新状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    /// 资源URL
    pub url: String,
    /// 状态文本（HTTP状态行或错误描述）
    pub status: String,
}

impl State {
    /// 创建新的状态更新
    pub fn new(url: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: status.into(),
        }
    }
}

/// 状态监视器
pub struct StateMonitor<R> {
    /// 报告间隔
    interval: Duration,
    /// 报告输出端
    reporter: R,
}

impl<R: Reporter> StateMonitor<R> {
    /// 创建新的状态监视器
    ///
    /// # 参数
    /// * `interval` - 报告间隔
    /// * `reporter` - 报告输出端
    pub fn new(interval: Duration, reporter: R) -> Self {
        Self { interval, reporter }
    }

    /// 启动监视器任务
    ///
    /// # 返回
    /// * `mpsc::Sender<State>` - 状态更新的发送端，监视器唯一的对外入口
    /// * `JoinHandle<()>` - 任务句柄，所有发送端被丢弃后任务结束
    pub fn spawn(self) -> (mpsc::Sender<State>, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    async fn run(mut self, mut updates: mpsc::Receiver<State>) {
        let mut url_status: HashMap<String, String> = HashMap::new();

        // 第一次报告发生在一个完整周期之后
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval_ms = self.interval.as_millis() as u64, "状态监视器已启动");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.reporter.report(&Snapshot::new(&url_status));
                }
                update = updates.recv() => match update {
                    Some(state) => {
                        debug!(url = %state.url, status = %state.status, "更新状态");
                        url_status.insert(state.url, state.status);
                    }
                    None => break,
                },
            }
        }

        info!("状态监视器已停止");
    }
}
