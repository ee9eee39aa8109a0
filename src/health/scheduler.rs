//! 延迟重排调度器
//!
//! 每个完成探测的资源都会获得一个独立的延迟任务：睡眠退避时间后
//! 把资源送回待处理队列。不同资源的等待互不阻塞。

use crate::health::resource::{BackoffPolicy, Resource};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::debug;

/// 延迟重排调度器
pub struct Scheduler {
    /// 退避策略
    policy: BackoffPolicy,
    /// 待处理队列发送端
    pending: mpsc::Sender<Resource>,
    /// 正在睡眠的资源
    sleeping: JoinSet<()>,
}

impl Scheduler {
    /// 创建新的调度器
    ///
    /// # 参数
    /// * `policy` - 退避策略
    /// * `pending` - 待处理队列发送端
    pub fn new(policy: BackoffPolicy, pending: mpsc::Sender<Resource>) -> Self {
        Self {
            policy,
            pending,
            sleeping: JoinSet::new(),
        }
    }

    /// 接管一个已完成的资源，延迟后重新入队
    pub fn schedule(&mut self, resource: Resource) {
        self.reap();

        let delay = resource.delay_duration(&self.policy);
        let pending = self.pending.clone();
        debug!(
            url = resource.url(),
            consecutive_errors = resource.consecutive_errors(),
            delay_ms = delay.as_millis() as u64,
            "资源进入延迟"
        );

        self.sleeping.spawn(async move {
            sleep(delay).await;
            let url = resource.url().to_string();
            if pending.send(resource).await.is_err() {
                debug!(url = %url, "待处理队列已关闭，放弃重新入队");
            }
        });
    }

    /// 当前处于延迟中的资源数量
    #[cfg(test)]
    pub(crate) fn sleeping(&self) -> usize {
        self.sleeping.len()
    }

    /// 回收已经结束的延迟任务
    fn reap(&mut self) {
        while self.sleeping.try_join_next().is_some() {}
    }

    /// 取消所有延迟任务
    pub async fn shutdown(&mut self) {
        self.sleeping.shutdown().await;
    }
}
