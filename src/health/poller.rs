//! 轮询工作者
//!
//! 每个工作者从待处理队列取出资源，执行探测，把结果发给状态监视器，
//! 再把资源交回完成队列。多个工作者共享同一个待处理队列的接收端。

use crate::health::monitor::State;
use crate::health::probe::Probe;
use crate::health::resource::Resource;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// 多个工作者共享的待处理队列
pub type PendingQueue = Arc<Mutex<mpsc::Receiver<Resource>>>;

/// 轮询工作者
pub struct Poller {
    /// 工作者编号
    id: usize,
    /// 探测器
    probe: Arc<dyn Probe>,
    /// 待处理队列
    pending: PendingQueue,
    /// 完成队列
    complete: mpsc::Sender<Resource>,
    /// 状态更新发送端
    status: mpsc::Sender<State>,
}

impl Poller {
    /// 创建新的轮询工作者
    pub fn new(
        id: usize,
        probe: Arc<dyn Probe>,
        pending: PendingQueue,
        complete: mpsc::Sender<Resource>,
        status: mpsc::Sender<State>,
    ) -> Self {
        Self {
            id,
            probe,
            pending,
            complete,
            status,
        }
    }

    /// 在新任务中启动工作者
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// 工作者主循环
    ///
    /// 正常运行时永不返回；只有在某个通道关闭时才退出。
    pub async fn run(self) {
        debug!(poller = self.id, "轮询工作者已启动");

        loop {
            // 锁只在等待下一个资源期间持有，探测过程中其他工作者可以继续取任务
            let next = self.pending.lock().await.recv().await;
            let Some(mut resource) = next else {
                debug!(poller = self.id, "待处理队列已关闭");
                break;
            };

            let status = resource.poll(self.probe.as_ref()).await;
            debug!(poller = self.id, url = resource.url(), status = %status, "探测完成");

            if self
                .status
                .send(State::new(resource.url(), status))
                .await
                .is_err()
            {
                debug!(poller = self.id, "状态监视器已关闭");
                break;
            }

            if self.complete.send(resource).await.is_err() {
                debug!(poller = self.id, "完成队列已关闭");
                break;
            }
        }

        info!(poller = self.id, "轮询工作者已退出");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeFailure;
    use async_trait::async_trait;

    /// 对URL中含有 "bad" 的端点返回失败
    struct UrlProbe;

    #[async_trait]
    impl Probe for UrlProbe {
        async fn probe(&self, endpoint: &str) -> Result<String, ProbeFailure> {
            if endpoint.contains("bad") {
                Err(ProbeFailure::new("ERR"))
            } else {
                Ok("OK".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_poller_publishes_status_then_completes() {
        let (pending_tx, pending_rx) = mpsc::channel(1);
        let (complete_tx, mut complete_rx) = mpsc::channel(1);
        let (status_tx, mut status_rx) = mpsc::channel(1);

        let handle = Poller::new(
            0,
            Arc::new(UrlProbe),
            Arc::new(Mutex::new(pending_rx)),
            complete_tx,
            status_tx,
        )
        .spawn();

        pending_tx.send(Resource::new("http://bad/")).await.unwrap();

        let state = status_rx.recv().await.unwrap();
        assert_eq!(state, State::new("http://bad/", "ERR"));

        let resource = complete_rx.recv().await.unwrap();
        assert_eq!(resource.url(), "http://bad/");
        assert_eq!(resource.consecutive_errors(), 1);

        drop(pending_tx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_pollers_share_pending_queue() {
        let (pending_tx, pending_rx) = mpsc::channel(1);
        let (complete_tx, mut complete_rx) = mpsc::channel(1);
        let (status_tx, mut status_rx) = mpsc::channel(16);
        let pending: PendingQueue = Arc::new(Mutex::new(pending_rx));

        let handles: Vec<_> = (0..3)
            .map(|id| {
                Poller::new(
                    id,
                    Arc::new(UrlProbe),
                    Arc::clone(&pending),
                    complete_tx.clone(),
                    status_tx.clone(),
                )
                .spawn()
            })
            .collect();
        drop(complete_tx);
        drop(status_tx);

        tokio::spawn(async move {
            for i in 0..10 {
                pending_tx
                    .send(Resource::new(format!("http://ok-{i}/")))
                    .await
                    .unwrap();
            }
        });

        let mut completed = Vec::new();
        while completed.len() < 10 {
            let resource = complete_rx.recv().await.unwrap();
            completed.push(resource.url().to_string());
        }
        completed.sort();
        completed.dedup();
        assert_eq!(completed.len(), 10);

        for handle in handles {
            handle.await.unwrap();
        }
        let mut states = 0;
        while status_rx.recv().await.is_some() {
            states += 1;
        }
        assert_eq!(states, 10);
    }
}
