//! 轮询流水线模块
//!
//! 提供资源探测、延迟退避、状态监视和流水线调度功能

pub mod dispatcher;
pub mod monitor;
pub mod poller;
pub mod probe;
pub mod report;
pub mod resource;
pub mod scheduler;

// 重新导出主要类型
pub use dispatcher::{Dispatcher, PipelineSettings};
pub use monitor::{State, StateMonitor};
pub use poller::{PendingQueue, Poller};
pub use probe::{HttpProbe, Probe};
pub use report::{LineReporter, LogReporter, Reporter, Snapshot};
pub use resource::{BackoffPolicy, Resource};
pub use scheduler::Scheduler;
