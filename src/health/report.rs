//! 状态快照与报告输出
//!
//! 状态监视器在每个报告周期生成一份 [`Snapshot`]，交给 [`Reporter`] 输出。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use tracing::{info, warn};

/// 某一时刻的状态表快照，按URL排序
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// 快照时间
    pub taken_at: DateTime<Utc>,
    /// URL -> 最近一次状态文本
    pub entries: BTreeMap<String, String>,
}

impl Snapshot {
    /// 从状态表构建快照
    pub fn new<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        Self {
            taken_at: Utc::now(),
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// 获取某个URL的状态
    pub fn get(&self, url: &str) -> Option<&str> {
        self.entries.get(url).map(String::as_str)
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 渲染为文本行：标题行之后每个URL一行
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len() + 1);
        lines.push("Current state:".to_string());
        lines.extend(
            self.entries
                .iter()
                .map(|(url, status)| format!(" {} {}", url, status)),
        );
        lines
    }
}

/// 报告输出端，接收周期性快照
///
/// 任何 `FnMut(&Snapshot)` 闭包都可以直接作为报告输出端。
pub trait Reporter: Send + 'static {
    /// 输出一份快照
    fn report(&mut self, snapshot: &Snapshot);
}

impl<F> Reporter for F
where
    F: FnMut(&Snapshot) + Send + 'static,
{
    fn report(&mut self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// 通过日志系统输出快照
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&mut self, snapshot: &Snapshot) {
        for line in snapshot.lines() {
            info!("{}", line);
        }
    }
}

/// 向任意写入端逐行输出快照
///
/// 写入和 flush 都是同步阻塞调用，直接在状态监视器任务中执行：
/// 写入端阻塞期间监视器不会接收新的状态更新，工作者发送状态时随之等待。
/// 适合标准输出或内存缓冲，不适合慢速的网络写入端。
pub struct LineReporter<W> {
    writer: W,
}

impl<W: Write + Send + 'static> LineReporter<W> {
    /// 创建新的行输出端
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// 取回内部写入端
    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }

    fn write_snapshot(&mut self, snapshot: &Snapshot) -> std::io::Result<()> {
        for line in snapshot.lines() {
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()
    }
}

impl LineReporter<std::io::Stdout> {
    /// 输出到标准输出
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> Reporter for LineReporter<W> {
    fn report(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.write_snapshot(snapshot) {
            warn!("写入状态报告失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sample_state() -> HashMap<String, String> {
        HashMap::from([
            ("http://b/".to_string(), "Connection refused".to_string()),
            ("http://a/".to_string(), "200 OK".to_string()),
        ])
    }

    #[test]
    fn test_snapshot_lines_are_sorted() {
        let snapshot = Snapshot::new(&sample_state());

        assert_eq!(
            snapshot.lines(),
            vec![
                "Current state:",
                " http://a/ 200 OK",
                " http://b/ Connection refused",
            ]
        );
        assert_eq!(snapshot.get("http://a/"), Some("200 OK"));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_empty_snapshot_has_header_only() {
        let snapshot = Snapshot::new(&HashMap::<String, String>::new());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.lines(), vec!["Current state:"]);
    }

    #[test]
    fn test_line_reporter_writes_lines() {
        let mut reporter = LineReporter::new(Vec::new());
        reporter.report(&Snapshot::new(&sample_state()));

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            output,
            "Current state:\n http://a/ 200 OK\n http://b/ Connection refused\n"
        );
    }

    #[test]
    fn test_closure_reporter() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut reporter = move |snapshot: &Snapshot| {
            let _ = tx.send(snapshot.len());
        };
        Reporter::report(&mut reporter, &Snapshot::new(&sample_state()));

        assert_eq!(rx.try_recv().unwrap(), 2);
    }
}
