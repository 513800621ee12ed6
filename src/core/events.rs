//! 发往宿主前台的事件

use crate::core::error::ListingError;
use crate::core::model::{ComparisonResult, TransferResult};
use tokio::sync::mpsc;
use tracing::info;

/// 比较操作的结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOutcome {
    Completed(ComparisonResult),
    /// 列表阶段失败，不返回部分结果
    Failed(ListingError),
    /// 在列表与分类之间被取消
    Cancelled,
}

/// 引擎事件，均从后台任务发出
///
/// 每个被接受的操作恰好产生一个 `*Finished` 事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Log(String),
    TransferFinished { result: TransferResult, dry_run: bool },
    ComparisonFinished(ComparisonOutcome),
}

/// 事件发送端，同时写入 tracing
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl Notifier {
    pub fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.send(EngineEvent::Log(message));
    }

    /// 接收端已关闭时丢弃事件
    pub fn send(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}
