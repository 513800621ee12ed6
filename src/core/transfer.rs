//! 逐条目复制

use crate::core::error::ItemTransferError;
use crate::core::events::Notifier;
use crate::core::model::{FileEntry, TransferResult};
use crate::core::supervisor::OperationState;
use crate::paths;
use crate::tool::{CopyOptions, ToolCommand, ToolRunner};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 默认单个条目的时间预算
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(600);

/// 一次传输请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub entries: Vec<FileEntry>,
    pub source_remote: String,
    pub dest_remote: String,
    pub dest_path: String,
    pub dry_run: bool,
    pub skip_existing: bool,
    pub ignore_errors: bool,
}

impl TransferRequest {
    /// 条目在目标端的完整路径
    pub fn destination_for(&self, entry: &FileEntry) -> String {
        format!(
            "{}{}",
            self.dest_remote,
            paths::join(&self.dest_path, &entry.name)
        )
    }

    pub fn source_for(&self, entry: &FileEntry) -> String {
        format!("{}{}", self.source_remote, entry.path)
    }
}

/// 按输入顺序逐个执行复制，每个条目一次工具调用
pub struct TransferExecutor {
    runner: ToolRunner,
    budget: Duration,
    transfers: u32,
}

impl TransferExecutor {
    pub fn new(runner: ToolRunner, budget: Duration, transfers: u32) -> Self {
        Self {
            runner,
            budget,
            transfers,
        }
    }

    /// 执行传输
    ///
    /// 每个条目开始前检查运行标志，标志被清除时停止，剩余条目不计入失败。
    pub async fn execute(
        &self,
        request: &TransferRequest,
        state: &OperationState,
        notifier: &Notifier,
    ) -> TransferResult {
        let mut result = TransferResult {
            started_at: chrono::Utc::now().timestamp(),
            ..Default::default()
        };

        let items: Vec<&FileEntry> = request
            .entries
            .iter()
            .filter(|e| !e.is_parent_link())
            .collect();
        let total = items.len();
        let op = if request.dry_run { "测试" } else { "复制" };
        notifier.log(format!("{}开始 - {} 个条目", op, total));

        for (i, entry) in items.into_iter().enumerate() {
            if !state.should_continue() {
                result.cancelled = true;
                notifier.log(format!("{}已停止 - 剩余 {} 个条目未处理", op, total - i));
                break;
            }

            notifier.log(format!("[{}/{}] {}", i + 1, total, entry.name));
            match self.transfer_one(request, entry).await {
                Ok(()) => {
                    result.record_success(&entry.name);
                    notifier.log(format!("完成: {}", entry.name));
                }
                Err(e) => {
                    notifier.log(format!("失败: {} - {}", entry.name, e));
                    result.record_failure(&entry.name, e.to_string());
                }
            }
        }

        result.finished_at = chrono::Utc::now().timestamp();
        notifier.log(format!(
            "{}结束 - 成功 {}, 失败 {}",
            op,
            result.succeeded.len(),
            result.failed.len()
        ));
        result
    }

    /// 复制单个条目
    pub async fn transfer_one(
        &self,
        request: &TransferRequest,
        entry: &FileEntry,
    ) -> Result<(), ItemTransferError> {
        let source = request.source_for(entry);
        let dest = request.destination_for(entry);
        debug!("复制: {} -> {} (dir={})", source, dest, entry.is_dir);

        let options = CopyOptions {
            dry_run: request.dry_run,
            skip_existing: request.skip_existing,
            ignore_errors: request.ignore_errors,
            transfers: self.transfers,
        };
        let command = ToolCommand::copy(source, dest, entry.is_dir, options);
        let output = self.runner.run_as_current(&command, self.budget).await?;

        if output.success() {
            Ok(())
        } else {
            Err(ItemTransferError::ToolExit {
                code: output.code,
                detail: output.diagnostic(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dest_path: &str) -> TransferRequest {
        TransferRequest {
            entries: vec![],
            source_remote: "gdrive:".to_string(),
            dest_remote: "s3:".to_string(),
            dest_path: dest_path.to_string(),
            dry_run: false,
            skip_existing: true,
            ignore_errors: true,
        }
    }

    #[test]
    fn test_source_and_destination_paths() {
        let entry = FileEntry::file("a b.txt", "/docs/a b.txt", "10", "t", "gdrive:");

        let req = request("/backup/");
        assert_eq!(req.source_for(&entry), "gdrive:/docs/a b.txt");
        assert_eq!(req.destination_for(&entry), "s3:/backup/a b.txt");

        let req = request("/");
        assert_eq!(req.destination_for(&entry), "s3:/a b.txt");
    }
}
