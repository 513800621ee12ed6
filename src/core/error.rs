//! 错误类型

use std::time::Duration;
use thiserror::Error;

/// 子进程调用层的错误
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to wait for process: {0}")]
    Wait(#[source] std::io::Error),
    #[error("timed out after {}", format_budget(*.0))]
    Timeout(Duration),
    #[error("terminated by operator")]
    Terminated,
}

/// 列表失败
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("Timeout ({})", format_budget(*.budget))]
    Timeout { budget: Duration },
    #[error("listing failed: {0}")]
    ToolFailure(String),
}

impl From<InvocationError> for ListingError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Timeout(budget) => ListingError::Timeout { budget },
            other => ListingError::ToolFailure(other.to_string()),
        }
    }
}

/// 单个条目传输失败，Display 即为写入结果的诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemTransferError {
    #[error("Timeout ({})", format_budget(*.budget))]
    Timeout { budget: Duration },
    #[error("{detail}")]
    ToolExit { code: Option<i32>, detail: String },
    #[error("{0}")]
    InvocationFailure(String),
    #[error("terminated by operator")]
    Terminated,
}

impl From<InvocationError> for ItemTransferError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Timeout(budget) => ItemTransferError::Timeout { budget },
            InvocationError::Terminated => ItemTransferError::Terminated,
            other => ItemTransferError::InvocationFailure(other.to_string()),
        }
    }
}

/// 时间预算的可读形式
///
/// 默认预算都是整分钟，显示为 `10 min`。不足整分钟的预算（配置或测试中的短预算）
/// 不取整到分钟，而是按秒显示（`90 s`），不足一秒按毫秒显示，避免出现 `0 min`。
pub fn format_budget(budget: Duration) -> String {
    let secs = budget.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else if secs > 0 {
        format!("{} s", secs)
    } else {
        format!("{} ms", budget.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_budget() {
        assert_eq!(format_budget(Duration::from_secs(600)), "10 min");
        assert_eq!(format_budget(Duration::from_secs(300)), "5 min");
        assert_eq!(format_budget(Duration::from_secs(90)), "90 s");
        assert_eq!(format_budget(Duration::from_secs(59)), "59 s");
        assert_eq!(format_budget(Duration::from_millis(250)), "250 ms");
    }

    #[test]
    fn test_invocation_error_mapping() {
        let timeout = ItemTransferError::from(InvocationError::Timeout(Duration::from_secs(600)));
        assert_eq!(timeout.to_string(), "Timeout (10 min)");

        let listing = ListingError::from(InvocationError::Terminated);
        assert_eq!(
            listing,
            ListingError::ToolFailure("terminated by operator".to_string())
        );
    }
}
