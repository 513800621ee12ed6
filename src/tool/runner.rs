use super::{ToolCommand, ToolOutput};
use crate::core::error::InvocationError;
use crate::core::supervisor::ProcessSupervisor;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// 启动外部工具并在时间预算内等待结果
#[derive(Clone)]
pub struct ToolRunner {
    program: PathBuf,
    /// 每次调用前置的全局参数
    base_args: Vec<String>,
    supervisor: Arc<ProcessSupervisor>,
}

impl ToolRunner {
    pub fn new(program: PathBuf, base_args: Vec<String>, supervisor: Arc<ProcessSupervisor>) -> Self {
        Self {
            program,
            base_args,
            supervisor,
        }
    }

    pub fn program(&self) -> &std::path::Path {
        &self.program
    }

    /// 运行一次调用
    pub async fn run(
        &self,
        command: &ToolCommand,
        budget: Duration,
    ) -> Result<ToolOutput, InvocationError> {
        self.invoke(command, budget, false).await
    }

    /// 运行一次调用，并标记为当前传输进程（可被取消终止）
    pub async fn run_as_current(
        &self,
        command: &ToolCommand,
        budget: Duration,
    ) -> Result<ToolOutput, InvocationError> {
        self.invoke(command, budget, true).await
    }

    async fn invoke(
        &self,
        command: &ToolCommand,
        budget: Duration,
        current: bool,
    ) -> Result<ToolOutput, InvocationError> {
        let label = command.label();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // 超时或取消时丢弃 future 即终止子进程
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| InvocationError::Spawn {
            tool: self.program.display().to_string(),
            source,
        })?;

        let handle = self.supervisor.register(child.id(), &label, current);
        debug!("启动: {} {}", self.program.display(), label);

        let result = tokio::select! {
            waited = tokio::time::timeout(budget, child.wait_with_output()) => match waited {
                Ok(Ok(output)) => Ok(ToolOutput::from_output(output)),
                Ok(Err(e)) => Err(InvocationError::Wait(e)),
                Err(_) => {
                    warn!("调用超时 ({:?}): {}", budget, label);
                    Err(InvocationError::Timeout(budget))
                }
            },
            _ = handle.terminated() => {
                warn!("调用被终止: {}", label);
                Err(InvocationError::Terminated)
            }
        };
        drop(handle);

        if let Ok(output) = &result {
            debug!("结束: {} (code={:?})", label, output.code);
        }
        result
    }
}
