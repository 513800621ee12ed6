//! 集成测试共用的辅助函数
//!
//! 外部工具由 shell 脚本代替：引擎运行 `/bin/sh <脚本> <工具参数...>`，
//! 脚本中 `$1` 即工具子命令。脚本不直接执行，避免并行测试时出现 "text file busy"。

// 每个集成测试单独编译，不一定用到全部函数
#![allow(dead_code)]

use rcsync::{EngineConfig, EngineEvent, Orchestrator};
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

pub struct FakeTool {
    pub dir: TempDir,
    pub script: PathBuf,
}

impl FakeTool {
    /// 写入工具脚本，脚本可把参数追加到 `$CALLS` 指向的文件
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("tool.sh");
        let calls = dir.path().join("calls.log");
        let content = format!("CALLS='{}'\n{}\n", calls.display(), body);
        std::fs::write(&script, content).expect("write tool script");
        Self { dir, script }
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig {
            tool_args: vec![self.script.display().to_string()],
            ..EngineConfig::with_tool("/bin/sh")
        }
    }

    pub fn engine(&self) -> (Orchestrator, UnboundedReceiver<EngineEvent>) {
        Orchestrator::new(self.config())
    }

    /// 脚本追加到 `$CALLS` 的各行
    pub fn calls(&self) -> Vec<String> {
        std::fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

/// 等待下一个非日志事件
pub async fn next_finished(rx: &mut UnboundedReceiver<EngineEvent>) -> EngineEvent {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(15), rx.recv())
            .await
            .expect("engine event within timeout")
            .expect("event channel open");
        if !matches!(event, EngineEvent::Log(_)) {
            return event;
        }
    }
}

/// 完成事件发出后运行标志才释放，需要轮询
pub async fn wait_idle(engine: &Orchestrator) {
    for _ in 0..200 {
        if !engine.is_busy() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("engine still busy");
}

/// 等待至少一个外部进程被跟踪
pub async fn wait_tracked(engine: &Orchestrator) {
    for _ in 0..500 {
        if engine.supervisor().tracked_count() > 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no process tracked");
}

/// 等待传输条目的进程登记为当前进程
pub async fn wait_current_process(engine: &Orchestrator) {
    for _ in 0..500 {
        if engine.supervisor().current_pid().is_some() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no current process registered");
}
