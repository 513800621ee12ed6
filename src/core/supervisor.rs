//! 子进程跟踪与协作式取消

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const IDLE: u8 = 0;
const RUNNING: u8 = 1;
const CANCELLING: u8 = 2;

/// 操作状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Idle,
    Running,
    Cancelling,
}

/// 单飞标志：同一时间最多一个传输或比较在运行
#[derive(Debug, Default)]
pub struct OperationState {
    state: AtomicU8,
}

impl OperationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Running，已有操作在运行时返回 false
    pub fn try_begin(&self) -> bool {
        self.state
            .compare_exchange(IDLE, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Running -> Cancelling，空闲时无效果
    pub fn request_cancel(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, CANCELLING, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// 释放标志
    pub fn finish(&self) {
        self.state.store(IDLE, Ordering::SeqCst);
    }

    /// 工作循环在每个检查点调用
    pub fn should_continue(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    pub fn is_busy(&self) -> bool {
        self.state.load(Ordering::SeqCst) != IDLE
    }

    pub fn status(&self) -> OperationStatus {
        match self.state.load(Ordering::SeqCst) {
            RUNNING => OperationStatus::Running,
            CANCELLING => OperationStatus::Cancelling,
            _ => OperationStatus::Idle,
        }
    }
}

struct TrackedProcess {
    pid: Option<u32>,
    label: String,
    terminate: CancellationToken,
}

#[derive(Default)]
struct Registry {
    processes: HashMap<u64, TrackedProcess>,
    current: Option<u64>,
}

/// 跟踪所有已启动的外部工具进程
pub struct ProcessSupervisor {
    state: Arc<OperationState>,
    next_id: AtomicU64,
    registry: Mutex<Registry>,
    grace: Duration,
}

impl ProcessSupervisor {
    pub fn new(state: Arc<OperationState>, grace: Duration) -> Self {
        Self {
            state,
            next_id: AtomicU64::new(1),
            registry: Mutex::new(Registry::default()),
            grace,
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 登记一个刚启动的进程，必须在等待它之前调用
    ///
    /// 返回的句柄在 drop 时注销进程，无论进程以何种方式结束。
    pub fn register(self: &Arc<Self>, pid: Option<u32>, label: &str, current: bool) -> ProcessHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let terminate = CancellationToken::new();

        let mut registry = self.registry();
        registry.processes.insert(
            id,
            TrackedProcess {
                pid,
                label: label.to_string(),
                terminate: terminate.clone(),
            },
        );
        if current {
            registry.current = Some(id);
            // 登记前已收到取消请求
            if !self.state.should_continue() {
                terminate.cancel();
            }
        }
        debug!("登记进程 #{} pid={:?}: {}", id, pid, label);

        ProcessHandle {
            id,
            terminate,
            supervisor: Arc::clone(self),
        }
    }

    fn deregister(&self, id: u64) {
        let mut registry = self.registry();
        registry.processes.remove(&id);
        if registry.current == Some(id) {
            registry.current = None;
        }
        debug!("注销进程 #{}", id);
    }

    /// 当前正在处理的传输条目的进程
    pub fn current_pid(&self) -> Option<u32> {
        let registry = self.registry();
        registry
            .current
            .and_then(|id| registry.processes.get(&id))
            .and_then(|p| p.pid)
    }

    pub fn clear_current(&self) {
        self.registry().current = None;
    }

    pub fn tracked_count(&self) -> usize {
        self.registry().processes.len()
    }

    /// 清除运行标志，并请求终止当前进程（尽力而为）
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            info!("已请求取消当前操作");
        }

        let registry = self.registry();
        if let Some(process) = registry.current.and_then(|id| registry.processes.get(&id)) {
            info!("终止当前进程: {}", process.label);
            process.terminate.cancel();
        }
    }

    /// 取消当前操作，终止所有仍在运行的进程并清空跟踪集合
    pub async fn shutdown(&self) {
        self.cancel();

        {
            let registry = self.registry();
            for process in registry.processes.values() {
                process.terminate.cancel();
            }
        }

        // 等待各进程的持有者注销它们
        let deadline = Instant::now() + self.grace;
        while self.tracked_count() > 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        let mut registry = self.registry();
        for (id, process) in registry.processes.drain() {
            warn!(
                "进程 #{} 在 {:?} 内未退出，放弃跟踪: {} (pid={:?})",
                id, self.grace, process.label, process.pid
            );
        }
        registry.current = None;
    }
}

/// 已登记进程的句柄
pub struct ProcessHandle {
    id: u64,
    terminate: CancellationToken,
    supervisor: Arc<ProcessSupervisor>,
}

impl ProcessHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 收到终止请求时完成
    pub async fn terminated(&self) {
        self.terminate.cancelled().await
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        self.supervisor.deregister(self.id);
    }
}
