use crate::config::EngineConfig;
use crate::core::comparator::FileComparator;
use crate::core::error::ListingError;
use crate::core::events::{ComparisonOutcome, EngineEvent, Notifier};
use crate::core::lister::RemoteLister;
use crate::core::model::{CompareCriteria, FileEntry, Report};
use crate::core::supervisor::{OperationState, OperationStatus, ProcessSupervisor};
use crate::core::transfer::{TransferExecutor, TransferRequest};
use crate::tool::{ToolCommand, ToolRunner};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{error, warn};

/// 一次目录比较请求
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRequest {
    pub left_remote: String,
    pub left_path: String,
    pub right_remote: String,
    pub right_path: String,
    pub criteria: CompareCriteria,
}

/// 传输/比较编排引擎
///
/// 同一时间最多运行一个传输或比较；列表查询不受此限制。
/// 启动操作的方法需要在 tokio 运行时内调用。
#[derive(Clone)]
pub struct Orchestrator {
    config: Arc<EngineConfig>,
    state: Arc<OperationState>,
    supervisor: Arc<ProcessSupervisor>,
    runner: ToolRunner,
    lister: RemoteLister,
    executor: Arc<TransferExecutor>,
    notifier: Notifier,
    last_report: Arc<Mutex<Option<Report>>>,
}

impl Orchestrator {
    /// 创建引擎，返回事件接收端，由宿主前台读取
    pub fn new(config: EngineConfig) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let state = Arc::new(OperationState::new());
        let supervisor = Arc::new(ProcessSupervisor::new(
            state.clone(),
            config.shutdown_grace(),
        ));
        let runner = ToolRunner::new(
            config.tool_path.clone(),
            config.tool_args.clone(),
            supervisor.clone(),
        );
        let lister = RemoteLister::new(runner.clone(), config.listing_timeout());
        let executor = TransferExecutor::new(
            runner.clone(),
            config.transfer_timeout(),
            config.transfers,
        );

        let engine = Self {
            config: Arc::new(config),
            state,
            supervisor,
            runner,
            lister,
            executor: Arc::new(executor),
            notifier: Notifier::new(tx),
            last_report: Arc::new(Mutex::new(None)),
        };
        (engine, rx)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn supervisor(&self) -> &ProcessSupervisor {
        &self.supervisor
    }

    /// 引擎使用的工具调用器，宿主可用它运行同步、删除等命令，进程同样受监管
    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }

    pub fn status(&self) -> OperationStatus {
        self.state.status()
    }

    /// 是否有传输或比较在运行（包括取消中）
    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    /// 最近一次完成的传输或比较结果
    pub fn last_report(&self) -> Option<Report> {
        self.last_report
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store_report(&self, report: Report) {
        *self.last_report.lock().unwrap_or_else(PoisonError::into_inner) = Some(report);
    }

    /// 检查外部工具是否可用，返回版本信息的第一行
    pub async fn check_tool(&self) -> Result<String> {
        let tool = self.config.tool_path.display().to_string();
        let output = self
            .runner
            .run(&ToolCommand::Version, self.config.version_timeout())
            .await
            .with_context(|| format!("外部工具不可用: {}", tool))?;

        let version = output.stdout.trim().lines().next().unwrap_or_default();
        if !output.success() || version.is_empty() {
            bail!("外部工具不可用: {} ({})", tool, output.diagnostic());
        }
        Ok(version.to_string())
    }

    /// 列出已配置的远程，每项带结尾的 `:`
    pub async fn list_remotes(&self) -> Result<Vec<String>> {
        let output = self
            .runner
            .run(&ToolCommand::ListRemotes, self.config.remotes_timeout())
            .await
            .context("读取远程列表失败")?;

        if !output.success() {
            bail!("读取远程列表失败: {}", output.diagnostic());
        }
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// 列出目录，供两个面板刷新使用，可与其他调用并发
    pub async fn list_directory(
        &self,
        remote: &str,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<FileEntry>, ListingError> {
        self.lister.list_directory(remote, path, recursive).await
    }

    /// 在后台开始传输
    ///
    /// 已有操作在运行时返回 false，不启动任何进程。
    /// 完成（包括被取消）时发送一次 `EngineEvent::TransferFinished`。
    pub fn start_transfer(&self, request: TransferRequest) -> bool {
        if !self.state.try_begin() {
            warn!("已有操作在运行，拒绝传输请求");
            return false;
        }

        let this = self.clone();
        tokio::spawn(async move {
            let state = this.state.clone();
            let supervisor = this.supervisor.clone();
            scopeguard::defer! {
                supervisor.clear_current();
                state.finish();
            }

            let result = this
                .executor
                .execute(&request, &this.state, &this.notifier)
                .await;
            this.store_report(Report::Transfer(result.clone()));
            this.notifier.send(EngineEvent::TransferFinished {
                result,
                dry_run: request.dry_run,
            });
        });
        true
    }

    /// 在后台开始目录比较
    ///
    /// 与传输共用单飞限制。完成时发送一次 `EngineEvent::ComparisonFinished`。
    pub fn start_comparison(&self, request: ComparisonRequest) -> bool {
        if !self.state.try_begin() {
            warn!("已有操作在运行，拒绝比较请求");
            return false;
        }

        let this = self.clone();
        tokio::spawn(async move {
            let state = this.state.clone();
            scopeguard::defer! {
                state.finish();
            }

            let outcome = this.run_comparison(&request).await;
            if let ComparisonOutcome::Completed(result) = &outcome {
                this.store_report(Report::Comparison(result.clone()));
            }
            this.notifier.send(EngineEvent::ComparisonFinished(outcome));
        });
        true
    }

    async fn run_comparison(&self, request: &ComparisonRequest) -> ComparisonOutcome {
        self.notifier.log("目录比较开始");
        self.notifier
            .log(format!("左侧: {}{}", request.left_remote, request.left_path));
        self.notifier
            .log(format!("右侧: {}{}", request.right_remote, request.right_path));

        let fetched = tokio::try_join!(
            self.lister
                .list_directory(&request.left_remote, &request.left_path, true),
            self.lister
                .list_directory(&request.right_remote, &request.right_path, true),
        );
        let (left, right) = match fetched {
            Ok(listings) => listings,
            Err(e) => {
                error!("目录比较失败: {}", e);
                return ComparisonOutcome::Failed(e);
            }
        };

        let left: Vec<FileEntry> = left.into_iter().filter(|e| !e.is_parent_link()).collect();
        let right: Vec<FileEntry> = right.into_iter().filter(|e| !e.is_parent_link()).collect();
        self.notifier.log(format!(
            "左侧 {} 个条目, 右侧 {} 个条目",
            left.len(),
            right.len()
        ));

        if !self.state.should_continue() {
            self.notifier.log("目录比较已取消");
            return ComparisonOutcome::Cancelled;
        }

        let result = FileComparator::new(request.criteria).compare_trees(&left, &right);
        let summary = result.summary();
        self.notifier.log(format!(
            "比较结果: 仅左侧 {}, 仅右侧 {}, 不同 {}, 相同 {}",
            summary.left_only, summary.right_only, summary.different, summary.same
        ));
        ComparisonOutcome::Completed(result)
    }

    /// 请求取消当前操作（协作式）
    pub fn cancel(&self) {
        let was_busy = self.state.is_busy();
        self.supervisor.cancel();
        if was_busy {
            self.notifier.log("已请求停止当前操作");
        }
    }

    /// 应用关闭时调用：取消当前操作并终止所有外部进程
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }
}
