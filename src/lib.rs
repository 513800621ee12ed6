//! 基于外部存储同步工具的传输与目录比较编排
//!
//! 所有存储操作都委托给外部命令行工具（`remote:path` 语法），
//! 本库负责启动子进程、解析列表输出、汇总传输结果和比较两棵目录树。

use std::path::PathBuf;

pub mod config;
pub mod core;
pub mod logging;
pub mod paths;
pub mod tool;

pub use crate::config::EngineConfig;
pub use crate::core::{
    CompareCriteria, ComparisonOutcome, ComparisonRequest, ComparisonResult, Criterion,
    EngineEvent, FileEntry, ListingError, Orchestrator, Report, TransferRequest, TransferResult,
};
pub use crate::logging::LogConfig;

/// 覆盖应用配置目录的环境变量
pub const CONFIG_DIR_ENV: &str = "RCSYNC_CONFIG_DIR";

/// 应用配置目录（config.json 和默认日志目录所在位置）
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    platform_config_dir()
        .map(|p| p.join("rcsync"))
        .unwrap_or_else(|| PathBuf::from(".rcsync"))
}

#[cfg(target_os = "windows")]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("APPDATA").map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_config_dir() -> Option<PathBuf> {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
}
