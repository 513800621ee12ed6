//! 日志模块 - 日志配置与 tracing 订阅器初始化

use crate::config::{read_config, write_section};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 日志文件名前缀，实际文件按日期追加后缀
pub const LOG_FILE_NAME: &str = "rcsync.log";

/// 日志配置，保存在 config.json 的 "log" 键下
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    pub enabled: bool,
    /// "error" / "warn" / "info" / "debug" / "trace"，无法识别时按 info 处理
    pub level: String,
    /// 保留最近几天的日志文件
    pub keep_days: usize,
    /// 自定义日志目录，为空时使用配置目录下的 logs
    pub log_dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            keep_days: 7,
            log_dir: None,
        }
    }
}

impl LogConfig {
    pub fn load(config_dir: &Path) -> Self {
        read_config(config_dir)
            .and_then(|config| config.get("log").cloned())
            .and_then(|log| serde_json::from_value(log).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, config_dir: &Path) -> Result<()> {
        write_section(config_dir, "log", serde_json::to_value(self)?)
    }

    pub fn tracing_level(&self) -> Level {
        self.level.trim().parse().unwrap_or(Level::INFO)
    }

    /// 日志目录：自定义目录存在时使用它，否则为 `<config_dir>/logs`
    pub fn resolve_log_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.log_dir {
            Some(dir) if dir.is_dir() => dir.clone(),
            _ => config_dir.join("logs"),
        }
    }
}

fn file_appender(config: &LogConfig, log_dir: &Path) -> Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("无法创建日志目录: {}", log_dir.display()))?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_NAME)
        .max_log_files(config.keep_days.max(1))
        .build(log_dir)
        .context("无法创建日志文件")
}

/// 安装全局 tracing 订阅器，由宿主在启动时调用一次
///
/// 返回的 guard 必须由宿主持有，drop 后缓冲的日志才会刷出。
pub fn init_logging(config: &LogConfig, config_dir: &Path) -> Option<WorkerGuard> {
    if !config.enabled {
        let _ = tracing::subscriber::set_global_default(tracing_subscriber::registry());
        return None;
    }

    let env_filter = EnvFilter::from_default_env().add_directive(config.tracing_level().into());
    let log_dir = config.resolve_log_dir(config_dir);

    let appender = match file_appender(config, &log_dir) {
        Ok(appender) => appender,
        Err(e) => {
            // 写不了文件就只输出到控制台
            let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
            tracing::warn!("文件日志不可用: {:#}", e);
            return None;
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    // debug 构建同时输出到控制台
    let console_layer =
        cfg!(debug_assertions).then(|| tracing_subscriber::fmt::layer().with_target(false));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);

    Some(guard)
}
