//! 引擎配置模块

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// 外部工具可执行文件，查找位置由宿主决定
    #[serde(default = "default_tool_path")]
    pub tool_path: PathBuf,
    /// 每次调用前置的全局参数，例如 `--config <file>`
    #[serde(default)]
    pub tool_args: Vec<String>,
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,
    #[serde(default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,
    #[serde(default = "default_version_timeout")]
    pub version_timeout_secs: u64,
    #[serde(default = "default_remotes_timeout")]
    pub remotes_timeout_secs: u64,
    /// 工具内部并行传输数
    #[serde(default = "default_transfers")]
    pub transfers: u32,
    /// 关闭时等待进程退出的宽限期（毫秒）
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_ms: u64,
}

fn default_tool_path() -> PathBuf {
    PathBuf::from("rclone")
}

fn default_listing_timeout() -> u64 {
    300 // 5 分钟
}

fn default_transfer_timeout() -> u64 {
    600 // 10 分钟
}

fn default_version_timeout() -> u64 {
    10
}

fn default_remotes_timeout() -> u64 {
    30
}

fn default_transfers() -> u32 {
    crate::tool::DEFAULT_TRANSFERS
}

fn default_shutdown_grace() -> u64 {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tool_path: default_tool_path(),
            tool_args: Vec::new(),
            listing_timeout_secs: default_listing_timeout(),
            transfer_timeout_secs: default_transfer_timeout(),
            version_timeout_secs: default_version_timeout(),
            remotes_timeout_secs: default_remotes_timeout(),
            transfers: default_transfers(),
            shutdown_grace_ms: default_shutdown_grace(),
        }
    }
}

impl EngineConfig {
    /// 使用指定工具路径，其余为默认值
    pub fn with_tool(tool_path: impl Into<PathBuf>) -> Self {
        Self {
            tool_path: tool_path.into(),
            ..Default::default()
        }
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn version_timeout(&self) -> Duration {
        Duration::from_secs(self.version_timeout_secs)
    }

    pub fn remotes_timeout(&self) -> Duration {
        Duration::from_secs(self.remotes_timeout_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// 从配置文件加载，文件缺失或格式错误时使用默认值
    pub fn load(config_dir: &Path) -> Self {
        read_config(config_dir)
            .and_then(|config| config.get("engine").cloned())
            .and_then(|engine| serde_json::from_value::<EngineConfig>(engine).ok())
            .unwrap_or_default()
    }

    /// 保存到配置文件，保留其他配置项
    pub fn save(&self, config_dir: &Path) -> Result<()> {
        write_section(config_dir, "engine", serde_json::to_value(self)?)
    }
}

/// 配置文件路径
pub fn config_file(config_dir: &Path) -> PathBuf {
    config_dir.join("config.json")
}

pub(crate) fn read_config(config_dir: &Path) -> Option<serde_json::Value> {
    let content = fs::read_to_string(config_file(config_dir)).ok()?;
    serde_json::from_str::<serde_json::Value>(&content).ok()
}

/// 写入 config.json 中的一个顶层键
pub(crate) fn write_section(config_dir: &Path, key: &str, value: serde_json::Value) -> Result<()> {
    fs::create_dir_all(config_dir)?;

    let mut config = read_config(config_dir)
        .filter(|c| c.is_object())
        .unwrap_or_else(|| serde_json::json!({}));
    config[key] = value;

    fs::write(config_file(config_dir), serde_json::to_string_pretty(&config)?)?;
    Ok(())
}
