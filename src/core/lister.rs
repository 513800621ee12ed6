use crate::core::error::ListingError;
use crate::core::model::FileEntry;
use crate::paths;
use crate::tool::{ToolCommand, ToolRunner};
use std::time::Duration;
use tracing::{debug, info};

/// 默认单次列表调用的时间预算
pub const LISTING_TIMEOUT: Duration = Duration::from_secs(300);

/// 列表调用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// 第一列为占位值
    Dirs,
    /// 第一列为字节数
    Files,
}

/// 解析后的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingLine {
    pub size: String,
    pub modified: String,
    pub name: String,
}

/// 解析一行列表输出，字段不足 5 个的行返回 None
///
/// 第 2、3 列组成日期时间，第 5 列起用单个空格重新拼接为名称。
pub fn parse_line(line: &str, kind: ListingKind) -> Option<ListingLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    Some(ListingLine {
        size: match kind {
            ListingKind::Files => parts[0].to_string(),
            ListingKind::Dirs => String::new(),
        },
        modified: format!("{} {}", parts[1], parts[2]),
        name: parts[4..].join(" "),
    })
}

/// 解析整段输出
pub fn parse_listing(output: &str, kind: ListingKind) -> Vec<ListingLine> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .filter_map(|l| parse_line(l, kind))
        .collect()
}

/// 通过外部工具列出远程目录
#[derive(Clone)]
pub struct RemoteLister {
    runner: ToolRunner,
    budget: Duration,
}

impl RemoteLister {
    pub fn new(runner: ToolRunner, budget: Duration) -> Self {
        Self { runner, budget }
    }

    /// 列出 `remote` 下 `path` 的目录和文件
    ///
    /// 非递归且不在根目录时，结果以 ".." 条目开头。递归时条目路径沿用工具输出的相对路径。
    pub async fn list_directory(
        &self,
        remote: &str,
        path: &str,
        recursive: bool,
    ) -> Result<Vec<FileEntry>, ListingError> {
        let target = format!("{}{}", remote, path);
        info!("列出目录: {} (recursive={})", target, recursive);

        let mut entries = Vec::new();
        if !recursive && !paths::is_root(path) {
            let parent = match paths::parent(path) {
                p if p == "." => "/".to_string(),
                p => p,
            };
            entries.push(FileEntry::parent_link(&parent, remote));
        }

        let dirs = self
            .fetch(
                ToolCommand::ListDirs {
                    target: target.clone(),
                    recursive,
                },
                ListingKind::Dirs,
            )
            .await?;
        for line in dirs {
            let entry_path = entry_path(path, &line.name, recursive);
            entries.push(FileEntry::dir(&line.name, &entry_path, &line.modified, remote));
        }

        let files = self
            .fetch(
                ToolCommand::ListFiles {
                    target: target.clone(),
                    recursive,
                },
                ListingKind::Files,
            )
            .await?;
        for line in files {
            let entry_path = entry_path(path, &line.name, recursive);
            entries.push(FileEntry::file(
                &line.name,
                &entry_path,
                &line.size,
                &line.modified,
                remote,
            ));
        }

        debug!("{}: {} 个条目", target, entries.len());
        Ok(entries)
    }

    async fn fetch(
        &self,
        command: ToolCommand,
        kind: ListingKind,
    ) -> Result<Vec<ListingLine>, ListingError> {
        let output = self.runner.run(&command, self.budget).await?;
        if !output.success() {
            return Err(ListingError::ToolFailure(output.diagnostic()));
        }
        Ok(parse_listing(&output.stdout, kind))
    }
}

fn entry_path(dir: &str, name: &str, recursive: bool) -> String {
    if recursive {
        name.to_string()
    } else {
        paths::join(dir, name)
    }
}
