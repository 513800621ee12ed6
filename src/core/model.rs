use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// 父目录占位条目的名称
pub const PARENT_LINK: &str = "..";

/// 列表中的一个对象（文件或目录）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// 显示名称；递归列表时为相对路径
    pub name: String,
    /// 相对远程根的路径
    pub path: String,
    pub is_dir: bool,
    /// 工具输出的原始字节数，目录为空
    pub size: String,
    /// 工具输出的原始日期时间，只做相等比较
    pub modified: String,
    pub remote: String,
}

impl FileEntry {
    pub fn file(name: &str, path: &str, size: &str, modified: &str, remote: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            is_dir: false,
            size: size.to_string(),
            modified: modified.to_string(),
            remote: remote.to_string(),
        }
    }

    pub fn dir(name: &str, path: &str, modified: &str, remote: &str) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            is_dir: true,
            size: String::new(),
            modified: modified.to_string(),
            remote: remote.to_string(),
        }
    }

    /// 非递归列表前插入的 ".." 条目
    pub fn parent_link(parent_path: &str, remote: &str) -> Self {
        Self::dir(PARENT_LINK, parent_path, "", remote)
    }

    /// 是否为 ".." 占位条目，选择/传输/比较时都要排除
    pub fn is_parent_link(&self) -> bool {
        self.name == PARENT_LINK
    }
}

/// 一次传输的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    /// 失败条目 -> 诊断信息
    pub error_detail: HashMap<String, Vec<String>>,
    /// 被取消时还有条目未处理
    pub cancelled: bool,
    pub started_at: i64,
    pub finished_at: i64,
}

impl TransferResult {
    pub(crate) fn record_success(&mut self, name: &str) {
        self.succeeded.push(name.to_string());
    }

    pub(crate) fn record_failure(&mut self, name: &str, detail: String) {
        self.failed.push(name.to_string());
        self.error_detail
            .entry(name.to_string())
            .or_default()
            .push(detail);
    }

    /// 已处理的条目数
    pub fn processed(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }
}

/// 一次目录比较的结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub left_only: Vec<FileEntry>,
    pub right_only: Vec<FileEntry>,
    pub different: Vec<(FileEntry, FileEntry)>,
    pub same: Vec<(FileEntry, FileEntry)>,
}

impl ComparisonResult {
    pub fn summary(&self) -> ComparisonSummary {
        ComparisonSummary {
            left_only: self.left_only.len(),
            right_only: self.right_only.len(),
            different: self.different.len(),
            same: self.same.len(),
        }
    }
}

/// 比较结果计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub left_only: usize,
    pub right_only: usize,
    pub different: usize,
    pub same: usize,
}

/// 单个比较条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
    Name,
    Size,
    Modified,
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(Criterion::Name),
            "size" => Ok(Criterion::Size),
            "modified" | "modifiedat" | "mtime" => Ok(Criterion::Modified),
            other => Err(format!("unknown comparison criterion: {}", other)),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criterion::Name => write!(f, "name"),
            Criterion::Size => write!(f, "size"),
            Criterion::Modified => write!(f, "modified"),
        }
    }
}

/// 启用的比较条件集合
///
/// 调用方保证至少启用一项，这里不再校验。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareCriteria {
    pub name: bool,
    pub size: bool,
    pub modified: bool,
}

impl CompareCriteria {
    pub fn all() -> Self {
        Self {
            name: true,
            size: true,
            modified: true,
        }
    }

    pub fn contains(&self, criterion: Criterion) -> bool {
        match criterion {
            Criterion::Name => self.name,
            Criterion::Size => self.size,
            Criterion::Modified => self.modified,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.name || self.size || self.modified)
    }
}

impl FromIterator<Criterion> for CompareCriteria {
    fn from_iter<I: IntoIterator<Item = Criterion>>(iter: I) -> Self {
        let mut criteria = Self::default();
        for criterion in iter {
            match criterion {
                Criterion::Name => criteria.name = true,
                Criterion::Size => criteria.size = true,
                Criterion::Modified => criteria.modified = true,
            }
        }
        criteria
    }
}

/// 最近一次操作的结果，供之后查看
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum Report {
    Transfer(TransferResult),
    Comparison(ComparisonResult),
}
