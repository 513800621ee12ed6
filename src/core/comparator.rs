use crate::core::model::{CompareCriteria, ComparisonResult, Criterion, FileEntry};
use crate::paths;
use std::collections::HashMap;
use tracing::debug;

/// 两侧同路径条目的比较结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRelation {
    Same,
    /// 第一个不满足的条件
    Different(Criterion),
}

/// 文件比较器
///
/// 所有条件都是原始字段的精确字符串比较，不做数值容差或时间精度归一。
pub struct FileComparator {
    criteria: CompareCriteria,
}

impl FileComparator {
    pub fn new(criteria: CompareCriteria) -> Self {
        Self { criteria }
    }

    /// 按 名称、大小、修改时间 的顺序检查启用的条件
    pub fn compare_entries(&self, left: &FileEntry, right: &FileEntry) -> FileRelation {
        if self.criteria.name && left.name != right.name {
            return FileRelation::Different(Criterion::Name);
        }

        // 目录的 size 字段没有意义，不参与比较
        if self.criteria.size && !left.is_dir && !right.is_dir && left.size != right.size {
            debug!(
                "大小不同: {} (left={}, right={})",
                left.path, left.size, right.size
            );
            return FileRelation::Different(Criterion::Size);
        }

        if self.criteria.modified && left.modified != right.modified {
            debug!(
                "时间不同: {} (left={}, right={})",
                left.path, left.modified, right.modified
            );
            return FileRelation::Different(Criterion::Modified);
        }

        FileRelation::Same
    }

    /// 比较两棵目录树
    ///
    /// 以规范化后带前导 `/` 的路径为键。".." 条目被忽略。
    /// 右侧同一键重复出现时，只有第一个参与匹配，其余归入 right_only。
    pub fn compare_trees(&self, left: &[FileEntry], right: &[FileEntry]) -> ComparisonResult {
        let mut result = ComparisonResult::default();

        let mut right_slots: Vec<Option<&FileEntry>> = Vec::with_capacity(right.len());
        let mut right_index: HashMap<String, usize> = HashMap::new();
        for entry in right.iter().filter(|e| !e.is_parent_link()) {
            let key = paths::with_leading_slash(&entry.path);
            if right_index.contains_key(&key) {
                result.right_only.push(entry.clone());
                continue;
            }
            right_index.insert(key, right_slots.len());
            right_slots.push(Some(entry));
        }

        for left_entry in left.iter().filter(|e| !e.is_parent_link()) {
            let key = paths::with_leading_slash(&left_entry.path);
            let matched = right_index
                .remove(&key)
                .and_then(|idx| right_slots[idx].take());

            match matched {
                Some(right_entry) => {
                    let pair = (left_entry.clone(), right_entry.clone());
                    match self.compare_entries(left_entry, right_entry) {
                        FileRelation::Same => result.same.push(pair),
                        FileRelation::Different(_) => result.different.push(pair),
                    }
                }
                None => result.left_only.push(left_entry.clone()),
            }
        }

        // 按右侧列表顺序输出未匹配条目
        let mut remaining: Vec<FileEntry> = right_slots.into_iter().flatten().cloned().collect();
        remaining.append(&mut result.right_only);
        result.right_only = remaining;

        result
    }
}

impl Default for FileComparator {
    fn default() -> Self {
        Self::new(CompareCriteria::all())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn file(path: &str, size: &str, modified: &str) -> FileEntry {
        FileEntry::file(path, path, size, modified, "left:")
    }

    fn dir(path: &str, modified: &str) -> FileEntry {
        FileEntry::dir(path, path, modified, "left:")
    }

    fn criteria(items: &[Criterion]) -> CompareCriteria {
        items.iter().copied().collect()
    }

    #[test]
    fn test_size_example() {
        let left = vec![file("/a.txt", "10", "t"), dir("/dir", "t")];
        let right = vec![file("/a.txt", "20", "t"), file("/b.txt", "5", "t")];

        let result = FileComparator::new(criteria(&[Criterion::Size])).compare_trees(&left, &right);

        assert_eq!(result.different.len(), 1);
        assert_eq!(result.different[0].0.path, "/a.txt");
        assert_eq!(result.different[0].1.size, "20");
        assert_eq!(result.left_only, vec![dir("/dir", "t")]);
        assert_eq!(result.right_only, vec![file("/b.txt", "5", "t")]);
        assert!(result.same.is_empty());
    }

    #[test]
    fn test_directories_ignore_size() {
        let mut left_dir = dir("/photos", "2024-01-01 00:00:00");
        left_dir.size = "-1".to_string();
        let mut right_dir = dir("/photos", "2024-01-01 00:00:00");
        right_dir.size = "4096".to_string();

        let comparator = FileComparator::default();
        assert_eq!(comparator.compare_entries(&left_dir, &right_dir), FileRelation::Same);

        // 一侧是目录时同样不比较大小
        let right_file = file("/photos", "4096", "2024-01-01 00:00:00");
        let relation = FileComparator::new(criteria(&[Criterion::Size]))
            .compare_entries(&left_dir, &right_file);
        assert_eq!(relation, FileRelation::Same);
    }

    #[test]
    fn test_exact_string_equality() {
        let comparator = FileComparator::new(criteria(&[Criterion::Modified]));
        let left = file("/a", "1", "2024-01-01 10:00:00.000000000");
        let right = file("/a", "1", "2024-01-01 10:00:00");

        assert_eq!(
            comparator.compare_entries(&left, &right),
            FileRelation::Different(Criterion::Modified)
        );
    }

    #[test]
    fn test_paths_normalized_to_leading_slash() {
        let left = vec![file("sub/a.txt", "1", "t")];
        let right = vec![file("/sub/a.txt", "1", "t")];

        let result = FileComparator::new(criteria(&[Criterion::Size])).compare_trees(&left, &right);
        assert_eq!(result.same.len(), 1);
        assert!(result.left_only.is_empty() && result.right_only.is_empty());
    }

    #[test]
    fn test_parent_links_excluded() {
        let left = vec![FileEntry::parent_link("/", "left:"), file("/a", "1", "t")];
        let right = vec![FileEntry::parent_link("/", "right:")];

        let result = FileComparator::default().compare_trees(&left, &right);
        let summary = result.summary();
        assert_eq!((summary.left_only, summary.right_only, summary.same), (1, 0, 0));
    }

    #[test]
    fn test_buckets_partition_both_sides() {
        let left = vec![
            file("/a", "1", "t1"),
            file("/b", "2", "t1"),
            dir("/d", "t1"),
            file("/only-left", "3", "t1"),
        ];
        let right = vec![
            file("/a", "1", "t1"),
            file("/b", "9", "t1"),
            dir("/d", "t2"),
            file("/only-right", "3", "t1"),
            file("/only-right-2", "3", "t1"),
        ];

        let result = FileComparator::default().compare_trees(&left, &right);

        assert_eq!(
            result.left_only.len() + result.different.len() + result.same.len(),
            left.len()
        );
        assert_eq!(
            result.right_only.len() + result.different.len() + result.same.len(),
            right.len()
        );

        let mut seen = HashSet::new();
        let all_paths = result
            .left_only
            .iter()
            .chain(result.right_only.iter())
            .map(|e| e.path.clone())
            .chain(result.different.iter().map(|(l, _)| l.path.clone()))
            .chain(result.same.iter().map(|(l, _)| l.path.clone()));
        for path in all_paths {
            assert!(seen.insert(path), "path classified twice");
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn test_comparison_is_idempotent() {
        let left = vec![file("/a", "1", "t"), file("/b", "2", "t")];
        let right = vec![file("/b", "3", "t"), file("/c", "1", "t")];
        let comparator = FileComparator::default();

        assert_eq!(
            comparator.compare_trees(&left, &right),
            comparator.compare_trees(&left, &right)
        );
    }

    #[test]
    fn test_duplicate_right_paths_stay_counted() {
        let left = vec![file("/a", "1", "t")];
        let right = vec![file("/a", "1", "t"), file("a", "1", "t")];

        let result = FileComparator::default().compare_trees(&left, &right);
        assert_eq!(result.same.len(), 1);
        assert_eq!(result.right_only.len(), 1);
    }
}
