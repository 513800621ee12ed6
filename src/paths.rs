//! 远程路径工具
//!
//! 远程路径统一使用正斜杠，`remote:path` 中的 `path` 部分都经过这里规范化。

/// 规范化路径：反斜杠转为正斜杠，折叠重复分隔符和 `.` 段
///
/// 不解析 `..`，也不改变路径是否以 `/` 开头。空路径返回 `.`。
pub fn normalize(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();

    match (absolute, segments.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", segments.join("/")),
        (false, true) => ".".to_string(),
        (false, false) => segments.join("/"),
    }
}

/// 拼接两段路径后规范化，`name` 为绝对路径时直接替换 `base`
pub fn join(base: &str, name: &str) -> String {
    let name = name.replace('\\', "/");
    if name.starts_with('/') || base.is_empty() {
        return normalize(&name);
    }
    normalize(&format!("{}/{}", base, name))
}

/// 父目录（规范化后），没有父目录的相对路径返回 `.`
pub fn parent(path: &str) -> String {
    let normalized = normalize(path);
    if normalized == "/" || normalized == "." {
        return normalized;
    }
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// 规范化为以 `/` 开头的形式，用作比较时的键
pub fn with_leading_slash(path: &str) -> String {
    let unified = path.replace('\\', "/");
    if unified.starts_with('/') {
        normalize(&unified)
    } else {
        normalize(&format!("/{}", unified))
    }
}

/// 是否为远程根目录
pub fn is_root(path: &str) -> bool {
    normalize(path) == "/"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a//b/./c/"), "/a/b/c");
        assert_eq!(normalize("a\\b\\c.txt"), "a/b/c.txt");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), ".");
        assert_eq!(normalize("./x"), "x");
        // .. 保持原样
        assert_eq!(normalize("/a/../b"), "/a/../b");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/docs", "a.txt"), "/docs/a.txt");
        assert_eq!(join("/", "a.txt"), "/a.txt");
        assert_eq!(join("/docs/", "my file.txt"), "/docs/my file.txt");
        assert_eq!(join("/docs", "/abs.txt"), "/abs.txt");
        assert_eq!(join("", "a.txt"), "a.txt");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/a/b"), "/a");
        assert_eq!(parent("/a"), "/");
        assert_eq!(parent("/a/b/"), "/a");
        assert_eq!(parent("a"), ".");
        assert_eq!(parent("/"), "/");
    }

    #[test]
    fn test_with_leading_slash() {
        assert_eq!(with_leading_slash("dir/a.txt"), "/dir/a.txt");
        assert_eq!(with_leading_slash("/dir/a.txt"), "/dir/a.txt");
        assert_eq!(with_leading_slash("dir\\sub"), "/dir/sub");
        assert!(is_root("//"));
    }
}
