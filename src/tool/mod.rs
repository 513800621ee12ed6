//! 外部存储同步工具的命令模型
//!
//! 引擎自身只用到版本、列表和复制命令；`Sync`、`Delete`、`Purge` 供宿主通过
//! `Orchestrator::runner()` 直接调用。

pub mod runner;

pub use runner::ToolRunner;

/// 工具内部并行传输数
pub const DEFAULT_TRANSFERS: u32 = 3;

/// 诊断信息最多保留的字符数
pub const DIAGNOSTIC_LIMIT: usize = 200;

/// 复制/同步选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    pub dry_run: bool,
    /// 跳过目标端已存在的对象
    pub skip_existing: bool,
    /// 单次调用内遇到对象错误时继续
    pub ignore_errors: bool,
    pub transfers: u32,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            skip_existing: true,
            ignore_errors: true,
            transfers: DEFAULT_TRANSFERS,
        }
    }
}

/// 一次工具调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCommand {
    Version,
    ListRemotes,
    /// 列目录，target 为 `remote:path`
    ListDirs { target: String, recursive: bool },
    /// 列文件，第一列为字节数
    ListFiles { target: String, recursive: bool },
    CopyFile {
        source: String,
        dest: String,
        options: CopyOptions,
    },
    CopyDir {
        source: String,
        dest: String,
        options: CopyOptions,
    },
    Sync {
        source: String,
        dest: String,
        options: CopyOptions,
    },
    Delete { target: String, transfers: u32 },
    /// 递归删除目录
    Purge { target: String, transfers: u32 },
}

impl ToolCommand {
    /// 目录用递归复制，文件用单对象复制
    pub fn copy(source: String, dest: String, is_dir: bool, options: CopyOptions) -> Self {
        if is_dir {
            ToolCommand::CopyDir {
                source,
                dest,
                options,
            }
        } else {
            ToolCommand::CopyFile {
                source,
                dest,
                options,
            }
        }
    }

    pub fn delete(target: String, is_dir: bool, transfers: u32) -> Self {
        if is_dir {
            ToolCommand::Purge { target, transfers }
        } else {
            ToolCommand::Delete { target, transfers }
        }
    }

    fn subcommand(&self) -> &'static str {
        match self {
            ToolCommand::Version => "version",
            ToolCommand::ListRemotes => "listremotes",
            ToolCommand::ListDirs { .. } => "lsd",
            ToolCommand::ListFiles { .. } => "lsl",
            ToolCommand::CopyFile { .. } => "copyfile",
            ToolCommand::CopyDir { .. } => "copy",
            ToolCommand::Sync { .. } => "sync",
            ToolCommand::Delete { .. } => "delete",
            ToolCommand::Purge { .. } => "purge",
        }
    }

    /// 命令行参数（不含可执行文件本身）
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.subcommand().to_string()];

        match self {
            ToolCommand::Version | ToolCommand::ListRemotes => {}
            ToolCommand::ListDirs { target, recursive }
            | ToolCommand::ListFiles { target, recursive } => {
                args.push(target.clone());
                if *recursive {
                    args.push("-R".to_string());
                } else {
                    args.extend(["--max-depth".to_string(), "1".to_string()]);
                }
            }
            ToolCommand::CopyFile {
                source,
                dest,
                options,
            }
            | ToolCommand::CopyDir {
                source,
                dest,
                options,
            }
            | ToolCommand::Sync {
                source,
                dest,
                options,
            } => {
                args.push(source.clone());
                args.push(dest.clone());
                if matches!(self, ToolCommand::CopyDir { .. }) {
                    args.push("--create-empty-src-dirs".to_string());
                }
                push_progress_args(&mut args, options.transfers);
                if options.skip_existing {
                    args.push("--ignore-existing".to_string());
                }
                if options.ignore_errors {
                    args.push("--ignore-errors".to_string());
                }
                if options.dry_run {
                    args.push("--dry-run".to_string());
                }
            }
            ToolCommand::Delete { target, transfers } | ToolCommand::Purge { target, transfers } => {
                args.push(target.clone());
                push_progress_args(&mut args, *transfers);
            }
        }

        args
    }

    /// 日志里使用的简短描述
    pub fn label(&self) -> String {
        self.args()
            .into_iter()
            .take_while(|a| !a.starts_with("--"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn push_progress_args(args: &mut Vec<String>, transfers: u32) {
    args.push("--progress".to_string());
    args.push("--verbose".to_string());
    args.push("--transfers".to_string());
    args.push(transfers.to_string());
}

/// 一次调用的输出，stdout/stderr 已宽松解码
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn from_output(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// 失败时的诊断信息：优先 stderr，其次 stdout，截断到 200 个字符
    pub fn diagnostic(&self) -> String {
        let text = [self.stderr.trim(), self.stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty());

        match text {
            Some(text) => truncate_chars(text, DIAGNOSTIC_LIMIT),
            None => match self.code {
                Some(code) => format!("unknown error (exit code {})", code),
                None => "unknown error (killed by signal)".to_string(),
            },
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
