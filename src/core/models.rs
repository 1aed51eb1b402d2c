//! # Data Models Module / 数据模型模块
//!
//! This module defines the outcome and error types shared by the argument
//! builder, the process runner and the coverage remapper.
//!
//! 此模块定义了参数构建器、进程运行器和覆盖率重映射器共享的结果与错误类型。

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The exit code every failure is normalized to.
/// 所有失败都被规范化为的退出码。
pub const FAILURE_EXIT_CODE: i32 = 1;

/// Enumerates the ways a test run can fail.
/// Each variant maps to one stage of the run so callers can tell
/// configuration problems apart from failing tests.
///
/// 枚举测试运行可能失败的方式。
/// 每个变体对应运行的一个阶段，调用者可以区分配置问题与测试失败。
#[derive(Debug, Error)]
pub enum RunError {
    /// An invalid combination of options, detected before anything is spawned.
    /// 在派生任何进程之前检测到的无效选项组合。
    #[error("{0}")]
    Configuration(String),

    /// A required external tool (the Java VM) is not available.
    /// 所需的外部工具（Java 虚拟机）不可用。
    #[error("{0}")]
    Precondition(String),

    /// The runner executable could not be launched.
    /// 无法启动运行器可执行文件。
    #[error("{message}")]
    Spawn { message: String },

    /// The runner exited with a non-zero status.
    /// 运行器以非零状态退出。
    #[error("{message}")]
    Failure { message: String, exit_code: i32 },

    /// Coverage post-processing failed after a successful test run.
    /// 测试成功运行后，覆盖率后处理失败。
    #[error(transparent)]
    Remap(#[from] RemapError),

    /// The test run failed and the coverage post-processing failed as well.
    /// The run failure is the primary cause.
    ///
    /// 测试运行失败，覆盖率后处理也失败了。运行失败是主要原因。
    #[error("{cause} (coverage remapping also failed: {remap})")]
    RemapAfterFailure {
        cause: Box<RunError>,
        remap: RemapError,
    },
}

impl RunError {
    /// The process exit code the calling program should propagate.
    /// 调用程序应当传递的进程退出码。
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Failure { exit_code, .. } => *exit_code,
            RunError::RemapAfterFailure { cause, .. } => cause.exit_code(),
            _ => FAILURE_EXIT_CODE,
        }
    }

    /// Attaches a coverage failure to an earlier run failure, keeping the run
    /// failure as the primary cause.
    ///
    /// 将覆盖率失败附加到先前的运行失败上，并保留运行失败作为主要原因。
    pub fn with_remap_failure(self, remap: RemapError) -> Self {
        RunError::RemapAfterFailure {
            cause: Box::new(self),
            remap,
        }
    }

    /// The primary cause of the failure, skipping any attached remap failure.
    pub fn primary(&self) -> &RunError {
        match self {
            RunError::RemapAfterFailure { cause, .. } => cause.primary(),
            other => other,
        }
    }
}

/// Errors raised while remapping coverage and writing reports.
/// 在重映射覆盖率和写入报告时产生的错误。
#[derive(Debug, Error)]
pub enum RemapError {
    #[error("failed to read coverage file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse coverage file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to remove coverage file {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {kind} report to {path}: {source}")]
    Write {
        kind: ReportKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {kind} report: {source}")]
    Serialize {
        kind: ReportKind,
        #[source]
        source: serde_json::Error,
    },
}

/// The coverage report formats the remapper can produce.
/// 重映射器可以生成的覆盖率报告格式。
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ReportKind {
    /// Plain-text summary printed to the console / 打印到控制台的纯文本摘要
    Text,
    /// HTML report tree / HTML 报告目录
    Html,
    /// Remapped istanbul JSON / 重映射后的 istanbul JSON
    Json,
    /// LCOV tracefile / LCOV 跟踪文件
    Lcov,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportKind::Text => "text",
            ReportKind::Html => "html",
            ReportKind::Json => "json",
            ReportKind::Lcov => "lcov",
        };
        f.write_str(name)
    }
}

/// The result of one report write.
/// `destination` is `None` for reports printed to the console.
///
/// 单次报告写入的结果。对于打印到控制台的报告，`destination` 为 `None`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWritten {
    pub kind: ReportKind,
    pub destination: Option<PathBuf>,
}

impl ReportWritten {
    pub fn console(kind: ReportKind) -> Self {
        Self {
            kind,
            destination: None,
        }
    }

    pub fn file(kind: ReportKind, destination: PathBuf) -> Self {
        Self {
            kind,
            destination: Some(destination),
        }
    }
}
