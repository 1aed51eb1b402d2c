//! # Logger Module / 日志模块
//!
//! The logging capability handed to the runner and the coverage remapper.
//! Output goes through a `Logger` value instead of printing directly, so
//! tests can capture every message.
//!
//! 传递给运行器和覆盖率重映射器的日志能力。
//! 输出通过 `Logger` 值而不是直接打印，因此测试可以捕获每条消息。

use colored::*;
use std::sync::Mutex;

/// A sink for user-facing messages.
/// Only `log` is required; warnings and debug messages default to it.
///
/// 面向用户消息的接收器。只需实现 `log`；警告和调试消息默认转发给它。
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);

    fn warn(&self, message: &str) {
        self.log(message);
    }

    fn debug(&self, message: &str) {
        self.log(message);
    }
}

/// Writes to the terminal. Debug messages are shown only when verbose.
/// 写入终端。仅在详细模式下显示调试消息。
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, message: &str) {
        println!("{message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    fn debug(&self, message: &str) {
        if self.verbose {
            println!("{}", message.dimmed());
        }
    }
}

/// The level a message was recorded at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Log,
    Warn,
    Debug,
}

/// Keeps every message in memory.
/// 在内存中保存每条消息。
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages recorded at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(recorded, _)| *recorded == level)
            .map(|(_, message)| message)
            .collect()
    }

    fn record(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl Logger for RecordingLogger {
    fn log(&self, message: &str) {
        self.record(Level::Log, message);
    }

    fn warn(&self, message: &str) {
        self.record(Level::Warn, message);
    }

    fn debug(&self, message: &str) {
        self.record(Level::Debug, message);
    }
}
