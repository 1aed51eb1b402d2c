//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for intern-test,
//! including process spawning, file system helpers, logging and i18n support.
//!
//! 此模块为 intern-test 提供基础设施服务，
//! 包括进程派生、文件系统辅助、日志和国际化支持。

pub mod command;
pub mod fs;
pub mod logger;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
