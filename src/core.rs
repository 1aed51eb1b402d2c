//! # Core Module / 核心模块
//!
//! This module contains the core functionality of intern-test: the run
//! configuration, runner argument assembly, process execution and the
//! coverage remapping pipeline.
//!
//! 此模块包含 intern-test 的核心功能：运行配置、运行器参数组装、
//! 进程执行以及覆盖率重映射流程。

pub mod arguments;
pub mod config;
pub mod coverage;
pub mod execution;
pub mod externals;
pub mod models;
pub mod remap;
pub mod reporters;
pub mod source_maps;

// Re-exports
pub use config::{RunContext, TestRunConfiguration};
pub use execution::TestRunner;
pub use models::{RemapError, ReportKind, ReportWritten, RunError};
