//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command for the intern-test CLI,
//! which merges the project file with the command-line flags and runs the
//! selected suites.
//!
//! 此模块实现了 intern-test CLI 的 `run` 命令，
//! 它将项目文件与命令行标志合并，并运行所选的测试套件。

use anyhow::{Context, Result};
use colored::*;
use std::{fs, path::PathBuf, sync::Arc};

use crate::{
    core::{
        config::{RunContext, RunMode, TestRunConfiguration, load_project_config},
        execution::TestRunner,
    },
    infra::{
        fs::{absolute_path, expand_path},
        logger::{ConsoleLogger, Logger},
        t,
    },
};

/// Everything the `run` subcommand was given.
/// `run` 子命令收到的全部参数。
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Values taken straight from the flags / 直接取自标志的值
    pub config: TestRunConfiguration,
    pub mode: RunMode,
    /// An explicit `--output`, which beats the project file.
    /// 显式的 `--output`，优先于项目文件。
    pub output: Option<PathBuf>,
    pub project_dir: PathBuf,
    /// Project file, relative to `project_dir` unless absolute.
    /// 项目文件，除非是绝对路径，否则相对于 `project_dir`。
    pub project_config: PathBuf,
    pub runner: Option<PathBuf>,
    /// Whether `--lang` was passed; the project file language is ignored then.
    pub language_given: bool,
}

/// Executes the run command with the provided options.
///
/// # Arguments
/// * `options` - The parsed command-line options
///
/// # Returns
/// A Result indicating success or failure. A failed run carries a
/// [`RunError`](crate::core::models::RunError) so the caller can read its exit code.
pub async fn execute(options: RunOptions) -> Result<()> {
    execute_with(options, |verbose| -> Arc<dyn Logger> {
        Arc::new(ConsoleLogger::new(verbose))
    })
    .await
}

/// Same as [`execute`], with the logger built by `make_logger` once the final
/// verbosity is known.
///
/// 与 [`execute`] 相同，但在确定最终的详细模式后由 `make_logger` 构建日志器。
pub async fn execute_with<F>(options: RunOptions, make_logger: F) -> Result<()>
where
    F: FnOnce(bool) -> Arc<dyn Logger>,
{
    let RunOptions {
        mut config,
        mode,
        output,
        project_dir,
        project_config,
        runner,
        language_given,
    } = options;

    let project_dir = fs::canonicalize(&project_dir)
        .with_context(|| t!("run.project_dir_not_found", path = project_dir.display()).to_string())?;

    let project_config_path = project_dir.join(&project_config);
    let project = load_project_config(&project_config_path)?;
    if !language_given {
        if let Some(language) = &project.language {
            crate::set_language(language);
        }
    }

    // A command-line intern config is relative to the working directory.
    if let Some(intern_config) = &config.intern_config {
        config.intern_config = Some(absolute_path(&expand_path(intern_config)?));
    }
    config.apply_project_config(&project);
    mode.apply(&mut config);
    if let Some(output) = &output {
        config.output = expand_path(output)?;
    }

    let mut ctx = RunContext::for_project(project_dir);
    if let Some(runner) = &runner {
        ctx.runner = absolute_path(&expand_path(runner)?);
    }

    let logger = make_logger(config.verbose);
    if config.verbose {
        logger.debug(
            &t!("run.project_root_detected", path = ctx.project_dir.display())
                .cyan()
                .to_string(),
        );
        if project_config_path.exists() {
            logger.debug(
                &t!("run.loading_project_config", path = project_config_path.display())
                    .cyan()
                    .to_string(),
            );
        }
    }

    let reports = TestRunner::new(ctx, Arc::clone(&logger)).run(&config).await?;

    for (kind, destination) in reports
        .iter()
        .filter_map(|report| report.destination.as_ref().map(|d| (report.kind, d)))
    {
        logger.log(&format!("  {} {}", kind.to_string().bold(), destination.display()));
    }

    Ok(())
}
