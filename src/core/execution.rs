//! # Test Execution Module / 测试执行模块
//!
//! This module drives one test run: it assembles the runner arguments,
//! checks preconditions, spawns the Intern runner with the terminal attached
//! and always hands the leftover coverage to the remapper afterwards.
//!
//! 此模块驱动一次测试运行：组装运行器参数，检查前置条件，
//! 在连接终端的情况下派生 Intern 运行器，并始终在之后将剩余的覆盖率交给重映射器。

use colored::*;
use std::sync::Arc;
use tokio::process::Command;

use crate::{
    core::{
        arguments::{build_arguments, reporter_output_directories},
        config::{RunContext, TestRunConfiguration},
        models::{FAILURE_EXIT_CODE, ReportWritten, RunError},
        remap::{CoverageRemapper, RemapOptions},
    },
    infra::{
        command::{display_command, spawn_and_capture, spawn_inherited},
        fs::ensure_directories,
        logger::Logger,
        t,
    },
};

/// Program used to check that a Java VM is installed.
const JAVA_PROGRAM: &str = "java";

/// Runs test suites through the Intern runner.
/// 通过 Intern 运行器运行测试套件。
pub struct TestRunner {
    ctx: RunContext,
    logger: Arc<dyn Logger>,
    java: String,
}

impl TestRunner {
    pub fn new(ctx: RunContext, logger: Arc<dyn Logger>) -> Self {
        Self {
            ctx,
            logger,
            java: JAVA_PROGRAM.to_string(),
        }
    }

    /// Replaces the program run by the Java preflight check.
    /// 替换 Java 预检查所探测的程序。
    pub fn with_java(mut self, program: impl Into<String>) -> Self {
        self.java = program.into();
        self
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Executes one run and returns the coverage reports that were written.
    ///
    /// A configuration or precondition error (no Java VM, a reporter
    /// directory that cannot be created) aborts before anything is spawned.
    /// Once the runner has been started, coverage is remapped exactly once whatever
    /// the runner's outcome; a runner failure stays the primary cause when
    /// the remap fails too.
    ///
    /// 执行一次运行并返回已写入的覆盖率报告。
    /// 配置错误或前置条件错误（没有 Java 虚拟机、无法创建报告器目录）会在派生任何进程之前中止。运行器启动后，无论其结果如何，
    /// 覆盖率都会被重映射且仅一次；如果重映射也失败，运行器失败仍是主要原因。
    pub async fn run(&self, config: &TestRunConfiguration) -> Result<Vec<ReportWritten>, RunError> {
        self.logger.log(
            &t!("run.testing_project", name = &self.ctx.project_name)
                .bold()
                .to_string(),
        );

        let args = build_arguments(config, &self.ctx)?;

        if config.requires_tunnel() {
            self.check_java().await?;
        }

        if config.verbose {
            self.log_configuration(config, &args).await;
        }

        let directories = reporter_output_directories(config);
        ensure_directories(&self.ctx.project_dir, &directories)
            .map_err(|e| RunError::Precondition(format!("{e:#}")))?;

        let outcome = self.spawn_runner(&args).await;

        let remapper = CoverageRemapper::new(
            RemapOptions::new(config, &self.ctx),
            Arc::clone(&self.logger),
        );
        let remapped = remapper.remap().await;

        match (outcome, remapped) {
            (Ok(()), Ok(written)) => {
                self.logger
                    .log(&t!("run.completed_successfully").green().bold().to_string());
                Ok(written)
            }
            (Ok(()), Err(remap)) => Err(RunError::Remap(remap)),
            (Err(cause), Ok(_)) => Err(cause),
            (Err(cause), Err(remap)) => Err(cause.with_remap_failure(remap)),
        }
    }

    async fn spawn_runner(&self, args: &[String]) -> Result<(), RunError> {
        let status = spawn_inherited(&self.ctx.runner, args, &self.ctx.project_dir)
            .await
            .map_err(|e| RunError::Spawn {
                message: t!(
                    "run.spawn_failed",
                    program = self.ctx.runner.display(),
                    error = e
                )
                .to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            self.logger.debug(
                &t!("run.runner_exit_status", status = status).to_string(),
            );
            Err(RunError::Failure {
                message: t!("run.tests_failed").to_string(),
                exit_code: FAILURE_EXIT_CODE,
            })
        }
    }

    /// Fails with a precondition error unless `java -version` reports a version.
    /// 除非 `java -version` 报告了版本号，否则以前置条件错误失败。
    async fn check_java(&self) -> Result<(), RunError> {
        let mut cmd = Command::new(&self.java);
        cmd.arg("-version");
        let (status, output) = spawn_and_capture(cmd).await;

        match status {
            Ok(status) if status.success() && output.contains("version") => Ok(()),
            _ => Err(RunError::Precondition(t!("run.java_missing").to_string())),
        }
    }

    async fn log_configuration(&self, config: &TestRunConfiguration, args: &[String]) {
        self.logger.debug(&t!("run.parsed_arguments").to_string());
        for arg in args {
            self.logger.debug(&format!("  {arg}"));
        }

        if let Some(externals) = &config.externals {
            let paths = externals.inject_paths();
            if !paths.is_empty() {
                self.logger.debug(&t!("run.inject_paths").to_string());
                for path in paths {
                    self.logger.debug(&format!("  {path}"));
                }
            }
        }

        let mut dry_run_args = args.to_vec();
        dry_run_args.push("showConfig".to_string());
        self.logger.debug(
            &t!(
                "run.dry_run",
                command = display_command(&self.ctx.runner, &dry_run_args)
            )
            .to_string(),
        );

        let mut cmd = Command::new(&self.ctx.runner);
        cmd.args(&dry_run_args).current_dir(&self.ctx.project_dir);
        let (status, output) = spawn_and_capture(cmd).await;

        match status {
            Ok(status) if status.success() => self.logger.debug(output.trim_end()),
            Ok(status) => self.logger.warn(
                &t!("run.dry_run_failed", error = status, output = output.trim_end()).to_string(),
            ),
            Err(e) => self
                .logger
                .warn(&t!("run.dry_run_failed", error = e, output = "").to_string()),
        }
    }
}
