//! # Command Execution Module / 命令执行模块
//!
//! Spawns external processes, either with inherited standard streams or with
//! their output captured.
//!
//! 派生外部进程，可以继承标准流，也可以捕获其输出。

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Spawns `program` with `args` in `cwd`, inheriting the standard streams,
/// and waits for it to exit.
///
/// 在 `cwd` 中以 `args` 派生 `program`，继承标准流，并等待其退出。
pub async fn spawn_inherited(
    program: &Path,
    args: &[String],
    cwd: &Path,
) -> std::io::Result<ExitStatus> {
    Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .status()
        .await
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Arguments
/// * `cmd` - The `tokio::process::Command` to execute.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    mut cmd: Command,
) -> (std::io::Result<ExitStatus>, String) {
    let mut child = match cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return (Err(e), String::new()),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return (
            Err(std::io::Error::other("failed to capture process output")),
            String::new(),
        );
    };

    // Both readers append to the same buffer.
    // 两个读取任务追加到同一个缓冲区。
    let output = Arc::new(tokio::sync::Mutex::new(String::new()));

    let stdout_output = Arc::clone(&output);
    let stdout_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stdout_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let stderr_output = Arc::clone(&output);
    let stderr_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let mut output = stderr_output.lock().await;
            output.push_str(&line);
            output.push('\n');
        }
    });

    let status = child.wait().await;

    // Wait for the readers so no trailing output is lost.
    let _ = stdout_handle.await;
    let _ = stderr_handle.await;

    let captured = output.lock().await.clone();
    (status, captured)
}

/// Renders a command line for display, quoting arguments where the shell
/// would need it.
///
/// 渲染用于显示的命令行，并在 shell 需要时为参数加引号。
pub fn display_command(program: &Path, args: &[String]) -> String {
    let program = program.to_string_lossy();
    std::iter::once(program.as_ref())
        .chain(args.iter().map(String::as_str))
        .map(|part| {
            shlex::try_quote(part)
                .map(|quoted| quoted.into_owned())
                .unwrap_or_else(|_| part.to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
