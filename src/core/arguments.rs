//! # Argument Builder Module / 参数构建模块
//!
//! Translates a `TestRunConfiguration` into the ordered `key=value` argument
//! list the Intern runner accepts. The runner lets later occurrences of a key
//! override earlier ones, so the order of the output is part of its meaning.
//!
//! 将 `TestRunConfiguration` 转换为 Intern 运行器接受的有序 `key=value` 参数列表。
//! 运行器允许后出现的键覆盖先出现的键，因此输出的顺序本身就有意义。

use serde::Serialize;
use std::path::PathBuf;

use crate::core::{
    config::{RunContext, TestRunConfiguration},
    externals::Externals,
    models::RunError,
    reporters::{RUNNER_REPORTER, Reporter, resolve_reporters},
};
use crate::infra::fs::relative_path;

#[derive(Serialize)]
struct LoaderOption<'a> {
    script: String,
    options: &'a Externals,
}

#[derive(Serialize)]
struct TunnelOptions<'a> {
    username: &'a str,
    #[serde(rename = "accessKey")]
    access_key: &'a str,
}

#[derive(Serialize)]
struct TestingBotTunnelOptions<'a> {
    verbose: &'static str,
    #[serde(rename = "apiKey")]
    api_key: &'a str,
    #[serde(rename = "apiSecret")]
    api_secret: &'a str,
}

#[derive(Serialize)]
struct Capabilities<'a> {
    name: &'a str,
    project: &'a str,
    #[serde(rename = "fixSessionCapabilities", skip_serializing_if = "Option::is_none")]
    fix_session_capabilities: Option<&'static str>,
    #[serde(rename = "browserstack.debug", skip_serializing_if = "Option::is_none")]
    browserstack_debug: Option<&'static str>,
}

/// Builds the runner arguments for `config`.
///
/// The only failure is an externals descriptor without a remote child
/// configuration; everything else is passed through as given.
///
/// 为 `config` 构建运行器参数。
/// 唯一的失败情况是提供了外部依赖描述但没有远程子配置；其他输入按原样传递。
///
/// # Arguments
/// * `config` - The run configuration / 运行配置
/// * `ctx` - Paths and project name to resolve against / 用于解析的路径和项目名称
pub fn build_arguments(
    config: &TestRunConfiguration,
    ctx: &RunContext,
) -> Result<Vec<String>, RunError> {
    let child_config = config
        .child_config
        .as_deref()
        .filter(|name| !name.is_empty());

    let mut args = vec![format!("config={}", config_path(config, ctx, child_config))];

    if !config.remote_unit && !config.node_unit {
        args.push("suites=".to_string());
    }

    if !config.remote_unit && !config.remote_functional {
        args.push("environments=".to_string());
    } else if !config.remote_functional {
        args.push("functionalSuites=".to_string());
    }

    if let Some(externals) = &config.externals {
        if child_config.is_none() {
            return Err(RunError::Configuration(
                "externals unsupported without a remote configuration".to_string(),
            ));
        }
        let loader = LoaderOption {
            script: package_path(ctx, &["loaders", "externals.js"]),
            options: externals,
        };
        args.push(format!("loader={}", to_json(&loader)?));
    }

    if let Some(filter) = &config.filter {
        args.push(format!("grep={filter}"));
    }

    if let Some(list) = &config.reporters {
        args.extend(reporter_arguments(&resolve_reporters(list)));
    }

    if let Some(tunnel) = tunnel_options(config, child_config)? {
        args.push(format!("tunnelOptions={tunnel}"));
    }

    let capabilities = Capabilities {
        name: &ctx.project_name,
        project: &ctx.project_name,
        fix_session_capabilities: matches!(child_config, Some("browserstack" | "saucelabs"))
            .then_some("false"),
        browserstack_debug: (child_config == Some("browserstack")).then_some("false"),
    };
    args.push(format!("capabilities={}", to_json(&capabilities)?));

    Ok(args)
}

/// Directories the requested file reporters write into, relative to the
/// project directory. They must exist before the runner starts.
///
/// 所请求的文件报告器写入的目录（相对于项目目录）。它们必须在运行器启动前存在。
pub fn reporter_output_directories(config: &TestRunConfiguration) -> Vec<PathBuf> {
    config
        .reporters
        .as_deref()
        .map(resolve_reporters)
        .unwrap_or_default()
        .iter()
        .filter_map(Reporter::output_directory)
        .collect()
}

fn config_path(config: &TestRunConfiguration, ctx: &RunContext, child: Option<&str>) -> String {
    match &config.intern_config {
        Some(path) => relative_path(&ctx.project_dir, &ctx.project_dir.join(path)),
        None => {
            let packaged = package_path(ctx, &["intern", "intern.json"]);
            match child {
                Some(name) => format!("{packaged}@{name}"),
                None => packaged,
            }
        }
    }
}

fn package_path(ctx: &RunContext, parts: &[&str]) -> String {
    let target = parts
        .iter()
        .fold(ctx.package_dir.clone(), |path, part| path.join(part));
    relative_path(&ctx.project_dir, &target)
}

fn reporter_arguments(reporters: &[Reporter]) -> Vec<String> {
    let needs_console = reporters.iter().any(Reporter::writes_to_disk)
        && !reporters.iter().any(|reporter| reporter.name() == RUNNER_REPORTER);

    let console = needs_console.then(|| RUNNER_REPORTER.to_string());
    console
        .into_iter()
        .chain(reporters.iter().map(Reporter::argument_value))
        .map(|value| format!("reporters={value}"))
        .collect()
}

fn tunnel_options(
    config: &TestRunConfiguration,
    child: Option<&str>,
) -> Result<Option<String>, RunError> {
    let key = config.testing_key.as_deref();

    if let (Some("testingbot"), Some(api_key), Some(api_secret)) =
        (child, key, config.secret.as_deref())
    {
        return to_json(&TestingBotTunnelOptions {
            verbose: "true",
            api_key,
            api_secret,
        })
        .map(Some);
    }

    match (config.user_name.as_deref(), key) {
        (Some(username), Some(access_key)) => to_json(&TunnelOptions {
            username,
            access_key,
        })
        .map(Some),
        _ => Ok(None),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, RunError> {
    serde_json::to_string(value)
        .map_err(|e| RunError::Configuration(format!("failed to serialize runner option: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> RunContext {
        RunContext {
            project_dir: PathBuf::from("/work/app"),
            package_dir: PathBuf::from("/work/app/node_modules/intern-test"),
            project_name: "app".to_string(),
            runner: PathBuf::from("/work/app/node_modules/.bin/intern"),
        }
    }

    #[test]
    fn default_configuration_runs_nothing_remote() {
        let args = build_arguments(&TestRunConfiguration::default(), &ctx()).unwrap();
        assert_eq!(
            args,
            vec![
                "config=node_modules/intern-test/intern/intern.json",
                "suites=",
                "environments=",
                r#"capabilities={"name":"app","project":"app"}"#,
            ]
        );
    }

    #[test]
    fn child_config_is_appended_to_the_packaged_config() {
        let config = TestRunConfiguration {
            remote_unit: true,
            child_config: Some("saucelabs".to_string()),
            ..Default::default()
        };
        let args = build_arguments(&config, &ctx()).unwrap();
        assert_eq!(args[0], "config=node_modules/intern-test/intern/intern.json@saucelabs");
        assert_eq!(args[1], "functionalSuites=");
        assert_eq!(
            args.last().unwrap(),
            r#"capabilities={"name":"app","project":"app","fixSessionCapabilities":"false"}"#
        );
    }

    #[test]
    fn explicit_intern_config_is_relative_to_the_project() {
        let config = TestRunConfiguration {
            node_unit: true,
            intern_config: Some(PathBuf::from("tests/intern.json")),
            ..Default::default()
        };
        let args = build_arguments(&config, &ctx()).unwrap();
        assert_eq!(args[0], "config=tests/intern.json");
    }

    #[test]
    fn file_reporters_get_a_console_runner_first() {
        let config = TestRunConfiguration {
            node_unit: true,
            reporters: Some("lcov,pretty".to_string()),
            ..Default::default()
        };
        let args = build_arguments(&config, &ctx()).unwrap();
        let reporters: Vec<_> = args.iter().filter(|a| a.starts_with("reporters=")).collect();
        assert_eq!(
            reporters,
            vec![
                "reporters=runner",
                r#"reporters={"name":"lcov","options":{"directory":"output/coverage/lcov"}}"#,
                "reporters=pretty",
            ]
        );
    }
}
