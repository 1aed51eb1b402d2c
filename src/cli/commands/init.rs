//! # Project Initialization Module / 项目初始化模块
//!
//! This module provides the `init` command, which creates an
//! `InternTest.toml` project file either from a commented template or
//! through an interactive command-line wizard.
//!
//! 此模块提供 `init` 命令，它通过带注释的模板或交互式命令行向导
//! 创建 `InternTest.toml` 项目文件。
//!
//! ## Features / 功能特性
//!
//! - **Interactive Wizard**: Asks for the child configuration, reporters and coverage
//! - **Project Detection**: Reads the project name from `package.json`
//! - **Overwrite Protection**: Confirmation prompt before overwriting an existing file
//!
//! - **交互式向导**: 询问子配置、报告器和覆盖率
//! - **项目检测**: 从 `package.json` 读取项目名称
//! - **覆盖保护**: 覆盖现有文件前的确认提示

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, Select, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::{
    config::{DEFAULT_OUTPUT_DIR, PROJECT_CONFIG_FILE, ProjectConfig},
    reporters::known_reporters,
};
use crate::infra::{fs::read_project_name, t};

/// Child configurations offered by the wizard; `local` means no tunnel.
const CHILD_CONFIGS: [&str; 4] = ["local", "browserstack", "saucelabs", "testingbot"];

const DEFAULT_CONFIG: &str = r#"# intern-test project configuration / intern-test 项目配置
# Command-line flags always take precedence over the values below.
# 命令行标志始终优先于以下各值。

# Language for output messages / 输出消息的语言
language = "en"

# Named child configuration of the packaged intern.json (e.g. "browserstack").
# 打包的 intern.json 中的命名子配置（例如 "browserstack"）。
# child_config = "local"

# Use a project intern configuration instead of the packaged one.
# 使用项目自己的 intern 配置代替打包的配置。
# intern_config = "./intern.json"

# Comma-separated reporter names / 以逗号分隔的报告器名称
reporters = "runner"

# Only run tests whose name matches / 仅运行名称匹配的测试
# filter = "login"

# Write HTML, JSON and LCOV coverage reports / 写入 HTML、JSON 和 LCOV 覆盖率报告
coverage = false

# Directory for the coverage reports / 覆盖率报告目录
output = "output/coverage"

# Scripts side-loaded before the suites run (remote configurations only).
# 在测试套件运行前旁加载的脚本（仅限远程配置）。
# [externals]
# outputPath = "externals"
# dependencies = [
#     { from = "node_modules/dojo", inject = true },
# ]
"#;

/// Runs the `init` command in the current directory.
///
/// In non-interactive mode the commented template is written, replacing any
/// existing file. Otherwise the wizard asks before overwriting and then
/// collects the project settings.
///
/// 在当前目录运行 `init` 命令。
/// 非交互模式下写入带注释的模板并替换已有文件。否则向导会在覆盖前询问，然后收集项目设置。
pub fn run_init_wizard(non_interactive: bool) -> Result<()> {
    let config_path = Path::new(PROJECT_CONFIG_FILE);

    if non_interactive {
        return write_config(config_path, DEFAULT_CONFIG);
    }

    let theme = ColorfulTheme::default();
    println!("\n{}", t!("init.welcome").cyan().bold());
    println!("{}", t!("init.description"));

    if config_path.exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!("init.overwrite_prompt", path = config_path.display()))
            .default(false)
            .interact()
            .context(t!("init.user_confirmation_failed").to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted"));
            return Ok(());
        }
    }

    let project_name = read_project_name(Path::new("."));
    if !project_name.is_empty() {
        println!(
            "{}",
            t!("init.detected_project_name", name = project_name.green())
        );
    }

    let child = Select::with_theme(&theme)
        .with_prompt(t!("init.child_config_prompt"))
        .items(&CHILD_CONFIGS)
        .default(0)
        .interact()
        .context(t!("init.user_confirmation_failed").to_string())?;

    let names: Vec<&str> = known_reporters().iter().map(|r| r.name()).collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.reporters_prompt"))
        .items(&names)
        .interact()
        .context(t!("init.user_confirmation_failed").to_string())?;

    if selections.is_empty() {
        println!("{}", t!("init.no_reporters_selected").yellow());
    }

    let coverage = Confirm::with_theme(&theme)
        .with_prompt(t!("init.coverage_prompt"))
        .default(true)
        .interact()
        .context(t!("init.user_confirmation_failed").to_string())?;

    let output: String = if coverage {
        Input::with_theme(&theme)
            .with_prompt(t!("init.output_prompt"))
            .default(DEFAULT_OUTPUT_DIR.to_string())
            .interact_text()
            .context(t!("init.user_confirmation_failed").to_string())?
    } else {
        DEFAULT_OUTPUT_DIR.to_string()
    };

    let project = ProjectConfig {
        language: Some(rust_i18n::locale().to_string()),
        child_config: (child != 0).then(|| CHILD_CONFIGS[child].to_string()),
        reporters: (!selections.is_empty()).then(|| {
            selections
                .iter()
                .map(|&index| names[index])
                .collect::<Vec<_>>()
                .join(",")
        }),
        coverage,
        output: Some(output.into()),
        ..ProjectConfig::default()
    };

    let content = toml::to_string_pretty(&project)
        .context(t!("init.serialize_failed").to_string())?;
    write_config(config_path, &content)
}

fn write_config(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)
        .with_context(|| t!("init.write_failed", path = path.display()).to_string())?;

    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success_created", path = path.display()).bold()
    );
    println!("{}", t!("init.usage_hint"));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::load_project_config;

    #[test]
    fn template_parses_as_a_project_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROJECT_CONFIG_FILE);
        fs::write(&path, DEFAULT_CONFIG).unwrap();

        let config = load_project_config(&path).unwrap();
        assert_eq!(config.language.as_deref(), Some("en"));
        assert_eq!(config.reporters.as_deref(), Some("runner"));
        assert!(!config.coverage);
        assert_eq!(config.output, Some(DEFAULT_OUTPUT_DIR.into()));
        assert!(config.externals.is_none());
    }
}
