// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{PROJECT_CONFIG_FILE, RunMode, TestRunConfiguration};
use crate::infra::t;

pub mod commands;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language(args: &[String]) -> Option<String> {
    args.iter().enumerate().find_map(|(pos, arg)| {
        if arg == "--lang" {
            args.get(pos + 1).cloned()
        } else {
            arg.strip_prefix("--lang=").map(str::to_string)
        }
    })
}

fn flag(name: &'static str, help: String) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

fn value(name: &'static str, value_name: &'static str, help: String) -> Arg {
    Arg::new(name)
        .long(name)
        .help(help)
        .value_name(value_name)
        .action(ArgAction::Set)
}

pub fn build_cli() -> Command {
    Command::new("intern-test")
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli.about").to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli.lang").to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cli.run_about").to_string())
                .arg(value("config", "NAME", t!("cli.arg_config").to_string()).short('c'))
                .arg(
                    value("intern-config", "PATH", t!("cli.arg_intern_config").to_string())
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(flag("all", t!("cli.arg_all").to_string()).short('a'))
                .arg(flag("unit", t!("cli.arg_unit").to_string()).short('u'))
                .arg(flag("functional", t!("cli.arg_functional").to_string()).short('f'))
                .arg(flag("node", t!("cli.arg_node").to_string()))
                .arg(flag("browser", t!("cli.arg_browser").to_string()))
                .arg(value("reporters", "LIST", t!("cli.arg_reporters").to_string()).short('r'))
                .arg(value("filter", "PATTERN", t!("cli.arg_filter").to_string()))
                .arg(value("user-name", "USER", t!("cli.arg_user_name").to_string()).short('n'))
                .arg(value("testing-key", "KEY", t!("cli.arg_testing_key").to_string()).short('k'))
                .arg(value("secret", "SECRET", t!("cli.arg_secret").to_string()).short('s'))
                .arg(flag("coverage", t!("cli.arg_coverage").to_string()))
                .arg(
                    value("output", "DIR", t!("cli.arg_output").to_string())
                        .short('o')
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(flag("verbose", t!("cli.arg_verbose").to_string()).short('v'))
                .arg(
                    value("project-dir", "PROJECT_DIR", t!("cli.arg_project_dir").to_string())
                        .default_value(".")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    value("project-config", "FILE", t!("cli.arg_project_config").to_string())
                        .default_value(PROJECT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    value("runner", "PATH", t!("cli.arg_runner").to_string())
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cli.init_about").to_string())
                .arg(flag("non-interactive", t!("cli.arg_non_interactive").to_string())),
        )
}

/// Collects the `run` subcommand's flags.
fn run_options(matches: &ArgMatches, language_given: bool) -> commands::run::RunOptions {
    let text = |name: &str| matches.get_one::<String>(name).cloned();
    let path = |name: &str| matches.get_one::<PathBuf>(name).cloned();

    let config = TestRunConfiguration {
        child_config: text("config"),
        intern_config: path("intern-config"),
        reporters: text("reporters"),
        filter: text("filter"),
        user_name: text("user-name"),
        testing_key: text("testing-key"),
        secret: text("secret"),
        coverage: matches.get_flag("coverage"),
        verbose: matches.get_flag("verbose"),
        ..TestRunConfiguration::default()
    };

    commands::run::RunOptions {
        config,
        mode: RunMode {
            all: matches.get_flag("all"),
            unit: matches.get_flag("unit"),
            functional: matches.get_flag("functional"),
            node: matches.get_flag("node"),
            browser: matches.get_flag("browser"),
        },
        output: path("output"),
        // Both have defaults.
        project_dir: path("project-dir").unwrap_or_else(|| PathBuf::from(".")),
        project_config: path("project-config")
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE)),
        runner: path("runner"),
        language_given,
    }
}

pub async fn run() -> Result<()> {
    // Pre-parse language and initialize i18n first.
    let args: Vec<String> = env::args().collect();
    let language = pre_parse_language(&args);
    match &language {
        Some(language) => crate::set_language(language),
        None => crate::init(),
    }

    let matches = build_cli().get_matches_from(args);

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            commands::run::execute(run_options(run_matches, language.is_some())).await?;
        }
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::run_init_wizard(non_interactive)?;
        }
        _ => {
            // `subcommand_required` makes clap print help and exit before this point.
        }
    }
    Ok(())
}
