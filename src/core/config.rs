//! # Configuration Module / 配置模块
//!
//! Defines the run configuration handed to the argument builder, the
//! optional `InternTest.toml` project file, and the environment a run
//! resolves paths against.
//!
//! 定义传递给参数构建器的运行配置、可选的 `InternTest.toml` 项目文件，
//! 以及运行时解析路径所依据的环境。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::externals::Externals;
use crate::infra::fs::{expand_path, read_project_name};

/// Default name of the project configuration file.
pub const PROJECT_CONFIG_FILE: &str = "InternTest.toml";

/// Default directory for the extra coverage reports.
pub const DEFAULT_OUTPUT_DIR: &str = "output/coverage";

/// Environment variable that overrides the packaged asset directory.
pub const PACKAGE_DIR_ENV: &str = "INTERN_TEST_HOME";

/// Everything the argument builder and the runner need to know about one run.
/// No field is required; the default runs nothing but still produces a
/// well-formed argument list.
///
/// 参数构建器和运行器需要了解的关于一次运行的全部信息。
/// 没有必填字段；默认值不会运行任何套件，但仍会生成格式正确的参数列表。
#[derive(Debug, Clone, PartialEq)]
pub struct TestRunConfiguration {
    /// Run the unit suites in node / 在 node 中运行单元测试套件
    pub node_unit: bool,
    /// Run the unit suites in remote browsers / 在远程浏览器中运行单元测试套件
    pub remote_unit: bool,
    /// Run the functional suites in remote browsers / 在远程浏览器中运行功能测试套件
    pub remote_functional: bool,
    /// Named child configuration, e.g. `browserstack` / 命名的子配置，例如 `browserstack`
    pub child_config: Option<String>,
    /// Explicit intern configuration file / 显式指定的 intern 配置文件
    pub intern_config: Option<PathBuf>,
    /// Comma-separated reporter names / 以逗号分隔的报告器名称
    pub reporters: Option<String>,
    /// Test filter pattern / 测试过滤模式
    pub filter: Option<String>,
    pub user_name: Option<String>,
    pub testing_key: Option<String>,
    pub secret: Option<String>,
    pub externals: Option<Externals>,
    /// Write the extra HTML, JSON and LCOV coverage reports.
    /// 写入额外的 HTML、JSON 和 LCOV 覆盖率报告。
    pub coverage: bool,
    /// Directory for the extra coverage reports, relative to the project.
    /// 额外覆盖率报告的目录（相对于项目）。
    pub output: PathBuf,
    pub verbose: bool,
}

impl Default for TestRunConfiguration {
    fn default() -> Self {
        Self {
            node_unit: false,
            remote_unit: false,
            remote_functional: false,
            child_config: None,
            intern_config: None,
            reporters: None,
            filter: None,
            user_name: None,
            testing_key: None,
            secret: None,
            externals: None,
            coverage: false,
            output: PathBuf::from(DEFAULT_OUTPUT_DIR),
            verbose: false,
        }
    }
}

impl TestRunConfiguration {
    /// Whether any suite runs against remote browsers through a tunnel.
    /// 是否有任何套件通过隧道在远程浏览器上运行。
    pub fn requires_tunnel(&self) -> bool {
        self.remote_unit
            || self.remote_functional
            || self
                .child_config
                .as_deref()
                .is_some_and(|name| !name.is_empty() && name != "local")
    }

    /// Applies values from the project file that the command line left unset.
    /// `output` is taken from the file whenever the file sets it; callers
    /// apply an explicit command-line output afterwards.
    ///
    /// 应用项目文件中命令行未设置的值。
    pub fn apply_project_config(&mut self, project: &ProjectConfig) {
        fill(&mut self.child_config, &project.child_config);
        fill(&mut self.intern_config, &project.intern_config);
        fill(&mut self.reporters, &project.reporters);
        fill(&mut self.filter, &project.filter);
        fill(&mut self.externals, &project.externals);
        self.coverage |= project.coverage;
        if let Some(output) = &project.output {
            self.output.clone_from(output);
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, fallback: &Option<T>) {
    if slot.is_none() {
        slot.clone_from(fallback);
    }
}

/// Which suites a run selects, as given by the command-line mode flags.
/// 命令行模式标志所选择的测试套件。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunMode {
    pub all: bool,
    pub unit: bool,
    pub functional: bool,
    pub node: bool,
    pub browser: bool,
}

impl RunMode {
    /// Writes the selected suites into `config`.
    /// With no flag set, only the node unit suites run.
    ///
    /// 将所选套件写入 `config`。未设置任何标志时，仅运行 node 单元测试。
    pub fn apply(self, config: &mut TestRunConfiguration) {
        let nothing_selected =
            !(self.all || self.unit || self.functional || self.node || self.browser);
        config.node_unit = self.all || self.unit || self.node || nothing_selected;
        config.remote_unit = self.all || self.unit || self.browser;
        config.remote_functional = self.all || self.functional;
    }
}

/// The `InternTest.toml` project file.
/// CLI flags always take precedence over values here.
///
/// `InternTest.toml` 项目文件。命令行标志始终优先于此处的值。
#[derive(Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ProjectConfig {
    /// The language for output messages (e.g., "en", "zh-CN").
    /// 输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_config: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intern_config: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub coverage: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externals: Option<Externals>,
}

/// Loads the project file. A missing file yields the defaults.
/// 加载项目文件。文件不存在时返回默认值。
pub fn load_project_config(path: &Path) -> Result<ProjectConfig> {
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read project config: {}", path.display()))?;
    let mut config: ProjectConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse project config: {}", path.display()))?;

    if let Some(intern_config) = &config.intern_config {
        config.intern_config = Some(expand_path(intern_config)?);
    }
    if let Some(output) = &config.output {
        config.output = Some(expand_path(output)?);
    }
    Ok(config)
}

/// The environment a run resolves its paths against.
/// 运行时解析路径所依据的环境。
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    /// The project directory; the runner is spawned here.
    /// 项目目录；运行器在此处派生。
    pub project_dir: PathBuf,
    /// Directory holding the packaged intern configuration and loader scripts.
    /// 存放打包的 intern 配置和加载器脚本的目录。
    pub package_dir: PathBuf,
    /// Name reported to the testing provider / 报告给测试服务提供商的名称
    pub project_name: String,
    /// The runner executable / 运行器可执行文件
    pub runner: PathBuf,
}

impl RunContext {
    /// Builds the context for a project directory, reading the project name
    /// from its `package.json`.
    ///
    /// 为项目目录构建上下文，并从其 `package.json` 中读取项目名称。
    pub fn for_project(project_dir: PathBuf) -> Self {
        let project_name = read_project_name(&project_dir);
        let runner = project_dir.join("node_modules").join(".bin").join("intern");
        Self {
            project_dir,
            package_dir: default_package_dir(),
            project_name,
            runner,
        }
    }

    /// The conventional coverage file the runner leaves behind.
    pub fn coverage_file(&self) -> PathBuf {
        self.project_dir.join("coverage-final.json")
    }
}

/// The packaged asset directory: `$INTERN_TEST_HOME` if set, otherwise the
/// `assets` directory shipped with the crate.
///
/// 打包资源目录：若设置了 `$INTERN_TEST_HOME` 则使用它，否则使用随 crate 发布的 `assets` 目录。
pub fn default_package_dir() -> PathBuf {
    std::env::var_os(PACKAGE_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"))
}
