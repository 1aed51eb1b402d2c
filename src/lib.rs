//! # Intern Test Library / Intern Test 库
//!
//! This library provides the core functionality for the `intern-test` tool,
//! a command-line driver that runs a project's unit and functional suites
//! through the Intern test runner and remaps bundled coverage back to source.
//!
//! 此库为 `intern-test` 工具提供核心功能，
//! 这是一个通过 Intern 测试运行器执行项目单元测试和功能测试，
//! 并将打包后的覆盖率重新映射回源码的命令行驱动程序。
//!
//! ## Modules / 模块
//!
//! - `core` - Run configuration, argument assembly, execution and coverage remapping
//! - `infra` - Infrastructure services like process spawning, file system helpers and logging
//! - `reporting` - Coverage report writers (console, HTML, LCOV)
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 运行配置、参数组装、执行和覆盖率重映射
//! - `infra` - 基础设施服务，如进程派生、文件系统辅助和日志
//! - `reporting` - 覆盖率报告生成（控制台、HTML、LCOV）
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::arguments::build_arguments;
pub use crate::core::config::TestRunConfiguration;
pub use crate::core::execution::TestRunner;
pub use crate::core::models::{RemapError, RunError};
pub use crate::core::remap::CoverageRemapper;

/// Initializes the application's internationalization (i18n) based on the system locale.
///
/// This function detects the user's system locale and sets the appropriate
/// language for the application's user interface. It attempts to match the full
/// locale (e.g., "zh-CN"), then just the language code (e.g., "en"), and
/// finally falls back to the default language ("en").
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    set_language(&locale);
}

/// Sets the output language, falling back to the language code and then to "en".
///
/// 设置输出语言，依次回退到语言代码和 "en"。
pub fn set_language(locale: &str) {
    let available_locales = rust_i18n::available_locales!();

    let lang = if available_locales.contains(&locale) {
        locale
    } else {
        locale
            .split('-')
            .next()
            .filter(|lang_code| available_locales.contains(lang_code))
            .unwrap_or("en")
    };

    rust_i18n::set_locale(lang);
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
