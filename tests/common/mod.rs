// Shared test helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

use intern_test::core::config::RunContext;

/// Initialize i18n for tests / 为测试初始化 i18n
pub fn setup_i18n() {
    intern_test::set_language("en");
}

/// Creates an empty project named `name` with a `package.json`.
pub fn setup_project(name: &str) -> TempDir {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    fs::write(
        temp_dir.path().join("package.json"),
        format!(r#"{{ "name": "{name}", "version": "1.0.0" }}"#),
    )
    .expect("Failed to write package.json");
    temp_dir
}

/// The run context for a project created by [`setup_project`].
pub fn project_context(project: &TempDir) -> RunContext {
    let mut ctx = RunContext::for_project(project.path().to_path_buf());
    ctx.package_dir = project.path().join("node_modules").join("intern-test");
    ctx
}

/// File the fake runner appends its arguments to, one per line.
pub fn recorded_args_file(project: &TempDir) -> PathBuf {
    project.path().join("runner-args.txt")
}

/// Arguments the fake runner received, across every invocation.
pub fn recorded_args(project: &TempDir) -> Vec<String> {
    fs::read_to_string(recorded_args_file(project))
        .map(|content| content.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Installs `node_modules/.bin/intern` as a shell script that records its
/// arguments and exits with `exit_code`.
#[cfg(unix)]
pub fn install_fake_runner(project: &TempDir, exit_code: i32) -> PathBuf {
    let script = format!(
        "#!/bin/sh\nfor arg in \"$@\"; do printf '%s\\n' \"$arg\" >> '{}'; done\nexit {exit_code}\n",
        recorded_args_file(project).display()
    );
    let path = project.path().join("node_modules").join(".bin").join("intern");
    write_script(&path, &script);
    path
}

/// Writes an executable shell script.
#[cfg(unix)]
pub fn write_script(path: &Path, content: &str) {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create script directory");
    }
    fs::write(path, content).expect("Failed to write script");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
}

/// Raw coverage as the runner leaves it: one project source behind a
/// bundler URI, a dependency, a stylesheet module and the top-level bundle.
pub const SAMPLE_COVERAGE: &str = r#"{
    "webpack:///src/widget.js?abc": {
        "path": "webpack:///src/widget.js?abc",
        "statementMap": {
            "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 12 } },
            "1": { "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 12 } }
        },
        "fnMap": {
            "0": {
                "name": "widget",
                "decl": { "start": { "line": 1, "column": 9 }, "end": { "line": 1, "column": 15 } },
                "loc": { "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 1 } }
            }
        },
        "branchMap": {},
        "s": { "0": 4, "1": 0 },
        "f": { "0": 4 },
        "b": {}
    },
    "webpack:///node_modules/lib/index.js": {
        "path": "webpack:///node_modules/lib/index.js",
        "statementMap": {
            "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 5 } }
        },
        "fnMap": {},
        "branchMap": {},
        "s": { "0": 1 },
        "f": {},
        "b": {}
    },
    "webpack:///src/theme.css?module": {
        "path": "webpack:///src/theme.css?module",
        "statementMap": {},
        "fnMap": {},
        "branchMap": {},
        "s": {},
        "f": {},
        "b": {}
    },
    "bundle.js": {
        "path": "bundle.js",
        "statementMap": {},
        "fnMap": {},
        "branchMap": {},
        "s": {},
        "f": {},
        "b": {}
    }
}"#;

/// Writes [`SAMPLE_COVERAGE`] as the project's `coverage-final.json`.
pub fn write_sample_coverage(project: &TempDir) -> PathBuf {
    let path = project.path().join("coverage-final.json");
    fs::write(&path, SAMPLE_COVERAGE).expect("Failed to write coverage-final.json");
    path
}
