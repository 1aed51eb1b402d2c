//! # Coverage Remapper Module / 覆盖率重映射模块
//!
//! Post-processes the `coverage-final.json` the runner leaves in the project
//! directory: applies bundle source maps, keeps only project sources, renames
//! bundler URIs to project-relative paths, deletes the scratch file and
//! writes the requested reports.
//!
//! 对运行器留在项目目录中的 `coverage-final.json` 进行后处理：
//! 应用包的源映射，只保留项目源码，将打包器 URI 重命名为项目相对路径，
//! 删除临时文件并写入所请求的报告。

use colored::*;
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{
    config::{RunContext, TestRunConfiguration},
    coverage::{CoverageMap, insert_or_merge},
    models::{RemapError, ReportKind, ReportWritten},
    source_maps::{Remapped, apply_source_maps},
};
use crate::infra::{logger::Logger, t};
use crate::reporting::{console::text_summary, html, lcov};

/// Compiled scripts outside the bundler's namespace that live in a directory.
static PLAIN_SCRIPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^?]*/[^/?]+\.js$").unwrap());

/// Bundler URIs that point into the project's `src/` tree.
static BUNDLED_SOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^webpack:/{1,3}(?:\./)?src/").unwrap());

/// A leading bundler URI scheme, with an optional `./`.
static BUNDLER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^webpack:/{1,3}(?:\./)?").unwrap());

const BUNDLER_SCHEME: &str = "webpack:";
const STYLESHEET_MODULE: &str = ".css?";

/// Whether a coverage entry belongs in the remapped output.
///
/// Included are compiled scripts outside the bundler namespace that sit in a
/// directory, and bundler URIs under `src/` that are not stylesheet modules.
///
/// 判断覆盖率条目是否属于重映射后的输出。
/// 包含位于某个目录中且不在打包器命名空间内的编译脚本，
/// 以及位于 `src/` 下且不是样式表模块的打包器 URI。
pub fn is_included(path: &str) -> bool {
    if path.starts_with(BUNDLER_SCHEME) {
        BUNDLED_SOURCE.is_match(path) && !path.contains(STYLESHEET_MODULE)
    } else {
        PLAIN_SCRIPT.is_match(path)
    }
}

/// Maps a bundle-relative path to a project-relative one: drops a `?...`
/// suffix, then a leading bundler URI prefix. Applying it twice is the same
/// as applying it once.
///
/// 将包相对路径映射为项目相对路径：先去掉 `?...` 后缀，再去掉开头的打包器 URI 前缀。
/// 应用两次与应用一次的结果相同。
pub fn map_source_path(path: &str) -> String {
    let without_query = path.split_once('?').map_or(path, |(head, _)| head);
    BUNDLER_PREFIX.replace(without_query, "").into_owned()
}

/// Options for one remap pass.
/// 一次重映射的选项。
#[derive(Debug, Clone)]
pub struct RemapOptions {
    /// Directory holding `coverage-final.json`; relative paths resolve here.
    pub project_dir: PathBuf,
    /// Project name shown in the summary banner.
    pub project_name: String,
    /// Write HTML, JSON and LCOV reports in addition to the text summary.
    pub coverage: bool,
    /// Directory for the extra reports, relative to `project_dir`.
    pub output: PathBuf,
    pub verbose: bool,
}

impl RemapOptions {
    pub fn new(config: &TestRunConfiguration, ctx: &RunContext) -> Self {
        Self {
            project_dir: ctx.project_dir.clone(),
            project_name: ctx.project_name.clone(),
            coverage: config.coverage,
            output: config.output.clone(),
            verbose: config.verbose,
        }
    }

    fn coverage_file(&self) -> PathBuf {
        self.project_dir.join("coverage-final.json")
    }

    fn output_dir(&self) -> PathBuf {
        self.project_dir.join(&self.output)
    }
}

/// Remaps the coverage left by a test run.
/// 重映射测试运行留下的覆盖率。
pub struct CoverageRemapper {
    options: RemapOptions,
    logger: Arc<dyn Logger>,
}

impl CoverageRemapper {
    pub fn new(options: RemapOptions, logger: Arc<dyn Logger>) -> Self {
        Self { options, logger }
    }

    /// Runs the remap pipeline. Returns an empty list when the run left no
    /// coverage file behind.
    ///
    /// 执行重映射流程。如果运行没有留下覆盖率文件，则返回空列表。
    pub async fn remap(&self) -> Result<Vec<ReportWritten>, RemapError> {
        let coverage_file = self.options.coverage_file();
        let accessible = is_accessible(&coverage_file);

        if self.options.verbose {
            self.logger.debug(&t!("remap.banner").blue().bold().to_string());
            self.logger
                .debug(&t!("remap.file_accessible", accessible = accessible).to_string());
            if self.options.coverage {
                let output = self.options.output_dir();
                self.logger.debug(
                    &t!("remap.extra_reports", path = output.display()).to_string(),
                );
            }
        }

        if !accessible {
            return Ok(vec![]);
        }

        let raw = load_coverage(&coverage_file)?;
        let Remapped {
            coverage,
            sources,
            warnings,
        } = apply_source_maps(raw, &self.options.project_dir);

        for warning in &warnings {
            if warning.is_benign() {
                self.logger.debug(&warning.to_string());
            } else {
                self.logger.warn(&warning.to_string());
            }
        }

        let (coverage, sources) = self.filter_and_rename(coverage, sources);

        fs::remove_file(&coverage_file).map_err(|source| RemapError::Remove {
            path: coverage_file.clone(),
            source,
        })?;

        self.logger.log(&format!(
            "\n{}\n",
            t!("remap.summary_header", name = &self.options.project_name)
                .blue()
                .on_white()
                .bold()
        ));
        self.logger.log(&text_summary(&coverage));
        let mut written = vec![ReportWritten::console(ReportKind::Text)];

        if self.options.coverage {
            let output = self.options.output_dir();
            self.logger.log(&format!(
                "{} {}\n",
                t!("remap.reports_written").blue().bold(),
                self.options.output.display().to_string().blue()
            ));
            written.extend(write_reports(&coverage, &sources, &output, &self.options.project_name).await?);
        }

        Ok(written)
    }

    fn filter_and_rename(
        &self,
        coverage: CoverageMap,
        sources: BTreeMap<String, String>,
    ) -> (CoverageMap, BTreeMap<String, String>) {
        let mut kept = CoverageMap::new();
        let mut kept_sources = BTreeMap::new();

        for (key, mut file) in coverage {
            let included = is_included(&key);
            if self.options.verbose {
                let decision = if included {
                    t!("remap.include").green()
                } else {
                    t!("remap.exclude").red()
                };
                self.logger.debug(&format!("{decision}: {key}"));
            }
            if !included {
                continue;
            }

            // Keys differing only in a query or bundler prefix land on one path.
            let mapped = map_source_path(&key);
            if let Some(source) = sources.get(&key) {
                kept_sources
                    .entry(mapped.clone())
                    .or_insert_with(|| source.clone());
            }
            file.path = mapped.clone();
            file.input_source_map = None;
            insert_or_merge(&mut kept, mapped, file);
        }

        (kept, kept_sources)
    }
}

fn is_accessible(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && !meta.permissions().readonly())
        .unwrap_or(false)
}

fn load_coverage(path: &Path) -> Result<CoverageMap, RemapError> {
    let content = fs::read_to_string(path).map_err(|source| RemapError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RemapError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes the HTML, JSON and LCOV reports concurrently and waits for all of
/// them.
///
/// 并发写入 HTML、JSON 和 LCOV 报告，并等待全部完成。
async fn write_reports(
    coverage: &CoverageMap,
    sources: &BTreeMap<String, String>,
    output: &Path,
    project_name: &str,
) -> Result<Vec<ReportWritten>, RemapError> {
    let json = serde_json::to_string(coverage).map_err(|source| RemapError::Serialize {
        kind: ReportKind::Json,
        source,
    })?;

    let mut files = html::render_report(coverage, sources, project_name)
        .into_iter()
        .map(|(relative, content)| (ReportKind::Html, output.join("html-report").join(relative), content))
        .collect::<Vec<_>>();
    files.push((ReportKind::Json, output.join("coverage-final.json"), json));
    files.push((
        ReportKind::Lcov,
        output.join("coverage-final.lcov"),
        lcov::render(coverage),
    ));

    try_join_all(
        files
            .into_iter()
            .map(|(kind, path, content)| write_report(kind, path, content)),
    )
    .await?;

    Ok(vec![
        ReportWritten::file(ReportKind::Html, output.join("html-report")),
        ReportWritten::file(ReportKind::Json, output.join("coverage-final.json")),
        ReportWritten::file(ReportKind::Lcov, output.join("coverage-final.lcov")),
    ])
}

async fn write_report(kind: ReportKind, path: PathBuf, content: String) -> Result<(), RemapError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| RemapError::Write {
                kind,
                path: parent.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(&path, content)
        .await
        .map_err(|source| RemapError::Write { kind, path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stylesheet_modules_are_excluded() {
        assert!(!is_included("webpack:///src/foo.css?123"));
    }

    #[test]
    fn bundled_sources_are_included_and_mapped() {
        assert!(is_included("webpack:///src/foo.js?123"));
        assert_eq!(map_source_path("webpack:///src/foo.js?123"), "src/foo.js");
        assert_eq!(map_source_path("webpack:///./src/foo.ts"), "src/foo.ts");
    }

    #[test]
    fn top_level_bundles_and_dependencies_are_excluded() {
        assert!(!is_included("bundle.js"));
        assert!(!is_included("webpack:///node_modules/foo/index.js"));
        assert!(!is_included("webpack:///tests/unit/foo.js"));
        assert!(!is_included("webpack:///(webpack)/buildin/global.js"));
    }

    #[test]
    fn plain_scripts_in_directories_are_included() {
        assert!(is_included("/repo/output/test/src/widget.js"));
        assert!(is_included("src/widget.js"));
        assert!(!is_included("src/widget.ts"));
    }

    #[test]
    fn path_mapping_is_idempotent() {
        for path in [
            "webpack:///src/foo.js?abc",
            "webpack://src/a/b.ts",
            "src/plain.js",
            "/abs/path.js?x=1",
        ] {
            let once = map_source_path(path);
            assert_eq!(map_source_path(&once), once);
        }
    }
}
