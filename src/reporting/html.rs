//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders the HTML coverage report: an index page with one row
//! per source file and a detail page per file that shows line hits next to
//! the original source when the source map carried it.
//!
//! 此模块渲染 HTML 覆盖率报告：一个每个源文件一行的索引页，
//! 以及每个文件一个详情页；当源映射携带源码时，详情页会在原始源码旁显示行命中次数。

use chrono::Local;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use crate::core::coverage::{CoverageMap, CoverageSummary, FileCoverage, Totals, format_pct, total_summary};
use crate::infra::t;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = include_str!("assets/report.css");

/// Renders every page of the report as `(path relative to the report
/// directory, HTML)` pairs.
///
/// 将报告的每个页面渲染为 `(相对于报告目录的路径, HTML)` 对。
pub fn render_report(
    coverage: &CoverageMap,
    sources: &BTreeMap<String, String>,
    project_name: &str,
) -> Vec<(PathBuf, String)> {
    let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let names = page_names(coverage);

    let mut pages = vec![(
        PathBuf::from("index.html"),
        index_page(coverage, &names, project_name, &generated).into_string(),
    )];
    pages.extend(coverage.iter().map(|(name, file)| {
        (
            PathBuf::from(&names[name.as_str()]),
            file_page(name, file, sources.get(name), &generated).into_string(),
        )
    }));
    pages
}

/// Flattens a source path into a single file name for its detail page.
fn page_name(source: &str) -> String {
    source
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

/// Picks a distinct page for every source; a flattened name that is already
/// taken gets a numeric suffix.
///
/// 为每个源文件选择不同的页面；已被占用的扁平化名称会加上数字后缀。
fn page_names(coverage: &CoverageMap) -> BTreeMap<&str, String> {
    let mut taken = HashSet::new();
    coverage
        .keys()
        .map(|source| {
            let flat = page_name(source);
            let mut candidate = format!("{flat}.html");
            let mut suffix = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{flat}-{suffix}.html");
                suffix += 1;
            }
            (source.as_str(), candidate)
        })
        .collect()
}

fn status_class(pct: f64) -> &'static str {
    if pct >= 80.0 {
        "high"
    } else if pct >= 50.0 {
        "medium"
    } else {
        "low"
    }
}

fn metric_cell(totals: Totals) -> Markup {
    let pct = totals.pct();
    html! {
        td class=(status_class(pct)) {
            (format_pct(pct)) "% "
            span.fraction { "(" (totals.covered) "/" (totals.total) ")" }
        }
    }
}

fn metric_cells(summary: &CoverageSummary) -> Markup {
    html! {
        (metric_cell(summary.statements))
        (metric_cell(summary.branches))
        (metric_cell(summary.functions))
        (metric_cell(summary.lines))
    }
}

fn page(title: &str, generated: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (title) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                (body)
                footer { (t!("html_report.generated_at", time = generated).to_string()) }
            }
        }
    }
}

fn metric_headers() -> Markup {
    html! {
        th { (t!("html_report.statements").to_string()) }
        th { (t!("html_report.branches").to_string()) }
        th { (t!("html_report.functions").to_string()) }
        th { (t!("html_report.lines").to_string()) }
    }
}

fn index_page(
    coverage: &CoverageMap,
    names: &BTreeMap<&str, String>,
    project_name: &str,
    generated: &str,
) -> Markup {
    let title = t!("html_report.title", name = project_name).to_string();
    let total = total_summary(coverage);

    page(
        &title,
        generated,
        html! {
            h1 { (title) }
            table {
                thead {
                    tr {
                        th { (t!("report.file").to_string()) }
                        (metric_headers())
                    }
                }
                tbody {
                    tr.total {
                        td { (t!("report.all_files").to_string()) }
                        (metric_cells(&total))
                    }
                    @for (name, file) in coverage {
                        tr {
                            td { a href=(names[name.as_str()]) { (name) } }
                            (metric_cells(&file.summary()))
                        }
                    }
                }
            }
        },
    )
}

fn file_page(name: &str, file: &FileCoverage, source: Option<&String>, generated: &str) -> Markup {
    let hits = file.line_hits();
    let summary = file.summary();

    page(
        name,
        generated,
        html! {
            h1 { a href="index.html" { (t!("report.all_files").to_string()) } " / " (name) }
            table {
                thead { tr { (metric_headers()) } }
                tbody { tr { (metric_cells(&summary)) } }
            }
            @match source {
                Some(text) => {
                    table.source {
                        @for (index, line) in text.lines().enumerate() {
                            @let number = index as u32 + 1;
                            @let count = hits.get(&number);
                            tr class=(line_class(count)) {
                                td.line-number { (number) }
                                td.hits { @if let Some(count) = count { (count) "×" } }
                                td { pre { (line) } }
                            }
                        }
                    }
                }
                None => {
                    table.source {
                        @for (number, count) in &hits {
                            tr class=(line_class(Some(count))) {
                                td.line-number { (number) }
                                td.hits { (count) "×" }
                            }
                        }
                    }
                }
            }
        },
    )
}

fn line_class(hits: Option<&u64>) -> &'static str {
    match hits {
        Some(0) => "uncovered",
        Some(_) => "covered",
        None => "neutral",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coverage::{Position, Range};

    #[test]
    fn report_has_an_index_and_a_page_per_file() {
        let mut file = FileCoverage::new("src/a.js");
        file.statement_map.insert(
            0,
            Range {
                start: Position::new(2, 0),
                end: Position::new(2, 4),
            },
        );
        file.s.insert(0, 0);
        let mut coverage = CoverageMap::new();
        coverage.insert("src/a.js".to_string(), file);

        let mut sources = BTreeMap::new();
        sources.insert("src/a.js".to_string(), "// a\nfoo();\n".to_string());

        let pages = render_report(&coverage, &sources, "demo");
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].0, PathBuf::from("index.html"));
        assert!(pages[0].1.contains("src_a.js.html"));
        assert_eq!(pages[1].0, PathBuf::from("src_a.js.html"));
        assert!(pages[1].1.contains("class=\"uncovered\""));
        assert!(pages[1].1.contains("foo();"));
    }

    #[test]
    fn colliding_page_names_get_a_suffix() {
        let mut coverage = CoverageMap::new();
        coverage.insert("src/a_b.js".to_string(), FileCoverage::new("src/a_b.js"));
        coverage.insert("src_a/b.js".to_string(), FileCoverage::new("src_a/b.js"));

        let pages = render_report(&coverage, &BTreeMap::new(), "demo");
        let paths: Vec<_> = pages.iter().map(|(path, _)| path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("index.html"),
                PathBuf::from("src_a_b.js.html"),
                PathBuf::from("src_a_b.js-2.html"),
            ]
        );
        assert!(pages[0].1.contains("href=\"src_a_b.js-2.html\""));
    }
}
