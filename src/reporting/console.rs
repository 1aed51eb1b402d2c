//! # Console Reporting Module / 控制台报告模块
//!
//! This module renders the plain-text coverage summary that is always shown
//! after a run, one row per source file plus a total row.
//!
//! 此模块渲染每次运行后都会显示的纯文本覆盖率摘要，
//! 每个源文件一行，另加一行总计。

use colored::*;

use crate::core::coverage::{CoverageMap, Totals, format_pct, total_summary};
use crate::infra::t;

/// Below this percentage a metric is shown in red.
const LOW_WATERMARK: f64 = 50.0;
/// At or above this percentage a metric is shown in green.
const HIGH_WATERMARK: f64 = 80.0;

const METRIC_HEADERS: [&str; 4] = ["% Stmts", "% Branch", "% Funcs", "% Lines"];
const UNCOVERED_HEADER: &str = "Uncovered Line #s";

/// Renders the coverage summary table.
///
/// 渲染覆盖率摘要表格。
///
/// # Output Format / 输出格式
/// ```text
/// -----------|---------|----------|---------|---------|-------------------
/// File       | % Stmts | % Branch | % Funcs | % Lines | Uncovered Line #s
/// -----------|---------|----------|---------|---------|-------------------
/// All files  |   66.67 |       50 |     100 |   66.67 |
///  src/a.js  |   66.67 |       50 |     100 |   66.67 | 3
/// -----------|---------|----------|---------|---------|-------------------
/// ```
pub fn text_summary(coverage: &CoverageMap) -> String {
    let all_files = t!("report.all_files").to_string();
    let file_header = t!("report.file").to_string();

    let name_width = coverage
        .keys()
        .map(|name| name.chars().count() + 1)
        .chain([all_files.chars().count(), file_header.chars().count()])
        .max()
        .unwrap_or(0);

    let separator = {
        let mut parts = vec!["-".repeat(name_width + 1)];
        parts.extend(METRIC_HEADERS.iter().map(|h| "-".repeat(h.len() + 2)));
        parts.push("-".repeat(UNCOVERED_HEADER.len() + 1));
        parts.join("|")
    };

    let mut lines = vec![separator.clone()];
    lines.push(format!(
        "{:<name_width$} | {} | {UNCOVERED_HEADER}",
        file_header,
        METRIC_HEADERS.join(" | ")
    ));
    lines.push(separator.clone());

    let total = total_summary(coverage);
    lines.push(row(
        &all_files,
        name_width,
        [total.statements, total.branches, total.functions, total.lines],
        "",
    ));

    for (name, file) in coverage {
        let summary = file.summary();
        let uncovered = compress_lines(&file.uncovered_lines());
        lines.push(row(
            &format!(" {name}"),
            name_width,
            [summary.statements, summary.branches, summary.functions, summary.lines],
            &uncovered,
        ));
    }

    lines.push(separator);
    lines.join("\n")
}

fn row(name: &str, name_width: usize, metrics: [Totals; 4], uncovered: &str) -> String {
    let cells: Vec<String> = metrics
        .iter()
        .zip(METRIC_HEADERS)
        .map(|(totals, header)| {
            let pct = totals.pct();
            let cell = format!("{:>width$}", format_pct(pct), width = header.len());
            colorize(&cell, pct).to_string()
        })
        .collect();
    format!(
        "{:<name_width$} | {} | {}",
        name,
        cells.join(" | "),
        uncovered.red()
    )
    .trim_end()
    .to_string()
}

fn colorize(cell: &str, pct: f64) -> ColoredString {
    if pct >= HIGH_WATERMARK {
        cell.green()
    } else if pct >= LOW_WATERMARK {
        cell.yellow()
    } else {
        cell.red()
    }
}

/// Collapses sorted line numbers into ranges, e.g. `[1, 2, 3, 7]` → `1-3,7`.
/// 将已排序的行号折叠为区间，例如 `[1, 2, 3, 7]` → `1-3,7`。
pub fn compress_lines(lines: &[u32]) -> String {
    let mut ranges: Vec<(u32, u32)> = Vec::new();
    for &line in lines {
        match ranges.last_mut() {
            Some((_, end)) if *end + 1 == line => *end = line,
            _ => ranges.push((line, line)),
        }
    }
    ranges
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
