//! # LCOV Reporting Module / LCOV 报告模块
//!
//! Renders a coverage map as an LCOV tracefile (the `lcovonly` format).
//!
//! 将覆盖率映射渲染为 LCOV 跟踪文件（`lcovonly` 格式）。

use std::fmt::Write;

use crate::core::coverage::CoverageMap;

/// Renders `coverage` as LCOV text, one record per file.
pub fn render(coverage: &CoverageMap) -> String {
    let mut out = String::new();

    for (name, file) in coverage {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "TN:");
        let _ = writeln!(out, "SF:{name}");

        for function in file.fn_map.values() {
            let line = function.line.or(function.loc.start.line).unwrap_or(0);
            let _ = writeln!(out, "FN:{line},{}", function.name);
        }
        for (id, function) in &file.fn_map {
            let hits = file.f.get(id).copied().unwrap_or(0);
            let _ = writeln!(out, "FNDA:{hits},{}", function.name);
        }
        let summary = file.summary();
        let _ = writeln!(out, "FNF:{}", summary.functions.total);
        let _ = writeln!(out, "FNH:{}", summary.functions.covered);

        for (line, hits) in file.line_hits() {
            let _ = writeln!(out, "DA:{line},{hits}");
        }
        let _ = writeln!(out, "LF:{}", summary.lines.total);
        let _ = writeln!(out, "LH:{}", summary.lines.covered);

        for (id, branch) in &file.branch_map {
            let line = branch
                .line
                .or_else(|| branch.loc.and_then(|loc| loc.start.line))
                .or_else(|| branch.locations.iter().find_map(|loc| loc.start.line))
                .unwrap_or(0);
            let hits = file.b.get(id);
            for index in 0..branch.locations.len() {
                let taken = hits.and_then(|h| h.get(index)).copied().unwrap_or(0);
                let _ = writeln!(out, "BRDA:{line},{id},{index},{taken}");
            }
        }
        let _ = writeln!(out, "BRF:{}", summary.branches.total);
        let _ = writeln!(out, "BRH:{}", summary.branches.covered);
        let _ = writeln!(out, "end_of_record");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::coverage::FileCoverage;

    #[test]
    fn records_every_metric() {
        let file: FileCoverage = serde_json::from_str(
            r#"{
                "path": "src/a.js",
                "statementMap": {
                    "0": { "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 9 } }
                },
                "fnMap": {
                    "0": { "name": "main", "loc": { "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 1 } } }
                },
                "branchMap": {
                    "0": { "line": 2, "type": "if", "locations": [
                        { "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 1 } },
                        { "start": { "line": 2, "column": 2 }, "end": { "line": 2, "column": 3 } }
                    ] },
                    "1": { "type": "if", "locations": [
                        { "start": {}, "end": {} },
                        { "start": { "line": 3, "column": 0 }, "end": { "line": 3, "column": 1 } }
                    ] }
                },
                "s": { "0": 3 },
                "f": { "0": 1 },
                "b": { "0": [3, 0], "1": [0, 3] }
            }"#,
        )
        .unwrap();
        let mut coverage = CoverageMap::new();
        coverage.insert("src/a.js".to_string(), file);

        let lcov = render(&coverage);
        assert!(lcov.starts_with("TN:\nSF:src/a.js\n"));
        assert!(lcov.contains("FN:1,main\n"));
        assert!(lcov.contains("FNDA:1,main\n"));
        assert!(lcov.contains("DA:2,3\n"));
        assert!(lcov.contains("BRDA:2,0,0,3\nBRDA:2,0,1,0\n"));
        assert!(lcov.contains("BRDA:3,1,0,0\nBRDA:3,1,1,3\n"));
        assert!(lcov.contains("BRF:4\nBRH:2\n"));
        assert!(lcov.ends_with("end_of_record\n"));
    }
}
