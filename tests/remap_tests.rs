//! # Coverage Remapper Integration Tests / 覆盖率重映射集成测试
//!
//! Runs the remap pipeline over coverage files in a temporary project.
//!
//! 在临时项目中对覆盖率文件运行重映射流程。

mod common;

use common::*;
use intern_test::CoverageRemapper;
use intern_test::core::coverage::CoverageMap;
use intern_test::core::models::{RemapError, ReportKind};
use intern_test::core::remap::RemapOptions;
use intern_test::infra::logger::{Level, RecordingLogger};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

fn options(project: &tempfile::TempDir, coverage: bool) -> RemapOptions {
    RemapOptions {
        project_dir: project.path().to_path_buf(),
        project_name: "widgets".to_string(),
        coverage,
        output: PathBuf::from("output/coverage"),
        verbose: false,
    }
}

#[tokio::test]
async fn missing_coverage_file_produces_nothing() {
    setup_i18n();
    let project = setup_project("widgets");
    let logger = Arc::new(RecordingLogger::new());

    let written = CoverageRemapper::new(options(&project, true), logger.clone())
        .remap()
        .await
        .unwrap();

    assert!(written.is_empty());
    assert!(logger.messages(Level::Log).is_empty());
    assert!(!project.path().join("output").exists());
}

#[tokio::test]
async fn text_summary_only_without_the_coverage_flag() {
    setup_i18n();
    let project = setup_project("widgets");
    let coverage_file = write_sample_coverage(&project);
    let logger = Arc::new(RecordingLogger::new());

    let written = CoverageRemapper::new(options(&project, false), logger.clone())
        .remap()
        .await
        .unwrap();

    assert_eq!(written.len(), 1);
    assert_eq!(written[0].kind, ReportKind::Text);
    assert_eq!(written[0].destination, None);
    assert!(!coverage_file.exists());
    assert!(!project.path().join("output").exists());

    let logs = logger.messages(Level::Log).join("\n");
    assert!(logs.contains("Coverage summary for widgets"));
    assert!(logs.contains("All files"));
}

#[tokio::test]
async fn coverage_flag_writes_every_report() {
    setup_i18n();
    let project = setup_project("widgets");
    write_sample_coverage(&project);
    let logger = Arc::new(RecordingLogger::new());

    let written = CoverageRemapper::new(options(&project, true), logger.clone())
        .remap()
        .await
        .unwrap();

    let kinds: Vec<_> = written.iter().map(|report| report.kind).collect();
    assert_eq!(
        kinds,
        vec![ReportKind::Text, ReportKind::Html, ReportKind::Json, ReportKind::Lcov]
    );

    let output = project.path().join("output/coverage");
    let json = fs::read_to_string(output.join("coverage-final.json")).unwrap();
    let remapped: CoverageMap = serde_json::from_str(&json).unwrap();
    assert_eq!(remapped.keys().collect::<Vec<_>>(), vec!["src/widget.js"]);
    assert_eq!(remapped["src/widget.js"].path, "src/widget.js");

    let lcov = fs::read_to_string(output.join("coverage-final.lcov")).unwrap();
    assert!(lcov.contains("SF:src/widget.js\n"));
    assert!(lcov.contains("FNDA:4,widget\n"));
    assert!(lcov.contains("DA:2,0\n"));

    let index = fs::read_to_string(output.join("html-report/index.html")).unwrap();
    assert!(index.contains("Coverage report for widgets"));
    assert!(output.join("html-report/src_widget.js.html").is_file());
}

#[tokio::test]
async fn missing_source_maps_are_only_debug_noise() {
    setup_i18n();
    let project = setup_project("widgets");
    write_sample_coverage(&project);
    let logger = Arc::new(RecordingLogger::new());

    CoverageRemapper::new(options(&project, false), logger.clone())
        .remap()
        .await
        .unwrap();

    assert!(logger.messages(Level::Warn).is_empty());
    let debug = logger.messages(Level::Debug);
    assert!(
        debug
            .iter()
            .any(|m| m == "Could not find source map for: \"bundle.js\"")
    );
}

#[tokio::test]
async fn unusable_source_maps_are_warnings() {
    setup_i18n();
    let project = setup_project("widgets");
    fs::write(
        project.path().join("coverage-final.json"),
        r#"{
            "output/bundle.js": {
                "path": "output/bundle.js",
                "statementMap": {},
                "fnMap": {},
                "branchMap": {},
                "s": {}, "f": {}, "b": {},
                "inputSourceMap": { "version": 3, "mappings": 42 }
            }
        }"#,
    )
    .unwrap();
    let logger = Arc::new(RecordingLogger::new());

    CoverageRemapper::new(options(&project, false), logger.clone())
        .remap()
        .await
        .unwrap();

    let warnings = logger.messages(Level::Warn);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Invalid source map for \"output/bundle.js\""));
}

#[tokio::test]
async fn inline_source_maps_move_coverage_to_original_sources() {
    setup_i18n();
    let project = setup_project("widgets");
    fs::write(
        project.path().join("coverage-final.json"),
        r#"{
            "output/bundle.js": {
                "path": "output/bundle.js",
                "statementMap": {
                    "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 3 } },
                    "1": { "start": { "line": 2, "column": 0 }, "end": { "line": 2, "column": 3 } }
                },
                "fnMap": {},
                "branchMap": {},
                "s": { "0": 2, "1": 0 },
                "f": {},
                "b": {},
                "inputSourceMap": {
                    "version": 3,
                    "sources": ["webpack:///src/a.js", "webpack:///src/b.js"],
                    "sourcesContent": ["a();\n", "\n\n\n\nb();\n"],
                    "names": [],
                    "mappings": "AAAA;ACIA"
                }
            }
        }"#,
    )
    .unwrap();
    let logger = Arc::new(RecordingLogger::new());

    CoverageRemapper::new(options(&project, true), logger.clone())
        .remap()
        .await
        .unwrap();

    let json =
        fs::read_to_string(project.path().join("output/coverage/coverage-final.json")).unwrap();
    let remapped: CoverageMap = serde_json::from_str(&json).unwrap();
    assert_eq!(
        remapped.keys().collect::<Vec<_>>(),
        vec!["src/a.js", "src/b.js"]
    );
    assert_eq!(remapped["src/a.js"].line_hits().get(&1), Some(&2));
    assert_eq!(remapped["src/b.js"].line_hits().get(&5), Some(&0));
    assert!(remapped["src/a.js"].input_source_map.is_none());

    let page =
        fs::read_to_string(project.path().join("output/coverage/html-report/src_b.js.html"))
            .unwrap();
    assert!(page.contains("b();"));
}

#[tokio::test]
async fn malformed_coverage_is_a_parse_error() {
    setup_i18n();
    let project = setup_project("widgets");
    let coverage_file = project.path().join("coverage-final.json");
    fs::write(&coverage_file, "not json").unwrap();
    let logger = Arc::new(RecordingLogger::new());

    let err = CoverageRemapper::new(options(&project, false), logger)
        .remap()
        .await
        .unwrap_err();

    assert!(matches!(err, RemapError::Parse { .. }));
    assert!(coverage_file.exists());
}

#[tokio::test]
async fn verbose_remaps_log_each_decision() {
    setup_i18n();
    let project = setup_project("widgets");
    write_sample_coverage(&project);
    let logger = Arc::new(RecordingLogger::new());

    let mut verbose = options(&project, true);
    verbose.verbose = true;
    CoverageRemapper::new(verbose, logger.clone())
        .remap()
        .await
        .unwrap();

    let debug = logger.messages(Level::Debug);
    assert!(debug.iter().any(|m| m.ends_with(": webpack:///src/widget.js?abc")));
    assert!(debug.iter().any(|m| m.ends_with(": bundle.js")));
    assert!(debug.iter().any(|m| m.contains("coverage-final.json accessible: true")));
    assert!(debug.iter().any(|m| m.contains("Extra coverage reports will be written to")));
}

#[tokio::test]
async fn branches_without_a_position_are_accepted() {
    setup_i18n();
    let project = setup_project("widgets");
    fs::write(
        project.path().join("coverage-final.json"),
        r#"{
            "/repo/src/guard.js": {
                "path": "/repo/src/guard.js",
                "statementMap": {
                    "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 1 } },
                    "1": { "start": { "line": 2, "column": 2 }, "end": { "line": 2, "column": 9 } }
                },
                "fnMap": {},
                "branchMap": {
                    "0": {
                        "loc": { "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 1 } },
                        "type": "if",
                        "locations": [
                            { "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 1 } },
                            { "start": {}, "end": {} }
                        ],
                        "line": 1
                    }
                },
                "s": { "0": 3, "1": 1 },
                "f": {},
                "b": { "0": [1, 2] }
            }
        }"#,
    )
    .unwrap();
    let logger = Arc::new(RecordingLogger::new());

    let written = CoverageRemapper::new(options(&project, true), logger)
        .remap()
        .await
        .unwrap();
    assert_eq!(written.len(), 4);

    let output = project.path().join("output/coverage");
    let json = fs::read_to_string(output.join("coverage-final.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        value["/repo/src/guard.js"]["branchMap"]["0"]["locations"][1],
        serde_json::json!({ "start": {}, "end": {} })
    );

    let lcov = fs::read_to_string(output.join("coverage-final.lcov")).unwrap();
    assert!(lcov.contains("BRDA:1,0,1,2\n"));
    assert!(lcov.contains("DA:2,1\n"));
}

#[tokio::test]
async fn keys_mapping_to_the_same_path_are_merged() {
    setup_i18n();
    let project = setup_project("widgets");
    let entry = |key: &str, hits: u64| {
        format!(
            r#""{key}": {{
                "path": "{key}",
                "statementMap": {{
                    "0": {{ "start": {{ "line": 1, "column": 0 }}, "end": {{ "line": 1, "column": 8 }} }},
                    "1": {{ "start": {{ "line": 2, "column": 0 }}, "end": {{ "line": 2, "column": 8 }} }}
                }},
                "fnMap": {{}},
                "branchMap": {{}},
                "s": {{ "0": {hits}, "1": 0 }},
                "f": {{}},
                "b": {{}}
            }}"#
        )
    };
    fs::write(
        project.path().join("coverage-final.json"),
        format!(
            "{{ {}, {}, {} }}",
            entry("webpack:///src/a.js?1", 5),
            entry("webpack:///src/a.js?2", 0),
            entry("webpack:///./src/a.js", 2),
        ),
    )
    .unwrap();
    let logger = Arc::new(RecordingLogger::new());

    CoverageRemapper::new(options(&project, true), logger.clone())
        .remap()
        .await
        .unwrap();

    let json =
        fs::read_to_string(project.path().join("output/coverage/coverage-final.json")).unwrap();
    let remapped: CoverageMap = serde_json::from_str(&json).unwrap();
    assert_eq!(remapped.keys().collect::<Vec<_>>(), vec!["src/a.js"]);
    let file = &remapped["src/a.js"];
    assert_eq!(file.statement_map.len(), 2);
    assert_eq!(file.line_hits().get(&1), Some(&7));
    assert_eq!(file.uncovered_lines(), vec![2]);

    let logs = logger.messages(Level::Log).join("\n");
    assert!(logs.contains("src/a.js"));
}

#[tokio::test]
async fn unknown_istanbul_fields_reach_the_json_report() {
    setup_i18n();
    let project = setup_project("widgets");
    fs::write(
        project.path().join("coverage-final.json"),
        r#"{
            "/repo/src/plain.js": {
                "path": "/repo/src/plain.js",
                "statementMap": {
                    "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 4 } }
                },
                "fnMap": {}, "branchMap": {},
                "s": { "0": 1 }, "f": {}, "b": {},
                "l": { "1": 1 },
                "hash": "3f1c",
                "_coverageSchema": "1a1c01bbd47fc00a2c39e90264f33305004495a9"
            }
        }"#,
    )
    .unwrap();
    let logger = Arc::new(RecordingLogger::new());

    CoverageRemapper::new(options(&project, true), logger)
        .remap()
        .await
        .unwrap();

    let json =
        fs::read_to_string(project.path().join("output/coverage/coverage-final.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let file = &value["/repo/src/plain.js"];
    assert_eq!(file["hash"], "3f1c");
    assert_eq!(file["l"]["1"], 1);
    assert_eq!(
        file["_coverageSchema"],
        "1a1c01bbd47fc00a2c39e90264f33305004495a9"
    );
}
