//! # Reporter Table Module / 报告器表模块
//!
//! The fixed table of reporters the runner understands. Console reporters
//! are passed by name; file reporters carry a JSON descriptor naming where
//! their output is written.
//!
//! 运行器支持的固定报告器表。控制台报告器按名称传递；
//! 文件报告器携带一个 JSON 描述，指明其输出写入的位置。

use serde::Serialize;
use std::path::{Path, PathBuf};

/// The plain console reporter that is added when every requested reporter
/// writes to disk.
pub const RUNNER_REPORTER: &str = "runner";

/// Where a file reporter writes its output.
/// 文件报告器写入输出的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReporterTarget {
    #[serde(rename = "directory")]
    Directory(&'static str),
    #[serde(rename = "filename")]
    Filename(&'static str),
}

/// A known reporter.
/// 已知的报告器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reporter {
    /// Prints to the console / 打印到控制台
    Console(&'static str),
    /// Writes to disk / 写入磁盘
    File {
        name: &'static str,
        target: ReporterTarget,
    },
}

#[derive(Serialize)]
struct FileReporterDescriptor<'a> {
    name: &'a str,
    options: ReporterTarget,
}

const REPORTERS: &[Reporter] = &[
    Reporter::File {
        name: "benchmark",
        target: ReporterTarget::Filename("output/coverage/benchmark/baseline.json"),
    },
    Reporter::File {
        name: "cobertura",
        target: ReporterTarget::Directory("output/coverage/cobertura"),
    },
    Reporter::File {
        name: "htmlcoverage",
        target: ReporterTarget::Directory("output/coverage/html"),
    },
    Reporter::File {
        name: "jsoncoverage",
        target: ReporterTarget::Filename("output/coverage/json/coverage.json"),
    },
    Reporter::File {
        name: "junit",
        target: ReporterTarget::Filename("output/coverage/junit/coverage.xml"),
    },
    Reporter::File {
        name: "lcov",
        target: ReporterTarget::Directory("output/coverage/lcov"),
    },
    Reporter::Console("pretty"),
    Reporter::Console(RUNNER_REPORTER),
    Reporter::Console("simple"),
    Reporter::Console("teamcity"),
];

impl Reporter {
    /// Looks a reporter up by name, ignoring case and surrounding whitespace.
    /// 按名称查找报告器，忽略大小写和首尾空白。
    pub fn lookup(name: &str) -> Option<Reporter> {
        let name = name.trim().to_ascii_lowercase();
        REPORTERS.iter().copied().find(|reporter| reporter.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Reporter::Console(name) => name,
            Reporter::File { name, .. } => name,
        }
    }

    pub fn writes_to_disk(&self) -> bool {
        matches!(self, Reporter::File { .. })
    }

    /// The value of the `reporters=` argument for this reporter.
    /// 此报告器对应的 `reporters=` 参数值。
    pub fn argument_value(&self) -> String {
        match self {
            Reporter::Console(name) => (*name).to_string(),
            Reporter::File { name, target } => serde_json::to_string(&FileReporterDescriptor {
                name,
                options: *target,
            })
            // A struct of string fields always serializes.
            .unwrap_or_else(|_| (*name).to_string()),
        }
    }

    /// The directory that must exist before the runner starts, relative to
    /// the project directory.
    ///
    /// 运行器启动前必须存在的目录（相对于项目目录）。
    pub fn output_directory(&self) -> Option<PathBuf> {
        match self {
            Reporter::Console(_) => None,
            Reporter::File { target, .. } => match target {
                ReporterTarget::Directory(dir) => Some(PathBuf::from(dir)),
                ReporterTarget::Filename(file) => Path::new(file).parent().map(Path::to_path_buf),
            },
        }
    }
}

/// Every reporter the runner understands, file reporters first.
pub fn known_reporters() -> &'static [Reporter] {
    REPORTERS
}

/// Resolves a comma-separated reporter list, silently dropping unknown names.
/// 解析以逗号分隔的报告器列表，静默丢弃未知名称。
pub fn resolve_reporters(list: &str) -> Vec<Reporter> {
    list.split(',').filter_map(Reporter::lookup).collect()
}
