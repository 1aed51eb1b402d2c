//! # Coverage Model Module / 覆盖率模型模块
//!
//! The istanbul `coverage-final.json` schema and the summary metrics derived
//! from it (statements, branches, functions, lines).
//!
//! istanbul `coverage-final.json` 的数据结构，以及由其派生的摘要指标
//! （语句、分支、函数、行）。

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::ops::AddAssign;

/// A coverage map keyed by file path.
/// 以文件路径为键的覆盖率映射。
pub type CoverageMap = BTreeMap<String, FileCoverage>;

/// A 1-based line, 0-based column position.
/// Istanbul writes `{}` for locations without a source position, such as the
/// implicit `else` of an `if`.
///
/// 行号从 1 开始、列号从 0 开始的位置。对于没有源码位置的位置（例如 `if` 的隐式 `else`），
/// istanbul 会写入 `{}`。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self {
            line: Some(line),
            column: Some(column),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMapping {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<Range>,
    pub loc: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<Range>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub locations: Vec<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Coverage for a single file.
/// Fields this crate does not interpret (`hash`, `l`, `_coverageSchema`, ...)
/// are kept in `extra` and written back unchanged.
///
/// 单个文件的覆盖率。本 crate 不解释的字段保存在 `extra` 中，并原样写回。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub path: String,
    pub statement_map: BTreeMap<u32, Range>,
    pub fn_map: BTreeMap<u32, FunctionMapping>,
    pub branch_map: BTreeMap<u32, BranchMapping>,
    pub s: BTreeMap<u32, u64>,
    pub f: BTreeMap<u32, u64>,
    pub b: BTreeMap<u32, Vec<u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_source_map: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Keys read into the typed fields of [`FileCoverage`].
const KNOWN_FIELDS: &[&str] = &[
    "path",
    "statementMap",
    "fnMap",
    "branchMap",
    "s",
    "f",
    "b",
    "inputSourceMap",
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KnownFields {
    #[serde(default)]
    path: String,
    #[serde(default)]
    statement_map: BTreeMap<u32, Range>,
    #[serde(default)]
    fn_map: BTreeMap<u32, FunctionMapping>,
    #[serde(default)]
    branch_map: BTreeMap<u32, BranchMapping>,
    #[serde(default)]
    s: BTreeMap<u32, u64>,
    #[serde(default)]
    f: BTreeMap<u32, u64>,
    #[serde(default)]
    b: BTreeMap<u32, Vec<u64>>,
    #[serde(default)]
    input_source_map: Option<Value>,
}

// `#[serde(flatten)]` cannot read the integer-keyed maps, so the known keys
// are split off and read on their own.
impl<'de> Deserialize<'de> for FileCoverage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        let (known, extra): (Map<String, Value>, Map<String, Value>) = object
            .into_iter()
            .partition(|(key, _)| KNOWN_FIELDS.contains(&key.as_str()));
        let fields: KnownFields =
            serde_json::from_value(Value::Object(known)).map_err(de::Error::custom)?;

        Ok(Self {
            path: fields.path,
            statement_map: fields.statement_map,
            fn_map: fields.fn_map,
            branch_map: fields.branch_map,
            s: fields.s,
            f: fields.f,
            b: fields.b,
            input_source_map: fields.input_source_map,
            extra,
        })
    }
}

/// Covered versus total items for one metric.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub total: usize,
    pub covered: usize,
}

impl Totals {
    fn count<I: IntoIterator<Item = u64>>(hits: I) -> Self {
        hits.into_iter().fold(Totals::default(), |mut totals, hit| {
            totals.total += 1;
            if hit > 0 {
                totals.covered += 1;
            }
            totals
        })
    }

    /// Percentage covered; an empty metric counts as fully covered.
    /// 覆盖百分比；空指标视为完全覆盖。
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.covered as f64 * 100.0 / self.total as f64
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, other: Self) {
        self.total += other.total;
        self.covered += other.covered;
    }
}

/// Summary of all four metrics for a file or a whole map.
/// 文件或整个映射的四项指标摘要。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub statements: Totals,
    pub branches: Totals,
    pub functions: Totals,
    pub lines: Totals,
}

impl AddAssign for CoverageSummary {
    fn add_assign(&mut self, other: Self) {
        self.statements += other.statements;
        self.branches += other.branches;
        self.functions += other.functions;
        self.lines += other.lines;
    }
}

impl FileCoverage {
    /// Creates empty coverage for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Hits per line: the highest count among statements starting on it.
    /// Statements without a start line are skipped.
    ///
    /// 每行的命中次数：以该行开始的语句中的最大计数。没有起始行的语句会被跳过。
    pub fn line_hits(&self) -> BTreeMap<u32, u64> {
        let mut lines = BTreeMap::new();
        for (id, range) in &self.statement_map {
            let Some(line) = range.start.line else {
                continue;
            };
            let hits = self.s.get(id).copied().unwrap_or(0);
            lines
                .entry(line)
                .and_modify(|current: &mut u64| *current = (*current).max(hits))
                .or_insert(hits);
        }
        lines
    }

    /// Lines with at least one statement and no hits, ascending.
    pub fn uncovered_lines(&self) -> Vec<u32> {
        self.line_hits()
            .into_iter()
            .filter(|(_, hits)| *hits == 0)
            .map(|(line, _)| line)
            .collect()
    }

    pub fn summary(&self) -> CoverageSummary {
        CoverageSummary {
            statements: Totals::count(
                self.statement_map
                    .keys()
                    .map(|id| self.s.get(id).copied().unwrap_or(0)),
            ),
            branches: Totals::count(self.branch_map.iter().flat_map(|(id, branch)| {
                let hits = self.b.get(id);
                (0..branch.locations.len())
                    .map(move |i| hits.and_then(|h| h.get(i)).copied().unwrap_or(0))
            })),
            functions: Totals::count(
                self.fn_map
                    .keys()
                    .map(|id| self.f.get(id).copied().unwrap_or(0)),
            ),
            lines: Totals::count(self.line_hits().into_values()),
        }
    }

    /// Folds `other` into this file. Identical statements, functions and
    /// branches have their hits summed; the rest are appended with new ids.
    ///
    /// 将 `other` 合并到此文件中。相同的语句、函数和分支会将命中次数相加；
    /// 其余的以新 id 追加。
    pub fn merge(&mut self, other: FileCoverage) {
        let path = std::mem::take(&mut self.path);
        let mut extra = std::mem::take(&mut self.extra);
        // Per-line counts no longer match the summed hits.
        extra.remove("l");

        let mut builder = CoverageBuilder::default();
        builder.absorb(std::mem::take(self));
        builder.absorb(other);

        *self = builder.finish(path);
        self.extra = extra;
    }
}

/// Accumulates coverage for one file, summing hits of identical locations.
/// 为单个文件累积覆盖率，相同位置的命中次数会相加。
#[derive(Debug, Default)]
pub struct CoverageBuilder {
    statements: Vec<(Range, u64)>,
    statement_index: HashMap<Range, usize>,
    functions: Vec<(FunctionMapping, u64)>,
    function_index: HashMap<(String, Range), usize>,
    branches: Vec<(BranchMapping, Vec<u64>)>,
    branch_index: HashMap<Vec<Range>, usize>,
}

impl CoverageBuilder {
    pub fn add_statement(&mut self, range: Range, hits: u64) {
        match self.statement_index.get(&range) {
            Some(&index) => self.statements[index].1 += hits,
            None => {
                self.statement_index.insert(range, self.statements.len());
                self.statements.push((range, hits));
            }
        }
    }

    pub fn add_function(&mut self, mapping: FunctionMapping, hits: u64) {
        let key = (mapping.name.clone(), mapping.loc);
        match self.function_index.get(&key) {
            Some(&index) => self.functions[index].1 += hits,
            None => {
                self.function_index.insert(key, self.functions.len());
                self.functions.push((mapping, hits));
            }
        }
    }

    pub fn add_branch(&mut self, mapping: BranchMapping, hits: Vec<u64>) {
        match self.branch_index.get(&mapping.locations) {
            Some(&index) => {
                let counts = &mut self.branches[index].1;
                for (count, hit) in counts.iter_mut().zip(hits) {
                    *count += hit;
                }
            }
            None => {
                self.branch_index
                    .insert(mapping.locations.clone(), self.branches.len());
                let mut hits = hits;
                hits.resize(mapping.locations.len(), 0);
                self.branches.push((mapping, hits));
            }
        }
    }

    /// Adds every entry of an already collected file.
    pub fn absorb(&mut self, file: FileCoverage) {
        for (id, range) in file.statement_map {
            self.add_statement(range, file.s.get(&id).copied().unwrap_or(0));
        }
        for (id, function) in file.fn_map {
            self.add_function(function, file.f.get(&id).copied().unwrap_or(0));
        }
        for (id, branch) in file.branch_map {
            let hits = file.b.get(&id).cloned().unwrap_or_default();
            self.add_branch(branch, hits);
        }
    }

    pub fn finish(self, path: String) -> FileCoverage {
        let mut file = FileCoverage::new(path);
        for (id, (range, hits)) in (0u32..).zip(self.statements) {
            file.statement_map.insert(id, range);
            file.s.insert(id, hits);
        }
        for (id, (mapping, hits)) in (0u32..).zip(self.functions) {
            file.fn_map.insert(id, mapping);
            file.f.insert(id, hits);
        }
        for (id, (mapping, hits)) in (0u32..).zip(self.branches) {
            file.branch_map.insert(id, mapping);
            file.b.insert(id, hits);
        }
        file
    }
}

/// Inserts `file` under `key`, merging with coverage already stored there.
/// 将 `file` 插入到 `key` 下，并与已存储的覆盖率合并。
pub fn insert_or_merge(map: &mut CoverageMap, key: String, file: FileCoverage) {
    match map.entry(key) {
        std::collections::btree_map::Entry::Occupied(mut entry) => entry.get_mut().merge(file),
        std::collections::btree_map::Entry::Vacant(entry) => {
            entry.insert(file);
        }
    }
}

/// Sums the summaries of every file in `map`.
pub fn total_summary(map: &CoverageMap) -> CoverageSummary {
    map.values().fold(CoverageSummary::default(), |mut total, file| {
        total += file.summary();
        total
    })
}

/// Formats a percentage the way istanbul prints it: up to two decimals,
/// trailing zeros removed.
///
/// 以 istanbul 的方式格式化百分比：最多两位小数，去掉末尾的零。
pub fn format_pct(pct: f64) -> String {
    let formatted = format!("{pct:.2}");
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}
