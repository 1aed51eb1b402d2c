//! # Source Map Module / 源映射模块
//!
//! Moves coverage recorded against a compiled bundle back onto the original
//! sources named by the bundle's source map. Statements, functions and
//! branches are looked up one location at a time; locations whose start and
//! end land in different sources are dropped, and identical locations coming
//! from different parts of the bundle have their hits summed.
//!
//! 将针对编译后包记录的覆盖率，按照包的源映射移回到原始源文件上。
//! 语句、函数和分支逐个位置查找；起止位置落在不同源文件的位置会被丢弃，
//! 来自包中不同部分的相同位置会将命中次数相加。

use sourcemap::{DecodedMap, SourceMap};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::coverage::{
    BranchMapping, CoverageBuilder, CoverageMap, FileCoverage, FunctionMapping, Position, Range,
    insert_or_merge,
};

const SOURCE_MAPPING_URL: &str = "sourceMappingURL=";

/// A problem noticed while applying source maps.
/// 应用源映射时发现的问题。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapWarning {
    /// The file has no source map; its coverage is kept as recorded.
    /// 文件没有源映射；其覆盖率按记录保留。
    MissingSourceMap(String),
    /// A source map was found but could not be used.
    /// 找到了源映射但无法使用。
    InvalidSourceMap { path: String, reason: String },
}

impl RemapWarning {
    /// Warnings that are expected in normal runs and only worth a debug line.
    pub fn is_benign(&self) -> bool {
        matches!(self, RemapWarning::MissingSourceMap(_))
    }
}

impl std::fmt::Display for RemapWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemapWarning::MissingSourceMap(path) => {
                write!(f, "Could not find source map for: \"{path}\"")
            }
            RemapWarning::InvalidSourceMap { path, reason } => {
                write!(f, "Invalid source map for \"{path}\": {reason}")
            }
        }
    }
}

/// The result of applying source maps to a raw coverage map.
#[derive(Debug, Default)]
pub struct Remapped {
    /// Coverage keyed by original source name / 以原始源名称为键的覆盖率
    pub coverage: CoverageMap,
    /// Original source text from `sourcesContent`, keyed like `coverage`.
    /// 来自 `sourcesContent` 的原始源文本，键与 `coverage` 相同。
    pub sources: BTreeMap<String, String>,
    pub warnings: Vec<RemapWarning>,
}

/// Applies the source map of every file in `raw`. Relative file paths are
/// resolved against `base_dir`.
///
/// 对 `raw` 中的每个文件应用其源映射。相对文件路径基于 `base_dir` 解析。
pub fn apply_source_maps(raw: CoverageMap, base_dir: &Path) -> Remapped {
    let mut remapped = Remapped::default();
    let mut builders: BTreeMap<String, CoverageBuilder> = BTreeMap::new();

    for (key, file) in raw {
        let path = if file.path.is_empty() { key.clone() } else { file.path.clone() };

        let source_map = match locate_source_map(&file, &path, base_dir) {
            Ok(Some(map)) => map,
            Ok(None) => {
                remapped.warnings.push(RemapWarning::MissingSourceMap(path));
                remapped.coverage.insert(key, file);
                continue;
            }
            Err(reason) => {
                remapped
                    .warnings
                    .push(RemapWarning::InvalidSourceMap { path, reason });
                remapped.coverage.insert(key, file);
                continue;
            }
        };

        remap_file(&file, &source_map, &mut builders, &mut remapped.sources);
    }

    // A mapped source may share its name with a file that had no source map.
    for (source, builder) in builders {
        let file = builder.finish(source.clone());
        insert_or_merge(&mut remapped.coverage, source, file);
    }
    remapped
}

fn locate_source_map(
    file: &FileCoverage,
    path: &str,
    base_dir: &Path,
) -> Result<Option<SourceMap>, String> {
    if let Some(inline) = &file.input_source_map {
        let bytes = serde_json::to_vec(inline).map_err(|e| e.to_string())?;
        return SourceMap::from_slice(&bytes)
            .map(Some)
            .map_err(|e| e.to_string());
    }

    let file_path = base_dir.join(path);
    let Ok(content) = fs::read_to_string(&file_path) else {
        return Ok(None);
    };
    let Some(url) = content
        .lines()
        .rev()
        .find_map(|line| line.split_once(SOURCE_MAPPING_URL).map(|(_, url)| url.trim()))
    else {
        return Ok(None);
    };

    if url.starts_with("data:") {
        return match sourcemap::decode_data_url(url).map_err(|e| e.to_string())? {
            DecodedMap::Regular(map) => Ok(Some(map)),
            _ => Err("only regular source maps are supported".to_string()),
        };
    }

    let map_path: PathBuf = file_path
        .parent()
        .map(|dir| dir.join(url))
        .unwrap_or_else(|| PathBuf::from(url));
    let Ok(bytes) = fs::read(&map_path) else {
        return Ok(None);
    };
    SourceMap::from_slice(&bytes)
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Maps a generated range to `(source, original range)`, or `None` when
/// either end is unmapped or the ends fall in different sources.
fn map_range(map: &SourceMap, range: &Range) -> Option<(String, Range, u32)> {
    let (start_source, start, src_id) = map_position(map, &range.start)?;
    let (end_source, end, _) = map_position(map, &range.end)?;
    (start_source == end_source).then(|| (start_source, Range { start, end }, src_id))
}

fn map_position(map: &SourceMap, position: &Position) -> Option<(String, Position, u32)> {
    let line = position.line?.checked_sub(1)?;
    let token = map.lookup_token(line, position.column.unwrap_or(0))?;
    let source = token.get_source()?;
    Some((
        source.to_string(),
        Position::new(token.get_src_line() + 1, token.get_src_col()),
        token.get_src_id(),
    ))
}

fn remap_file(
    file: &FileCoverage,
    map: &SourceMap,
    builders: &mut BTreeMap<String, CoverageBuilder>,
    sources: &mut BTreeMap<String, String>,
) {
    let mut remember = |source: &str, src_id: u32| {
        if !sources.contains_key(source) {
            if let Some(content) = map.get_source_contents(src_id) {
                sources.insert(source.to_string(), content.to_string());
            }
        }
    };

    for (id, range) in &file.statement_map {
        if let Some((source, mapped, src_id)) = map_range(map, range) {
            remember(&source, src_id);
            let hits = file.s.get(id).copied().unwrap_or(0);
            builders.entry(source).or_default().add_statement(mapped, hits);
        }
    }

    for (id, function) in &file.fn_map {
        if let Some((source, loc, src_id)) = map_range(map, &function.loc) {
            remember(&source, src_id);
            let decl = function
                .decl
                .as_ref()
                .and_then(|decl| map_range(map, decl))
                .filter(|(decl_source, ..)| *decl_source == source)
                .map(|(_, decl, _)| decl);
            let mapping = FunctionMapping {
                name: function.name.clone(),
                decl,
                line: loc.start.line,
                loc,
            };
            let hits = file.f.get(id).copied().unwrap_or(0);
            builders.entry(source).or_default().add_function(mapping, hits);
        }
    }

    for (id, branch) in &file.branch_map {
        let Some((source, locations, src_id)) = map_branch(map, branch) else {
            continue;
        };
        remember(&source, src_id);
        let mapping = BranchMapping {
            loc: branch
                .loc
                .as_ref()
                .and_then(|loc| map_range(map, loc))
                .filter(|(loc_source, ..)| *loc_source == source)
                .map(|(_, loc, _)| loc),
            kind: branch.kind.clone(),
            line: locations.iter().find_map(|loc| loc.start.line),
            locations,
        };
        let hits = file.b.get(id).cloned().unwrap_or_default();
        builders.entry(source).or_default().add_branch(mapping, hits);
    }
}

/// Every positioned location of a branch must map into the same source.
/// Locations without a position (an implicit `else`) stay empty.
fn map_branch(map: &SourceMap, branch: &BranchMapping) -> Option<(String, Vec<Range>, u32)> {
    let mut source: Option<(String, u32)> = None;
    let mut locations = Vec::with_capacity(branch.locations.len());
    for location in &branch.locations {
        if location.start.line.is_none() {
            locations.push(Range::default());
            continue;
        }
        let (location_source, mapped, src_id) = map_range(map, location)?;
        match &source {
            Some((existing, _)) if *existing != location_source => return None,
            Some(_) => {}
            None => source = Some((location_source, src_id)),
        }
        locations.push(mapped);
    }
    source.map(|(source, src_id)| (source, locations, src_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn range(start: (u32, u32), end: (u32, u32)) -> Range {
        Range {
            start: Position::new(start.0, start.1),
            end: Position::new(end.0, end.1),
        }
    }

    /// A bundle whose generated line 1 maps to `src/a.js` line 1 and whose
    /// generated line 2 maps to `src/b.js` line 5.
    fn bundle_map() -> serde_json::Value {
        json!({
            "version": 3,
            "file": "bundle.js",
            "sources": ["webpack:///src/a.js", "webpack:///src/b.js"],
            "sourcesContent": ["let a = 1;\n", null],
            "names": [],
            "mappings": "AAAA;ACIA"
        })
    }

    fn bundle_coverage() -> FileCoverage {
        let mut file = FileCoverage::new("bundle.js");
        file.statement_map.insert(0, range((1, 0), (1, 5)));
        file.statement_map.insert(1, range((2, 0), (2, 5)));
        file.statement_map.insert(2, range((1, 0), (1, 5)));
        file.s.insert(0, 1);
        file.s.insert(1, 0);
        file.s.insert(2, 2);
        file.input_source_map = Some(bundle_map());
        file
    }

    #[test]
    fn statements_move_to_their_original_sources() {
        let mut raw = CoverageMap::new();
        raw.insert("bundle.js".to_string(), bundle_coverage());

        let remapped = apply_source_maps(raw, Path::new("."));
        assert!(remapped.warnings.is_empty());

        let a = &remapped.coverage["webpack:///src/a.js"];
        assert_eq!(a.statement_map.len(), 1);
        assert_eq!(a.s[&0], 3);
        assert_eq!(a.statement_map[&0].start.line, Some(1));

        let b = &remapped.coverage["webpack:///src/b.js"];
        assert_eq!(b.statement_map[&0].start.line, Some(5));
        assert_eq!(b.s[&0], 0);

        assert!(!remapped.coverage.contains_key("bundle.js"));
        assert_eq!(
            remapped.sources.get("webpack:///src/a.js").map(String::as_str),
            Some("let a = 1;\n")
        );
    }

    #[test]
    fn files_without_a_source_map_pass_through_with_a_benign_warning() {
        let mut raw = CoverageMap::new();
        raw.insert("lib/plain.js".to_string(), FileCoverage::new("lib/plain.js"));

        let dir = tempfile::tempdir().unwrap();
        let remapped = apply_source_maps(raw, dir.path());

        assert!(remapped.coverage.contains_key("lib/plain.js"));
        assert_eq!(remapped.warnings.len(), 1);
        assert!(remapped.warnings[0].is_benign());
    }

    #[test]
    fn source_mapping_url_comments_are_followed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("bundle.js"),
            "a();\nb();\n//# sourceMappingURL=bundle.js.map\n",
        )
        .unwrap();
        fs::write(dir.path().join("bundle.js.map"), bundle_map().to_string()).unwrap();

        let mut file = bundle_coverage();
        file.input_source_map = None;
        let mut raw = CoverageMap::new();
        raw.insert("bundle.js".to_string(), file);

        let remapped = apply_source_maps(raw, dir.path());
        assert!(remapped.warnings.is_empty());
        assert!(remapped.coverage.contains_key("webpack:///src/b.js"));
    }

    #[test]
    fn broken_inline_maps_are_reported_as_real_warnings() {
        let mut file = bundle_coverage();
        file.input_source_map = Some(json!({ "version": 3, "mappings": 42 }));
        let mut raw = CoverageMap::new();
        raw.insert("bundle.js".to_string(), file);

        let remapped = apply_source_maps(raw, Path::new("."));
        assert_eq!(remapped.warnings.len(), 1);
        assert!(!remapped.warnings[0].is_benign());
        assert!(remapped.coverage.contains_key("bundle.js"));
    }

    #[test]
    fn implicit_else_locations_survive_remapping() {
        let mut file = bundle_coverage();
        file.branch_map.insert(
            0,
            BranchMapping {
                loc: None,
                kind: "if".to_string(),
                locations: vec![range((2, 0), (2, 5)), Range::default()],
                line: None,
            },
        );
        file.b.insert(0, vec![3, 1]);
        let mut raw = CoverageMap::new();
        raw.insert("bundle.js".to_string(), file);

        let remapped = apply_source_maps(raw, Path::new("."));
        let b = &remapped.coverage["webpack:///src/b.js"];
        assert_eq!(b.branch_map[&0].locations[1], Range::default());
        assert_eq!(b.branch_map[&0].line, Some(5));
        assert_eq!(b.b[&0], vec![3, 1]);
    }

    #[test]
    fn mapped_sources_merge_with_pass_through_files_of_the_same_name() {
        let dir = tempfile::tempdir().unwrap();
        let mut plain = FileCoverage::new("webpack:///src/a.js");
        plain.statement_map.insert(0, range((1, 0), (1, 0)));
        plain.s.insert(0, 4);

        let mut raw = CoverageMap::new();
        raw.insert("bundle.js".to_string(), bundle_coverage());
        raw.insert("webpack:///src/a.js".to_string(), plain);

        let remapped = apply_source_maps(raw, dir.path());
        let a = &remapped.coverage["webpack:///src/a.js"];
        assert_eq!(a.statement_map.len(), 1);
        assert_eq!(a.s[&0], 7);
    }
}
