//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as resolving relative paths and reading project metadata.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如解析相对路径和读取项目元数据。

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// The subset of `package.json` the runner cares about.
#[derive(Deserialize)]
struct PackageManifest {
    name: Option<String>,
}

/// Reads the project name from `package.json`, falling back to the name of
/// the project directory.
///
/// 从 `package.json` 中读取项目名称，失败时回退为项目目录名。
pub fn read_project_name(project_dir: &Path) -> String {
    fs::read_to_string(project_dir.join("package.json"))
        .ok()
        .and_then(|content| serde_json::from_str::<PackageManifest>(&content).ok())
        .and_then(|manifest| manifest.name)
        .unwrap_or_else(|| {
            absolute_path(project_dir)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        })
}

/// Expands `~` and environment variables in a configured path.
/// 展开配置路径中的 `~` 和环境变量。
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .with_context(|| format!("Failed to expand path: {raw}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Gets the absolute, lexically normalized form of a path without touching
/// the file system.
///
/// 获取路径的绝对且经过词法规范化的形式，不访问文件系统。
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Computes the path of `target` relative to `base`, both resolved against
/// the current directory first. Separators are always `/` so the result can
/// be embedded in runner arguments.
///
/// 计算 `target` 相对于 `base` 的路径，两者都先相对当前目录解析。
/// 分隔符始终为 `/`，以便结果可以嵌入运行器参数中。
pub fn relative_path(base: &Path, target: &Path) -> String {
    let base = absolute_path(base);
    let target = absolute_path(target);

    let base_parts: Vec<_> = base.components().collect();
    let target_parts: Vec<_> = target.components().collect();
    let shared = base_parts
        .iter()
        .zip(&target_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); base_parts.len() - shared];
    parts.extend(
        target_parts[shared..]
            .iter()
            .map(|part| part.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

/// Creates each directory (and its parents) under `root`.
/// 在 `root` 下创建每个目录（及其父目录）。
pub fn ensure_directories(root: &Path, directories: &[PathBuf]) -> Result<()> {
    for directory in directories {
        let path = root.join(directory);
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}
