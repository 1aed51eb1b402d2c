//! # Externals Module / 外部依赖模块
//!
//! Describes scripts that are side-loaded into the test environment before
//! the suites run, for dependencies that are not part of the main bundle.
//!
//! 描述在测试套件运行之前旁加载到测试环境中的脚本，
//! 用于不属于主包的依赖。

use serde::{Deserialize, Serialize};

/// Directory the build places externals under, relative to the project.
const EXTERNALS_ROOT: &str = "output/test/unit";

fn default_output_path() -> String {
    "externals".to_string()
}

/// The externals descriptor handed to the custom module loader.
/// 传递给自定义模块加载器的外部依赖描述。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Externals {
    /// Sub-directory of `output/test/unit` holding the copied externals.
    /// `output/test/unit` 下存放已复制外部依赖的子目录。
    #[serde(default = "default_output_path", alias = "output_path")]
    pub output_path: String,

    /// Ordered dependency entries / 有序的依赖条目
    #[serde(default)]
    pub dependencies: Vec<ExternalDependency>,
}

impl Default for Externals {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            dependencies: vec![],
        }
    }
}

/// One entry of the externals descriptor.
/// Bare strings name a dependency that is copied but never injected.
///
/// 外部依赖描述中的一个条目。
/// 纯字符串表示只复制而不注入的依赖。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ExternalDependency {
    Name(String),
    Module {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inject: Option<Inject>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
}

/// What to inject from a dependency.
/// 从依赖中注入的内容。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Inject {
    /// `true` injects the dependency path itself.
    Flag(bool),
    /// A single file relative to the dependency directory.
    Path(String),
    /// Several files relative to the dependency directory.
    Paths(Vec<String>),
}

impl ExternalDependency {
    /// Paths this entry asks the loader to inject, relative to `prefix`.
    /// An entry contributes only if both `inject` and `from` are present.
    ///
    /// 此条目要求加载器注入的路径（相对于 `prefix`）。
    /// 仅当 `inject` 和 `from` 同时存在时，条目才会贡献路径。
    fn inject_paths(&self, prefix: &str) -> Vec<String> {
        let ExternalDependency::Module { inject, from, to } = self else {
            return vec![];
        };
        let (Some(inject), Some(from)) = (inject, from) else {
            return vec![];
        };

        let base = to.as_deref().unwrap_or(from);
        let base_dir = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };

        match inject {
            Inject::Flag(false) => vec![],
            Inject::Flag(true) => vec![format!("{prefix}{base}")],
            Inject::Path(path) if path.is_empty() => vec![],
            Inject::Path(path) => vec![format!("{prefix}{base_dir}{path}")],
            Inject::Paths(paths) => paths
                .iter()
                .map(|path| format!("{prefix}{base_dir}{path}"))
                .collect(),
        }
    }
}

impl Externals {
    /// All paths the loader will inject, in declaration order.
    /// 加载器将注入的所有路径，按声明顺序排列。
    pub fn inject_paths(&self) -> Vec<String> {
        let prefix = format!("{EXTERNALS_ROOT}/{}/", self.output_path);
        self.dependencies
            .iter()
            .flat_map(|dependency| dependency.inject_paths(&prefix))
            .collect()
    }
}
