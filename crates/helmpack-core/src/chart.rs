//! Chart metadata, local chart directories and resolved chart trees

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::reference::{ImageReference, dedup_last_wins};

/// Name used when `Chart.yaml` does not declare one
pub const UNKNOWN_NAME: &str = "unknown";

/// Version used when `Chart.yaml` does not declare one
pub const UNKNOWN_VERSION: &str = "0.0.0";

/// Values files read for discovery and relocation, in order
pub const VALUES_FILES: [&str; 2] = ["values.yaml", "values.yml"];

/// The parts of `Chart.yaml` helmpack cares about
#[derive(Debug, Clone, PartialEq)]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    pub app_version: Option<String>,
    /// Raw annotations; values may be strings or structured data
    pub annotations: serde_yaml::Value,
    pub dependencies: Vec<ChartDependency>,
}

/// A dependency declared in `Chart.yaml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDependency {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChart {
    #[serde(default)]
    name: Option<serde_yaml::Value>,
    #[serde(default)]
    version: Option<serde_yaml::Value>,
    #[serde(default)]
    app_version: Option<serde_yaml::Value>,
    #[serde(default)]
    annotations: serde_yaml::Value,
    #[serde(default)]
    dependencies: Option<Vec<serde_yaml::Value>>,
}

impl ChartMetadata {
    /// Parse `Chart.yaml` content
    ///
    /// Missing name and version fall back to `unknown` and `0.0.0`.
    /// Numeric versions such as `1.0` are accepted as text. Dependency
    /// entries without a name are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        let raw: RawChart = if value.is_null() {
            RawChart::default()
        } else {
            serde_yaml::from_value(value)?
        };

        Ok(Self {
            name: raw
                .name
                .as_ref()
                .and_then(scalar_text)
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            version: raw
                .version
                .as_ref()
                .and_then(scalar_text)
                .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
            app_version: raw.app_version.as_ref().and_then(scalar_text),
            annotations: raw.annotations,
            dependencies: raw
                .dependencies
                .unwrap_or_default()
                .iter()
                .filter_map(ChartDependency::from_value)
                .collect(),
        })
    }

    /// Look up an annotation by key
    pub fn annotation(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.annotations.as_mapping()?.get(key)
    }
}

impl ChartDependency {
    fn from_value(value: &serde_yaml::Value) -> Option<Self> {
        let field = |key: &str| value.get(key).and_then(scalar_text);

        let Some(name) = field("name") else {
            tracing::warn!("skipping dependency without a name: {:?}", value);
            return None;
        };

        Some(Self {
            name,
            version: field("version"),
            repository: field("repository"),
            condition: field("condition"),
            alias: field("alias"),
        })
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A chart directory on disk
#[derive(Debug, Clone)]
pub struct LoadedChart {
    /// Parsed `Chart.yaml`
    pub metadata: ChartMetadata,

    /// Root directory of the chart
    pub root: PathBuf,

    /// Templates directory (may not exist)
    pub templates_dir: PathBuf,

    /// Dependency archives directory (may not exist)
    pub charts_dir: PathBuf,
}

impl LoadedChart {
    /// Load a chart from a directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let root = path.as_ref().to_path_buf();

        if !root.is_dir() {
            return Err(CoreError::ChartNotFound {
                path: root.display().to_string(),
            });
        }

        let chart_file = root.join("Chart.yaml");
        if !chart_file.exists() {
            return Err(CoreError::InvalidChart {
                message: format!("Chart.yaml not found in {}", root.display()),
            });
        }

        let content = std::fs::read_to_string(&chart_file)?;
        let metadata = ChartMetadata::parse(&content).map_err(|e| CoreError::InvalidChart {
            message: format!("{}: {}", chart_file.display(), e),
        })?;

        Ok(Self {
            metadata,
            templates_dir: root.join("templates"),
            charts_dir: root.join("charts"),
            root,
        })
    }

    /// Whether `Chart.yaml` declares dependencies
    pub fn declares_dependencies(&self) -> bool {
        !self.metadata.dependencies.is_empty()
    }

    /// Existing values files, in lookup order
    pub fn values_files(&self) -> Vec<PathBuf> {
        VALUES_FILES
            .iter()
            .map(|name| self.root.join(name))
            .filter(|path| path.is_file())
            .collect()
    }

    /// YAML files under `templates/`, sorted
    pub fn template_files(&self) -> Result<Vec<PathBuf>> {
        yaml_files(&self.templates_dir)
    }

    /// Dependency archives (`charts/*.tgz`), sorted
    pub fn dependency_archives(&self) -> Result<Vec<PathBuf>> {
        let mut archives = Vec::new();

        if !self.charts_dir.is_dir() {
            return Ok(archives);
        }

        for entry in std::fs::read_dir(&self.charts_dir)? {
            let path = entry?.path();
            let is_tgz = path
                .file_name()
                .map(|n| n.to_string_lossy().ends_with(".tgz"))
                .unwrap_or(false);
            if path.is_file() && is_tgz {
                archives.push(path);
            }
        }

        archives.sort();
        Ok(archives)
    }
}

/// `.yaml` and `.yml` files below `dir`, recursively and sorted
///
/// A missing directory yields an empty list.
pub fn yaml_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if !dir.is_dir() {
        return Ok(files);
    }

    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_yaml_file(path) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Whether a path has a `.yaml` or `.yml` extension
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ext == "yaml" || ext == "yml"
        })
        .unwrap_or(false)
}

/// A resolved chart with its dependency tree
///
/// `images` holds the chart's own images followed by every dependency's
/// list, so each node is transitively complete. Duplicates across nodes are
/// kept; only [`ChartNode::flattened_images`] removes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartNode {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    #[serde(default)]
    pub dependencies: Vec<ChartNode>,
    #[serde(default)]
    pub images: Vec<ImageReference>,
}

impl ChartNode {
    /// Images of the whole tree, deduplicated by `full_reference` (last wins)
    pub fn flattened_images(&self) -> Vec<ImageReference> {
        dedup_last_wins(self.images.iter().cloned())
    }

    /// Number of nodes below this one
    pub fn dependency_count(&self) -> usize {
        self.dependencies
            .iter()
            .map(|dep| 1 + dep.dependency_count())
            .sum()
    }

    /// `<name>-<version>`
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }
}
