//! Chart tree resolution
//!
//! A [`ChartResolver`] is a session: it owns the chart tool handle and
//! every temporary workspace created while resolving. Chart nodes for
//! archive and remote sources point into those workspaces, so the resolver
//! must outlive any use of the returned tree (packaging included).
//! Workspaces are removed when the resolver is dropped.

use std::path::{Path, PathBuf};

use helmpack_client::{ChartTool, DEFAULT_RELEASE_NAME};
use helmpack_core::{ChartNode, LoadedChart, extract_archive, single_top_level_dir};
use tempfile::TempDir;

use crate::aggregate::{aggregate_node, merge_with_dependencies};
use crate::error::{DiscoveryError, Result};
use crate::scan::{ScanReport, scan_chart};
use crate::source::ChartSource;

/// Resolution settings
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Release name passed to the render call
    pub release_name: String,
    /// Refresh `charts/` before scanning charts that declare dependencies
    pub update_dependencies: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            release_name: DEFAULT_RELEASE_NAME.to_string(),
            update_dependencies: true,
        }
    }
}

/// Resolves a chart source into a [`ChartNode`] tree
pub struct ChartResolver<T: ChartTool> {
    tool: T,
    options: ResolverOptions,
    workspaces: Vec<TempDir>,
    reports: Vec<(String, ScanReport)>,
}

impl<T: ChartTool> ChartResolver<T> {
    pub fn new(tool: T) -> Self {
        Self::with_options(tool, ResolverOptions::default())
    }

    pub fn with_options(tool: T, options: ResolverOptions) -> Self {
        Self {
            tool,
            options,
            workspaces: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// The chart tool this session uses
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Scan reports for every chart resolved so far, as `(name, report)`
    pub fn reports(&self) -> &[(String, ScanReport)] {
        &self.reports
    }

    /// Temporary directories currently owned by the session
    pub fn workspace_paths(&self) -> Vec<PathBuf> {
        self.workspaces
            .iter()
            .map(|w| w.path().to_path_buf())
            .collect()
    }

    /// Resolve a chart source with its whole dependency tree
    pub fn resolve(&mut self, source: &str) -> Result<ChartNode> {
        let source = ChartSource::parse(source)?;
        tracing::info!("Analyzing chart {}", source);

        let root = self.locate(&source)?;
        self.resolve_dir(&root)
    }

    fn locate(&mut self, source: &ChartSource) -> Result<PathBuf> {
        match source {
            ChartSource::Directory(dir) => Ok(dir.clone()),
            ChartSource::Archive(archive) => self.unpack(archive),
            ChartSource::Remote(url) => {
                let dest = self.workspace()?;
                self.tool
                    .fetch(url, &dest)
                    .map_err(|e| DiscoveryError::FetchFailed {
                        source_path: url.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(single_top_level_dir(&dest)?)
            }
        }
    }

    fn unpack(&mut self, archive: &Path) -> Result<PathBuf> {
        let dest = self.workspace()?;
        extract_archive(archive, &dest)?;
        Ok(single_top_level_dir(&dest)?)
    }

    fn resolve_dir(&mut self, dir: &Path) -> Result<ChartNode> {
        let chart = LoadedChart::load(dir)?;
        let name = chart.metadata.name.clone();

        if chart.declares_dependencies() {
            tracing::info!(
                chart = %name,
                "Found {} declared dependencies",
                chart.metadata.dependencies.len()
            );
            if self.options.update_dependencies {
                if let Err(e) = self.tool.update_dependencies(&chart.root) {
                    tracing::warn!(chart = %name, "failed to update dependencies: {}", e);
                }
            }
        }

        let mut dependencies = Vec::new();
        for archive in chart.dependency_archives()? {
            match self.resolve_dependency(&archive) {
                Ok(node) => {
                    tracing::info!("  Dependency: {} v{}", node.name, node.version);
                    dependencies.push(node);
                }
                Err(e) => {
                    tracing::warn!(
                        chart = %name,
                        archive = %archive.display(),
                        "failed to analyze dependency: {}",
                        e
                    );
                }
            }
        }

        tracing::info!(chart = %name, "Discovering images");
        let (outputs, report) = scan_chart(&chart, &self.tool, &self.options.release_name);
        let own = aggregate_node(&outputs);
        tracing::info!(chart = %name, "Found {} unique images", own.len());
        self.reports.push((name.clone(), report));

        let images = merge_with_dependencies(own, &dependencies);

        Ok(ChartNode {
            name,
            version: chart.metadata.version.clone(),
            path: chart.root.clone(),
            dependencies,
            images,
        })
    }

    fn resolve_dependency(&mut self, archive: &Path) -> Result<ChartNode> {
        let dir = self.unpack(archive)?;
        self.resolve_dir(&dir)
    }

    fn workspace(&mut self) -> Result<PathBuf> {
        let dir = tempfile::Builder::new().prefix("helmpack-").tempdir()?;
        let path = dir.path().to_path_buf();
        self.workspaces.push(dir);
        Ok(path)
    }
}
