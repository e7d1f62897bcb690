//! Bundle import into a private registry
//!
//! An [`Importer`] unpacks a bundle, pushes every embedded image under the
//! target project, rewrites the chart so it only references relocated
//! images, then packages and pushes the chart. Steps run strictly in
//! sequence and the unpacked bundle lives in a temporary directory removed
//! when `import` returns.

use std::path::{Path, PathBuf};

use helmpack_client::{ChartTool, ContainerRuntime, RegistryCredentials, registry_host};
use helmpack_core::{
    BundleImage, BundleManifest, CHART_DIR, extract_archive, single_top_level_dir,
};

use crate::error::{BundleError, Result};
use crate::relocate::{RelocationMapping, RelocationReport, relocate_chart};

/// Registry and project the bundle is published to
#[derive(Debug, Clone)]
pub struct ImportTarget {
    /// Registry URL, with or without scheme
    pub registry_url: String,
    pub project: String,
    pub credentials: RegistryCredentials,
}

impl ImportTarget {
    pub fn new(
        registry_url: impl Into<String>,
        project: impl Into<String>,
        credentials: RegistryCredentials,
    ) -> Self {
        Self {
            registry_url: registry_url.into(),
            project: project.into(),
            credentials,
        }
    }

    /// Registry host used in image references
    pub fn host(&self) -> String {
        registry_host(&self.registry_url)
    }

    /// `oci://<host>/<project>`
    pub fn chart_destination(&self) -> String {
        format!("oci://{}/{}", self.host(), self.project)
    }
}

/// What an import did
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub chart_name: String,
    pub chart_version: String,
    /// Whether the runtime login succeeded; images are only pushed after one
    pub logged_in: bool,
    /// Relocated references pushed
    pub images_pushed: Vec<String>,
    /// `(full_reference, reason)` for embedded images that failed
    pub images_failed: Vec<(String, String)>,
    /// Entries without image bytes in the bundle
    pub images_skipped: Vec<String>,
    pub mapping: RelocationMapping,
    pub relocation: RelocationReport,
    pub chart_pushed: bool,
}

/// Publishes bundles into a private registry
pub struct Importer<R: ContainerRuntime, C: ChartTool> {
    runtime: R,
    chart_tool: C,
    target: ImportTarget,
}

impl<R: ContainerRuntime, C: ChartTool> Importer<R, C> {
    pub fn new(runtime: R, chart_tool: C, target: ImportTarget) -> Self {
        Self {
            runtime,
            chart_tool,
            target,
        }
    }

    pub fn target(&self) -> &ImportTarget {
        &self.target
    }

    /// Import a bundle
    ///
    /// Only a malformed bundle aborts. Login, image and chart push failures
    /// are logged and recorded in the report.
    pub fn import(&self, bundle_path: &Path) -> Result<ImportReport> {
        let workspace = tempfile::Builder::new()
            .prefix("helmpack-import-")
            .tempdir()?;

        tracing::info!("Extracting bundle {}", bundle_path.display());
        let unpacked = workspace.path().join("bundle");
        extract_archive(bundle_path, &unpacked)
            .map_err(|e| BundleError::invalid(bundle_path, e.to_string()))?;
        let bundle_dir = single_top_level_dir(&unpacked)
            .map_err(|e| BundleError::invalid(bundle_path, e.to_string()))?;

        let manifest = BundleManifest::load_from(&bundle_dir)
            .map_err(|e| BundleError::invalid(bundle_path, e.to_string()))?;
        let chart_dir = bundle_dir.join(CHART_DIR);
        if !chart_dir.is_dir() {
            return Err(BundleError::invalid(
                bundle_path,
                format!("missing {}/ directory", CHART_DIR),
            ));
        }

        tracing::info!(
            "Importing {} v{} into {}",
            manifest.metadata.name,
            manifest.metadata.version,
            self.target.chart_destination()
        );

        let host = self.target.host();
        let mapping = RelocationMapping::build(
            manifest.images.iter().map(|entry| &entry.image),
            &host,
            &self.target.project,
        );

        let mut report = ImportReport {
            chart_name: manifest.metadata.name.clone(),
            chart_version: manifest.metadata.version.clone(),
            logged_in: false,
            images_pushed: Vec::new(),
            images_failed: Vec::new(),
            images_skipped: Vec::new(),
            mapping: RelocationMapping::default(),
            relocation: RelocationReport::default(),
            chart_pushed: false,
        };

        match self.runtime.login(&host, &self.target.credentials) {
            Ok(()) => report.logged_in = true,
            Err(e) => tracing::warn!("Registry login to {} failed: {}", host, e),
        }

        if report.logged_in {
            self.push_images(&manifest, &bundle_dir, &mapping, &mut report);
        } else {
            tracing::warn!("Skipping image push");
        }

        tracing::info!("Relocating image references in chart");
        report.relocation = relocate_chart(&chart_dir, &mapping);
        report.mapping = mapping;

        report.chart_pushed = self.push_chart(&chart_dir, workspace.path());

        Ok(report)
    }

    fn push_images(
        &self,
        manifest: &BundleManifest,
        bundle_dir: &Path,
        mapping: &RelocationMapping,
        report: &mut ImportReport,
    ) {
        for entry in &manifest.images {
            let reference = &entry.image.full_reference;

            let Some(archive) = entry.archive_path().map(|rel| bundle_dir.join(rel)) else {
                report.images_skipped.push(reference.clone());
                continue;
            };
            if !archive.is_file() {
                tracing::warn!("Image archive for {} missing from bundle", reference);
                report
                    .images_failed
                    .push((reference.clone(), "archive missing from bundle".to_string()));
                continue;
            }
            let Some(target) = mapping.target_for(reference) else {
                continue;
            };

            match self.push_image(entry, &archive, target) {
                Ok(()) => {
                    tracing::info!("  Pushed {}", target);
                    report.images_pushed.push(target.to_string());
                }
                Err(e) => {
                    tracing::warn!("Failed to push {}: {}", reference, e);
                    report.images_failed.push((reference.clone(), e.to_string()));
                }
            }
        }
    }

    fn push_image(
        &self,
        entry: &BundleImage,
        archive: &Path,
        target: &str,
    ) -> helmpack_client::Result<()> {
        let loaded = self.runtime.load(archive)?;
        let handle = loaded
            .iter()
            .find(|h| h.reference.as_deref() == Some(entry.image.full_reference.as_str()))
            .or_else(|| loaded.first())
            .ok_or_else(|| helmpack_client::ClientError::ImageNotFound {
                reference: entry.image.full_reference.clone(),
            })?;

        self.runtime.tag(handle, target)?;
        self.runtime.push(target)?;

        if let Err(e) = self.runtime.remove(handle) {
            tracing::debug!("Could not remove local copy of {}: {}", handle.name(), e);
        }
        Ok(())
    }

    fn push_chart(&self, chart_dir: &Path, workspace: &Path) -> bool {
        let package_dir: PathBuf = workspace.join("package");

        tracing::info!("Packaging relocated chart");
        let archive = match self.chart_tool.package(chart_dir, &package_dir) {
            Ok(archive) => archive,
            Err(e) => {
                tracing::warn!("Failed to package chart: {}", e);
                return false;
            }
        };

        let host = self.target.host();
        if let Err(e) = self.chart_tool.login(&host, &self.target.credentials) {
            tracing::warn!("Chart registry login to {} failed: {}", host, e);
        }

        let destination = self.target.chart_destination();
        match self.chart_tool.push(&archive, &destination) {
            Ok(()) => {
                tracing::info!("Chart pushed to {}", destination);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to push chart to {}: {}", destination, e);
                false
            }
        }
    }
}
