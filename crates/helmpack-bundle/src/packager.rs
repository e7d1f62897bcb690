//! Bundle packaging
//!
//! Layout of a bundle:
//!
//! ```text
//! <name>-<version>/
//!   bundle.yaml
//!   chart/              verbatim copy of the chart tree
//!   images/<sha256>.tar saved images, when embedding
//! ```

use std::path::{Path, PathBuf};

use helmpack_client::ContainerRuntime;
use helmpack_core::{
    BundleImage, BundleManifest, CHART_DIR, ChartNode, IMAGES_DIR, ImageReference,
    bundle_dir_name, bundle_file_name, copy_tree, create_archive,
};

use crate::error::{BundleError, Result};

/// Packaging settings
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Directory the bundle is written to, created if missing
    pub output_dir: PathBuf,
    /// Pull and save every image into the bundle
    pub embed_images: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            embed_images: true,
        }
    }
}

/// Result of a packaging run
#[derive(Debug, Clone)]
pub struct PackOutcome {
    pub bundle_path: PathBuf,
    pub manifest: BundleManifest,
    /// Number of images whose bytes were saved
    pub embedded: usize,
    /// `(full_reference, reason)` of images that could not be embedded
    pub failed: Vec<(String, String)>,
}

/// Builds bundles from resolved chart trees
///
/// Without a runtime, image embedding is skipped and every image is only
/// listed in the manifest.
pub struct Packager<R: ContainerRuntime> {
    runtime: Option<R>,
    options: PackOptions,
}

impl<R: ContainerRuntime> Packager<R> {
    pub fn new(runtime: Option<R>, options: PackOptions) -> Self {
        Self { runtime, options }
    }

    /// Package a chart tree into `<output_dir>/<name>-<version>.helmpack.tgz`
    pub fn pack(&self, chart: &ChartNode) -> Result<PackOutcome> {
        let output_dir = &self.options.output_dir;
        std::fs::create_dir_all(output_dir).map_err(|e| BundleError::Output {
            path: output_dir.display().to_string(),
            message: e.to_string(),
        })?;
        let bundle_path = output_dir.join(bundle_file_name(chart));

        tracing::info!("Creating bundle for {} v{}", chart.name, chart.version);

        let workspace = tempfile::Builder::new().prefix("helmpack-pack-").tempdir()?;
        let dir_name = bundle_dir_name(chart);
        let bundle_dir = workspace.path().join(&dir_name);
        std::fs::create_dir_all(&bundle_dir)?;

        copy_tree(&chart.path, &bundle_dir.join(CHART_DIR))?;

        let images = chart.flattened_images();
        let (entries, failed) = if self.options.embed_images {
            self.embed(images, &bundle_dir)?
        } else {
            (images.into_iter().map(BundleImage::listed).collect(), Vec::new())
        };
        let embedded = entries.iter().filter(|e| e.embedded).count();

        // Written after embedding so digests and sizes are persisted
        let manifest = BundleManifest::new(
            chart,
            entries,
            Some(bundle_path.display().to_string()),
        );
        manifest.write_to(&bundle_dir)?;

        create_archive(&bundle_dir, &dir_name, &bundle_path)?;
        tracing::info!("Bundle created: {}", bundle_path.display());

        Ok(PackOutcome {
            bundle_path,
            manifest,
            embedded,
            failed,
        })
    }

    fn embed(
        &self,
        images: Vec<ImageReference>,
        bundle_dir: &Path,
    ) -> Result<(Vec<BundleImage>, Vec<(String, String)>)> {
        let Some(runtime) = &self.runtime else {
            tracing::warn!("Container runtime not available, skipping image pull");
            return Ok((images.into_iter().map(BundleImage::listed).collect(), Vec::new()));
        };

        let images_dir = bundle_dir.join(IMAGES_DIR);
        std::fs::create_dir_all(&images_dir)?;

        tracing::info!("Pulling {} container images", images.len());

        let mut entries = Vec::with_capacity(images.len());
        let mut failed = Vec::new();

        for image in images {
            let archive = image.archive_file_name();
            let dest = images_dir.join(&archive);

            match save_image(runtime, &image, &dest) {
                Ok((digest, size)) => {
                    tracing::info!("  Pulled {}", image.full_reference);
                    let mut image = image;
                    image.digest = Some(digest);
                    image.size = Some(size);
                    entries.push(BundleImage::embedded(image, archive));
                }
                Err(e) => {
                    tracing::warn!("Failed to pull {}: {}", image.full_reference, e);
                    if dest.exists() {
                        let _ = std::fs::remove_file(&dest);
                    }
                    failed.push((image.full_reference.clone(), e.to_string()));
                    entries.push(BundleImage::listed(image));
                }
            }
        }

        Ok((entries, failed))
    }
}

fn save_image<R: ContainerRuntime>(
    runtime: &R,
    image: &ImageReference,
    dest: &Path,
) -> helmpack_client::Result<(String, u64)> {
    let handle = runtime.pull(&image.full_reference)?;
    let size = runtime.save(&handle, dest)?;
    Ok((handle.id, size))
}
