//! Read-only bundle inspection
//!
//! Reads the archive listing and `bundle.yaml` straight from the gzip
//! stream, so inspecting a multi-gigabyte bundle never unpacks its images.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use helmpack_core::{
    ArchiveEntry, BundleManifest, IMAGES_DIR, MANIFEST_FILE, list_archive, read_file_from_archive,
};

use crate::error::{BundleError, Result};

/// Summary of a bundle on disk
#[derive(Debug, Clone)]
pub struct BundleInfo {
    pub bundle_path: PathBuf,
    /// Size of the bundle file in bytes
    pub bundle_size: u64,
    /// The `<name>-<version>` directory inside the archive
    pub top_level: String,
    pub manifest: BundleManifest,
    /// `images/*.tar` entries, paths relative to the top-level directory
    pub image_archives: Vec<ArchiveEntry>,
}

impl BundleInfo {
    pub fn read(bundle_path: &Path) -> Result<Self> {
        let bundle_size = std::fs::metadata(bundle_path)?.len();

        let entries = list_archive(bundle_path)
            .map_err(|e| BundleError::invalid(bundle_path, e.to_string()))?;
        let top_level = top_level_dir(&entries)
            .map_err(|message| BundleError::invalid(bundle_path, message))?;

        let manifest_path = format!("{}/{}", top_level, MANIFEST_FILE);
        let bytes = read_file_from_archive(bundle_path, &manifest_path)
            .map_err(|_| BundleError::invalid(bundle_path, format!("{} not found", MANIFEST_FILE)))?;
        let content = String::from_utf8(bytes).map_err(|e| {
            BundleError::invalid(bundle_path, format!("{} is not UTF-8: {}", MANIFEST_FILE, e))
        })?;
        let manifest = BundleManifest::from_yaml(&content)
            .map_err(|e| BundleError::invalid(bundle_path, e.to_string()))?;

        let images_prefix = format!("{}/{}/", top_level, IMAGES_DIR);
        let image_archives = entries
            .into_iter()
            .filter(|entry| !entry.is_dir && entry.path.ends_with(".tar"))
            .filter_map(|entry| {
                let path = entry.path.trim_start_matches("./");
                let rel = path.strip_prefix(&images_prefix)?;
                (!rel.contains('/')).then(|| ArchiveEntry {
                    path: format!("{}/{}", IMAGES_DIR, rel),
                    size: entry.size,
                    is_dir: false,
                })
            })
            .collect();

        Ok(Self {
            bundle_path: bundle_path.to_path_buf(),
            bundle_size,
            top_level,
            manifest,
            image_archives,
        })
    }

    /// Total size of the saved images in bytes
    pub fn images_size(&self) -> u64 {
        self.image_archives.iter().map(|e| e.size).sum()
    }
}

fn top_level_dir(entries: &[ArchiveEntry]) -> std::result::Result<String, String> {
    let roots: BTreeSet<&str> = entries
        .iter()
        .filter_map(|entry| {
            entry
                .path
                .trim_start_matches("./")
                .split('/')
                .next()
                .filter(|root| !root.is_empty() && *root != ".")
        })
        .collect();

    if roots.len() > 1 {
        return Err(format!(
            "{} top-level entries ({})",
            roots.len(),
            roots.iter().copied().collect::<Vec<_>>().join(", ")
        ));
    }

    roots
        .first()
        .map(|root| root.to_string())
        .ok_or_else(|| "no top-level directory".to_string())
}
