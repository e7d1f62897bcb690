//! helmpack Core - Core types for air-gapped chart bundling
//!
//! This crate provides the foundational types used throughout helmpack:
//! - `ImageReference`: A parsed container image reference
//! - `ChartNode`: A resolved chart with its dependency tree and images
//! - `LoadedChart`: A chart directory on disk with its `Chart.yaml`
//! - `Node`: A loosely structured document walked by typed visitors
//! - `BundleManifest`: The `bundle.yaml` describing a bundle
//! - Archive helpers for `.tgz` bundles and charts

pub mod archive;
pub mod chart;
pub mod document;
pub mod error;
pub mod manifest;
pub mod reference;

pub use archive::{
    ArchiveEntry, copy_tree, create_archive, encode_reference, extract_archive, list_archive,
    read_file_from_archive, single_top_level_dir,
};
pub use chart::{
    ChartDependency, ChartMetadata, ChartNode, LoadedChart, UNKNOWN_NAME, UNKNOWN_VERSION,
    VALUES_FILES, is_yaml_file, yaml_files,
};
pub use document::{ImageKeyCollector, Node, Scalar, Visitor, collect_image_strings};
pub use error::{CoreError, Result};
pub use manifest::{
    BUNDLE_API_VERSION, BUNDLE_KIND, BUNDLE_SUFFIX, BundleImage, BundleManifest, BundleMetadata,
    CHART_DIR, IMAGES_DIR, MANIFEST_FILE, bundle_dir_name, bundle_file_name,
};
pub use reference::{DEFAULT_REGISTRY, DEFAULT_TAG, ImageReference, dedup_last_wins};
