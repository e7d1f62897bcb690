//! Bundle manifest (`bundle.yaml`)
//!
//! Every bundle carries a manifest describing the chart tree and the
//! flattened image list. The image list is authoritative: it names every
//! image the chart may reference, whether or not its bytes were embedded.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::chart::ChartNode;
use crate::error::{CoreError, Result};
use crate::reference::ImageReference;

/// Manifest `apiVersion`
pub const BUNDLE_API_VERSION: &str = "v1";

/// Manifest `kind`
pub const BUNDLE_KIND: &str = "HelmPackBundle";

/// Suffix appended to `<name>-<version>` for bundle files
pub const BUNDLE_SUFFIX: &str = ".helmpack.tgz";

/// Manifest file name inside the bundle directory
pub const MANIFEST_FILE: &str = "bundle.yaml";

/// Chart copy inside the bundle directory
pub const CHART_DIR: &str = "chart";

/// Saved images inside the bundle directory
pub const IMAGES_DIR: &str = "images";

/// Top-level directory name of a bundle
pub fn bundle_dir_name(chart: &ChartNode) -> String {
    chart.qualified_name()
}

/// File name of a bundle
pub fn bundle_file_name(chart: &ChartNode) -> String {
    format!("{}{}", chart.qualified_name(), BUNDLE_SUFFIX)
}

/// The `bundle.yaml` document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: BundleMetadata,
    pub chart: ChartNode,
    #[serde(default)]
    pub images: Vec<BundleImage>,
}

/// Summary block of the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMetadata {
    pub name: String,
    pub version: String,
    pub generated_at: String,
    pub generated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle_path: Option<String>,
    pub total_images: usize,
    pub total_dependencies: usize,
}

/// An image entry of the manifest
///
/// `embedded` states whether the bundle carries the image bytes under
/// `images/<archive>`. Importers trust the flag instead of probing files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleImage {
    #[serde(flatten)]
    pub image: ImageReference,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
}

impl BundleImage {
    /// An entry without image bytes
    pub fn listed(image: ImageReference) -> Self {
        Self {
            image,
            embedded: false,
            archive: None,
        }
    }

    /// An entry whose bytes were saved to `images/<archive>`
    pub fn embedded(image: ImageReference, archive: String) -> Self {
        Self {
            image,
            embedded: true,
            archive: Some(archive),
        }
    }

    /// Relative path of the saved image inside the bundle directory
    pub fn archive_path(&self) -> Option<String> {
        self.archive
            .as_ref()
            .filter(|_| self.embedded)
            .map(|name| format!("{}/{}", IMAGES_DIR, name))
    }
}

impl BundleManifest {
    /// Build a manifest for a resolved chart
    pub fn new(chart: &ChartNode, images: Vec<BundleImage>, bundle_path: Option<String>) -> Self {
        Self {
            api_version: BUNDLE_API_VERSION.to_string(),
            kind: BUNDLE_KIND.to_string(),
            metadata: BundleMetadata {
                name: chart.name.clone(),
                version: chart.version.clone(),
                generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                generated_by: format!("helmpack {}", env!("CARGO_PKG_VERSION")),
                bundle_path,
                total_images: images.len(),
                total_dependencies: chart.dependencies.len(),
            },
            chart: chart.clone(),
            images,
        }
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Parse from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| CoreError::InvalidBundle {
            message: format!("malformed {}: {}", MANIFEST_FILE, e),
        })
    }

    /// Write `bundle.yaml` into a bundle directory
    pub fn write_to(&self, bundle_dir: &Path) -> Result<()> {
        std::fs::write(bundle_dir.join(MANIFEST_FILE), self.to_yaml()?)?;
        Ok(())
    }

    /// Load `bundle.yaml` from a bundle directory
    pub fn load_from(bundle_dir: &Path) -> Result<Self> {
        let path = bundle_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(CoreError::InvalidBundle {
                message: format!("{} not found in {}", MANIFEST_FILE, bundle_dir.display()),
            });
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content)
    }

    /// Number of entries with embedded image bytes
    pub fn embedded_count(&self) -> usize {
        self.images.iter().filter(|i| i.embedded).count()
    }

    /// The `full_reference` of every entry, in manifest order
    pub fn references(&self) -> Vec<&str> {
        self.images
            .iter()
            .map(|i| i.image.full_reference.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_chart() -> ChartNode {
        let redis = ChartNode {
            name: "redis".to_string(),
            version: "18.0.0".to_string(),
            path: PathBuf::from("/work/redis"),
            dependencies: vec![],
            images: vec![ImageReference::parse("bitnami/redis:7.2", "redis").unwrap()],
        };
        ChartNode {
            name: "app".to_string(),
            version: "1.0.0".to_string(),
            path: PathBuf::from("/work/app"),
            images: vec![
                ImageReference::parse("myorg/app:2.1", "app").unwrap(),
                ImageReference::parse("bitnami/redis:7.2", "redis").unwrap(),
            ],
            dependencies: vec![redis],
        }
    }

    #[test]
    fn test_bundle_names() {
        let chart = sample_chart();
        assert_eq!(bundle_dir_name(&chart), "app-1.0.0");
        assert_eq!(bundle_file_name(&chart), "app-1.0.0.helmpack.tgz");
    }

    #[test]
    fn test_new_manifest_counts() {
        let chart = sample_chart();
        let images = chart
            .flattened_images()
            .into_iter()
            .map(BundleImage::listed)
            .collect();
        let manifest = BundleManifest::new(&chart, images, None);

        assert_eq!(manifest.api_version, "v1");
        assert_eq!(manifest.kind, "HelmPackBundle");
        assert_eq!(manifest.metadata.total_images, 2);
        assert_eq!(manifest.metadata.total_dependencies, 1);
        assert_eq!(manifest.embedded_count(), 0);
        assert_eq!(manifest.references(), vec!["myorg/app:2.1", "bitnami/redis:7.2"]);
    }

    #[test]
    fn test_yaml_round_trip() {
        let chart = sample_chart();
        let mut first = ImageReference::parse("myorg/app:2.1", "app").unwrap();
        first.digest = Some("sha256:abc".to_string());
        first.size = Some(1024);
        let images = vec![
            BundleImage::embedded(first, "deadbeef.tar".to_string()),
            BundleImage::listed(ImageReference::parse("bitnami/redis:7.2", "redis").unwrap()),
        ];
        let manifest = BundleManifest::new(&chart, images, Some("out/app.tgz".to_string()));

        let yaml = manifest.to_yaml().unwrap();
        let parsed = BundleManifest::from_yaml(&yaml).unwrap();

        assert_eq!(parsed, manifest);
        assert_eq!(parsed.images[0].archive_path().as_deref(), Some("images/deadbeef.tar"));
        assert_eq!(parsed.images[1].archive_path(), None);
    }

    #[test]
    fn test_wire_keys() {
        let chart = sample_chart();
        let images = vec![BundleImage::listed(
            ImageReference::parse("myorg/app:2.1", "app").unwrap(),
        )];
        let mut manifest = BundleManifest::new(&chart, images, None);
        manifest.metadata.generated_at = "2024-01-01T00:00:00Z".to_string();
        manifest.metadata.generated_by = "helmpack test".to_string();

        let value: serde_yaml::Value = serde_yaml::from_str(&manifest.to_yaml().unwrap()).unwrap();

        for key in ["apiVersion", "kind", "metadata", "chart", "images"] {
            assert!(value.get(key).is_some(), "missing top-level key {}", key);
        }
        for key in [
            "name",
            "version",
            "generatedAt",
            "generatedBy",
            "totalImages",
            "totalDependencies",
        ] {
            assert!(value["metadata"].get(key).is_some(), "missing metadata key {}", key);
        }
        let image = &value["images"][0];
        assert_eq!(image["full_reference"].as_str(), Some("myorg/app:2.1"));
        assert_eq!(image["chart_source"].as_str(), Some("app"));
        assert_eq!(image["embedded"].as_bool(), Some(false));
    }

    #[test]
    fn test_image_entry_snapshot() {
        let images = vec![
            BundleImage::listed(ImageReference::parse("myorg/app:v2", "app").unwrap()),
            BundleImage::embedded(
                ImageReference::parse("quay.io/org/tool", "tools").unwrap(),
                "0f0f.tar".to_string(),
            ),
        ];

        insta::assert_snapshot!(serde_yaml::to_string(&images).unwrap(), @r"
        - name: app
          tag: v2
          registry: docker.io
          repository: myorg/app
          full_reference: myorg/app:v2
          chart_source: app
          digest: null
          size: null
          embedded: false
        - name: tool
          tag: latest
          registry: quay.io
          repository: org/tool
          full_reference: quay.io/org/tool
          chart_source: tools
          digest: null
          size: null
          embedded: true
          archive: 0f0f.tar
        ");
    }

    #[test]
    fn test_legacy_entries_default_to_not_embedded() {
        let yaml = r#"
apiVersion: v1
kind: HelmPackBundle
metadata:
  name: app
  version: 1.0.0
  generatedAt: "2024-05-01T10:00:00+00:00"
  generatedBy: HelmPack Universal Bundler
  bundlePath: app-1.0.0.helmpack.tgz
  totalImages: 1
  totalDependencies: 0
chart:
  name: app
  version: 1.0.0
  path: /tmp/helmpack_x/app
  dependencies: []
  images: []
images:
  - name: nginx
    tag: "1.25"
    registry: docker.io
    repository: library/nginx
    full_reference: docker.io/library/nginx:1.25
    chart_source: app
    digest: null
    size: null
"#;
        let manifest = BundleManifest::from_yaml(yaml).unwrap();
        assert_eq!(manifest.images.len(), 1);
        assert!(!manifest.images[0].embedded);
        assert_eq!(manifest.images[0].image.tag, "1.25");
    }

    #[test]
    fn test_load_from_missing_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = BundleManifest::load_from(temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidBundle { .. }));
    }
}
