//! Image relocation
//!
//! On import every image moves to `<host>/<project>/<name>:<tag>`. The
//! chart's text must then point at the relocated names. The mapping is
//! built from the manifest (what the bundle intends to relocate), not from
//! what was actually pushed.

use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};

use helmpack_core::{ImageReference, VALUES_FILES, yaml_files};

use crate::error::Result;

/// Ordered `full_reference -> relocated reference` map
#[derive(Debug, Clone, Default)]
pub struct RelocationMapping {
    entries: IndexMap<String, String>,
    pattern: Option<Regex>,
}

impl RelocationMapping {
    /// Map every image to its target in `host/project`
    pub fn build<'a, I>(images: I, registry_host: &str, project: &str) -> Self
    where
        I: IntoIterator<Item = &'a ImageReference>,
    {
        let entries: IndexMap<String, String> = images
            .into_iter()
            .map(|image| {
                (
                    image.full_reference.clone(),
                    image.relocated(registry_host, project),
                )
            })
            .collect();

        Self {
            pattern: build_pattern(entries.keys()),
            entries,
        }
    }

    /// Relocated reference for an original `full_reference`
    pub fn target_for(&self, full_reference: &str) -> Option<&str> {
        self.entries.get(full_reference).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(original, target)` pairs in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Replace every occurrence of every original reference in `text`
    ///
    /// Replacement is a single left-to-right pass trying longer keys first,
    /// so `nginx` never matches inside `nginx:1.25` or inside text that was
    /// already rewritten.
    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &regex::Captures| {
                    let matched = &caps[0];
                    self.target_for(matched).unwrap_or(matched).to_string()
                })
                .into_owned(),
            None => text.to_string(),
        }
    }
}

fn build_pattern<'a, I>(keys: I) -> Option<Regex>
where
    I: Iterator<Item = &'a String>,
{
    let mut keys: Vec<&String> = keys.filter(|k| !k.is_empty()).collect();
    if keys.is_empty() {
        return None;
    }
    keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let alternation = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");

    match Regex::new(&alternation) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("cannot build relocation pattern: {}", e);
            None
        }
    }
}

/// Files touched by a relocation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelocationReport {
    /// Files rewritten
    pub modified: Vec<PathBuf>,
    /// Files that could not be read or written
    pub skipped: Vec<PathBuf>,
}

/// Rewrite one file in place; returns whether its content changed
pub fn relocate_file(path: &Path, mapping: &RelocationMapping) -> Result<bool> {
    let content = std::fs::read_to_string(path)?;
    let relocated = mapping.apply(&content);

    if relocated == content {
        return Ok(false);
    }

    std::fs::write(path, relocated)?;
    tracing::debug!("Relocated images in {}", path.display());
    Ok(true)
}

/// Rewrite the values files and every template of a chart directory
pub fn relocate_chart(chart_dir: &Path, mapping: &RelocationMapping) -> RelocationReport {
    let mut report = RelocationReport::default();

    for path in relocation_targets(chart_dir) {
        match relocate_file(&path, mapping) {
            Ok(true) => report.modified.push(path),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!("Failed to relocate images in {}: {}", path.display(), e);
                report.skipped.push(path);
            }
        }
    }

    report
}

fn relocation_targets(chart_dir: &Path) -> Vec<PathBuf> {
    let mut targets: Vec<PathBuf> = VALUES_FILES
        .iter()
        .map(|name| chart_dir.join(name))
        .filter(|path| path.is_file())
        .collect();

    match yaml_files(&chart_dir.join("templates")) {
        Ok(templates) => targets.extend(templates),
        Err(e) => tracing::warn!("cannot list templates in {}: {}", chart_dir.display(), e),
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapping(raws: &[&str]) -> RelocationMapping {
        let images: Vec<ImageReference> = raws
            .iter()
            .map(|raw| ImageReference::parse(raw, "app").unwrap())
            .collect();
        RelocationMapping::build(&images, "harbor.example.com", "library")
    }

    #[test]
    fn test_build_mapping() {
        let mapping = mapping(&["myorg/app:2.1", "quay.io/org/team/tool:1.0"]);
        assert_eq!(mapping.len(), 2);
        assert_eq!(
            mapping.target_for("myorg/app:2.1"),
            Some("harbor.example.com/library/app:2.1")
        );
        assert_eq!(
            mapping.target_for("quay.io/org/team/tool:1.0"),
            Some("harbor.example.com/library/tool:1.0")
        );
        assert_eq!(mapping.target_for("nginx"), None);
    }

    #[test]
    fn test_longest_reference_wins() {
        let mapping = mapping(&["nginx", "nginx:1.25"]);
        let text = "a: nginx:1.25\nb: nginx\n";
        assert_eq!(
            mapping.apply(text),
            "a: harbor.example.com/library/nginx:1.25\nb: harbor.example.com/library/nginx:latest\n"
        );
    }

    #[test]
    fn test_replaced_text_is_not_rescanned() {
        // The target of `app:1.0` contains `library/app:1.0`, another key
        let mapping = mapping(&["app:1.0", "library/app:1.0"]);
        assert_eq!(
            mapping.apply("image: app:1.0\n"),
            "image: harbor.example.com/library/app:1.0\n"
        );
    }

    #[test]
    fn test_empty_mapping_is_identity() {
        let mapping = RelocationMapping::build(
            std::iter::empty::<&ImageReference>(),
            "harbor.example.com",
            "library",
        );
        assert!(mapping.is_empty());
        assert_eq!(mapping.apply("image: nginx\n"), "image: nginx\n");
    }

    #[test]
    fn test_relocate_chart_rewrites_values_and_templates() {
        let temp = TempDir::new().unwrap();
        let chart = temp.path();
        std::fs::create_dir_all(chart.join("templates/sub")).unwrap();
        std::fs::write(chart.join("values.yaml"), "image: myorg/app:2.1\n").unwrap();
        std::fs::write(
            chart.join("templates/sub/deployment.yaml"),
            "      image: myorg/app:2.1\n",
        )
        .unwrap();
        std::fs::write(chart.join("templates/service.yaml"), "kind: Service\n").unwrap();
        std::fs::write(chart.join("templates/NOTES.txt"), "myorg/app:2.1\n").unwrap();

        let report = relocate_chart(chart, &mapping(&["myorg/app:2.1"]));

        assert_eq!(
            report.modified,
            vec![
                chart.join("values.yaml"),
                chart.join("templates/sub/deployment.yaml"),
            ]
        );
        assert!(report.skipped.is_empty());
        assert_eq!(
            std::fs::read_to_string(chart.join("values.yaml")).unwrap(),
            "image: harbor.example.com/library/app:2.1\n"
        );
        assert_eq!(
            std::fs::read_to_string(chart.join("templates/NOTES.txt")).unwrap(),
            "myorg/app:2.1\n"
        );
    }

    #[test]
    fn test_relocate_chart_replaces_every_occurrence() {
        let temp = TempDir::new().unwrap();
        let chart = temp.path();
        std::fs::create_dir_all(chart.join("templates")).unwrap();
        std::fs::write(
            chart.join("templates/deployment.yaml"),
            "containers:\n  - image: docker.io/library/nginx:1.25\ninitContainers:\n  - image: \"docker.io/library/nginx:1.25\"\n",
        )
        .unwrap();
        std::fs::write(
            chart.join("templates/job.yaml"),
            "      image: busybox:1.36\n",
        )
        .unwrap();

        let nginx = ImageReference::parse("docker.io/library/nginx:1.25", "app").unwrap();
        let mapping = RelocationMapping::build([&nginx], "harbor.local", "proj");
        assert_eq!(
            mapping.target_for("docker.io/library/nginx:1.25"),
            Some("harbor.local/proj/nginx:1.25")
        );

        let report = relocate_chart(chart, &mapping);

        assert_eq!(report.modified, vec![chart.join("templates/deployment.yaml")]);
        assert_eq!(
            std::fs::read_to_string(chart.join("templates/deployment.yaml")).unwrap(),
            "containers:\n  - image: harbor.local/proj/nginx:1.25\ninitContainers:\n  - image: \"harbor.local/proj/nginx:1.25\"\n"
        );
        assert_eq!(
            std::fs::read_to_string(chart.join("templates/job.yaml")).unwrap(),
            "      image: busybox:1.36\n"
        );
    }

    #[test]
    fn test_relocate_file_reports_change() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("values.yaml");
        std::fs::write(&file, "replicas: 1\n").unwrap();

        assert!(!relocate_file(&file, &mapping(&["nginx"])).unwrap());
        assert!(relocate_file(&temp.path().join("missing.yaml"), &mapping(&["nginx"])).is_err());
    }
}
