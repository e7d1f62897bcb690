//! Container image references
//!
//! Turns the raw strings found in charts into structured references. The
//! parser is deliberately permissive: anything that looks like an image is
//! accepted, and callers treat a `None` as "not an image" rather than an
//! error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::archive::encode_reference;

/// Registry assumed when the reference does not name one
pub const DEFAULT_REGISTRY: &str = "docker.io";

/// Tag assumed when the reference does not carry one
pub const DEFAULT_TAG: &str = "latest";

/// A container image discovered in a chart
///
/// Two references denote the same image iff their `full_reference` strings
/// are byte-identical. No normalization is applied: `nginx` and
/// `docker.io/library/nginx:latest` are different images as far as
/// deduplication is concerned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// Final repository path segment, tag stripped
    pub name: String,

    /// Tag, `latest` when absent
    pub tag: String,

    /// Registry host (with optional port)
    pub registry: String,

    /// Repository path without registry and tag
    pub repository: String,

    /// The cleaned input string, used verbatim as identity key
    pub full_reference: String,

    /// Name of the chart that introduced the image
    pub chart_source: String,

    /// Content digest, only known after a pull
    #[serde(default)]
    pub digest: Option<String>,

    /// Saved archive size in bytes, only known after a pull
    #[serde(default)]
    pub size: Option<u64>,
}

impl ImageReference {
    /// Parse a raw image string
    ///
    /// Returns `None` for strings that are not concrete image references:
    /// empty strings, strings still containing template placeholders, and
    /// strings without a repository part.
    ///
    /// A string with no `/` is always a repository on the default registry,
    /// so `nginx:1.25` parses with tag `1.25` instead of being read as a
    /// `host:port`. Empty components are rejected as well: an empty name or
    /// tag (`nginx:`) and empty path segments (`a//b`) yield `None`, since
    /// they cannot be pulled or relocated.
    pub fn parse(raw: &str, chart_source: &str) -> Option<Self> {
        let cleaned = raw.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'');

        if cleaned.is_empty() || cleaned.contains("{{") || cleaned.contains("}}") {
            return None;
        }

        let parts: Vec<&str> = cleaned.split('/').collect();

        // A lone segment is always a repository, even with a tag (`nginx:1.25`)
        let (registry, repo_parts) = if parts.len() > 1 && looks_like_registry(parts[0]) {
            (parts[0], &parts[1..])
        } else {
            (DEFAULT_REGISTRY, &parts[..])
        };

        let (last, leading) = repo_parts.split_last()?;

        let (name, tag) = match last.rsplit_once(':') {
            Some((name, tag)) => (name, tag),
            None => (*last, DEFAULT_TAG),
        };

        if name.is_empty() || tag.is_empty() || leading.iter().any(|p| p.is_empty()) {
            return None;
        }

        let mut segments: Vec<&str> = leading.to_vec();
        segments.push(name);

        Some(Self {
            name: name.to_string(),
            tag: tag.to_string(),
            registry: registry.to_string(),
            repository: segments.join("/"),
            full_reference: cleaned.to_string(),
            chart_source: chart_source.to_string(),
            digest: None,
            size: None,
        })
    }

    /// Identity key used for deduplication
    #[inline]
    pub fn key(&self) -> &str {
        &self.full_reference
    }

    /// Compute the reference this image gets inside a private registry
    ///
    /// Intermediate repository segments are dropped:
    /// `quay.io/org/team/app:1.0` becomes `<host>/<project>/app:1.0`.
    pub fn relocated(&self, registry_host: &str, project: &str) -> String {
        format!("{}/{}/{}:{}", registry_host, project, self.name, self.tag)
    }

    /// File name of the saved image inside a bundle's `images/` directory
    pub fn archive_file_name(&self) -> String {
        format!("{}.tar", encode_reference(&self.full_reference))
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.full_reference)
    }
}

fn looks_like_registry(segment: &str) -> bool {
    segment.contains('.') || segment.contains(':')
}

/// Deduplicate by `full_reference`, last occurrence wins
///
/// Each key keeps the position of its first occurrence but the value of its
/// last one. Callers rely on this exact precedence.
pub fn dedup_last_wins<I>(images: I) -> Vec<ImageReference>
where
    I: IntoIterator<Item = ImageReference>,
{
    let mut unique: IndexMap<String, ImageReference> = IndexMap::new();
    for image in images {
        unique.insert(image.key().to_string(), image);
    }
    unique.into_values().collect()
}
