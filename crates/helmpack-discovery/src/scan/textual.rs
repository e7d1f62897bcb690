//! Textual fallback over template sources
//!
//! Used only when rendering fails. Template sources are not valid YAML, so
//! `image:` keys and `.image` value paths are matched with regular
//! expressions instead. Matching is case-insensitive, which also covers
//! `Image:` and `.Image`.

use once_cell::sync::Lazy;
use regex::Regex;

use helmpack_core::{ImageReference, LoadedChart};

use super::parse_all;

static IMAGE_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r#"(?i)image:[ \t]*["']?([^"'\s]+)"#).expect("valid regex"),
        Regex::new(r#"(?i)\.image\b[ \t]*["']?([^"'\s]+)"#).expect("valid regex"),
    ]
});

/// Scan every template file's raw text
pub fn scan(chart: &LoadedChart) -> Vec<ImageReference> {
    let source = chart.metadata.name.as_str();

    let files = match chart.template_files() {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(chart = source, "failed to list templates: {}", e);
            return Vec::new();
        }
    };

    let mut raw = Vec::new();
    for path in files {
        match std::fs::read_to_string(&path) {
            Ok(content) => raw.extend(candidates(&content)),
            Err(e) => {
                tracing::warn!(chart = source, file = %path.display(), "failed to read template: {}", e)
            }
        }
    }

    parse_all(raw, source)
}

/// Candidate tokens in template text, in pattern then position order
///
/// Tokens holding template delimiters, or not starting with an
/// alphanumeric character (`.repository`, `-`), are dropped.
pub fn candidates(content: &str) -> Vec<String> {
    IMAGE_PATTERNS
        .iter()
        .flat_map(|pattern| pattern.captures_iter(content))
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| !token.contains("{{") && !token.contains("}}"))
        .filter(|token| {
            token
                .chars()
                .next()
                .map(|c| c.is_ascii_alphanumeric())
                .unwrap_or(false)
        })
        .map(str::to_string)
        .collect()
}
