//! Declared images in `Chart.yaml` annotations
//!
//! Two annotations are recognised, `images` and `artifacthub.io/images`.
//! Either may hold a YAML string or an already structured list of
//! `{name, image}` entries.

use helmpack_core::{ImageReference, LoadedChart};
use serde_yaml::Value;

use super::parse_all;

/// Annotation keys read, in order
pub const IMAGE_ANNOTATIONS: [&str; 2] = ["images", "artifacthub.io/images"];

/// Collect images declared in the chart's annotations
pub fn scan(chart: &LoadedChart) -> Vec<ImageReference> {
    let source = chart.metadata.name.as_str();
    let mut raw = Vec::new();

    for key in IMAGE_ANNOTATIONS {
        if let Some(value) = chart.metadata.annotation(key) {
            match entries(value) {
                Ok(found) => raw.extend(found),
                Err(reason) => {
                    tracing::warn!(chart = source, annotation = key, "ignoring annotation: {}", reason)
                }
            }
        }
    }

    parse_all(raw, source)
}

fn entries(value: &Value) -> std::result::Result<Vec<String>, String> {
    let parsed;
    let list = match value {
        Value::String(text) => {
            parsed = serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())?;
            &parsed
        }
        other => other,
    };

    match list {
        Value::Sequence(items) => Ok(items
            .iter()
            .filter_map(|item| item.get("image").and_then(Value::as_str))
            .map(str::to_string)
            .collect()),
        Value::Null => Ok(Vec::new()),
        _ => Err("expected a list of image entries".to_string()),
    }
}
