//! Images in raw values files

use helmpack_core::{ImageReference, LoadedChart, Node, collect_image_strings};

use super::parse_all;

/// Walk `values.yaml` then `values.yml` for `image` keys
pub fn scan(chart: &LoadedChart) -> Vec<ImageReference> {
    let source = chart.metadata.name.as_str();
    let mut raw = Vec::new();

    for path in chart.values_files() {
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| Node::from_yaml_str(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(node) => raw.extend(collect_image_strings(&node)),
            Err(e) => tracing::warn!(chart = source, file = %path.display(), "failed to parse values: {}", e),
        }
    }

    parse_all(raw, source)
}
