//! Images in rendered manifests

use helmpack_client::ChartTool;
use helmpack_core::{ImageReference, LoadedChart, Node, collect_image_strings};

use super::parse_all;

/// Result of the render strategy
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The chart rendered; these images were found
    Rendered(Vec<ImageReference>),
    /// The chart tool failed; the textual fallback should run
    Failed,
}

/// Render the chart with default values and walk every document
pub fn scan<T: ChartTool + ?Sized>(
    chart: &LoadedChart,
    tool: &T,
    release_name: &str,
) -> RenderOutcome {
    let source = chart.metadata.name.as_str();

    match tool.render(&chart.root, release_name) {
        Ok(output) => RenderOutcome::Rendered(parse_all(images_in_stream(&output), source)),
        Err(e) => {
            tracing::warn!(chart = source, "failed to render templates: {}", e);
            RenderOutcome::Failed
        }
    }
}

/// Every `image` string in a multi-document YAML stream
///
/// Documents that do not parse are skipped.
pub fn images_in_stream(stream: &str) -> Vec<String> {
    split_documents(stream)
        .into_iter()
        .filter(|doc| !doc.trim().is_empty())
        .filter_map(|doc| match Node::from_yaml_str(&doc) {
            Ok(node) => Some(node),
            Err(e) => {
                tracing::debug!("skipping unparsable document: {}", e);
                None
            }
        })
        .flat_map(|node| collect_image_strings(&node))
        .collect()
}

fn split_documents(stream: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();

    for line in stream.lines() {
        if is_separator(line) {
            documents.push(std::mem::take(&mut current));
        } else {
            current.push_str(line);
            current.push('\n');
        }
    }
    documents.push(current);

    documents
}

fn is_separator(line: &str) -> bool {
    let line = line.trim_end();
    line == "---" || line.starts_with("--- ")
}
