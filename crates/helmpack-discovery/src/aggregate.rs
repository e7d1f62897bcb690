//! Aggregation and deduplication of discovered images

use helmpack_core::{ChartNode, ImageReference};

use crate::scan::{SCAN_PRIORITY, StrategyOutput};

pub use helmpack_core::dedup_last_wins;

/// Combine one chart's scanner outputs into its own image list
///
/// Outputs are concatenated in [`SCAN_PRIORITY`] order, whatever order they
/// are passed in, then deduplicated with [`dedup_last_wins`].
pub fn aggregate_node(outputs: &[StrategyOutput]) -> Vec<ImageReference> {
    let ordered = SCAN_PRIORITY.into_iter().flat_map(|strategy| {
        outputs
            .iter()
            .filter(move |output| output.strategy == strategy)
            .flat_map(|output| output.images.iter().cloned())
    });

    dedup_last_wins(ordered)
}

/// A node's image list: its own images followed by each dependency's list
///
/// Dependency lists are appended as-is. Duplicates across nodes survive
/// here and are only removed when the packager flattens the tree.
pub fn merge_with_dependencies(
    own: Vec<ImageReference>,
    dependencies: &[ChartNode],
) -> Vec<ImageReference> {
    let mut images = own;
    for dependency in dependencies {
        images.extend(dependency.images.iter().cloned());
    }
    images
}
