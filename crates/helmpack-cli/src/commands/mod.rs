//! CLI commands

pub mod analyze;
pub mod import;
pub mod inspect;
pub mod pack;
pub mod test_registry;

use helmpack_client::{ClientConfig, HelmCli};
use helmpack_core::ChartNode;
use helmpack_discovery::{ChartResolver, ResolverOptions};

use crate::error::Result;

/// Resolve `chart` with the configured chart tool
///
/// The resolver is returned alongside the tree: archive and remote charts
/// live in its workspaces until it is dropped.
pub(crate) fn resolve_chart(
    chart: &str,
    config: &ClientConfig,
) -> Result<(ChartResolver<HelmCli>, ChartNode)> {
    let tool = HelmCli::new(&config.helm_binary);
    if !tool.is_available() {
        tracing::warn!(
            "'{}' not available, rendering disabled and dependencies not refreshed",
            config.helm_binary
        );
    }

    let mut resolver = ChartResolver::with_options(
        tool,
        ResolverOptions {
            release_name: config.release_name.clone(),
            update_dependencies: true,
        },
    );
    let node = resolver.resolve(chart)?;
    Ok((resolver, node))
}
