//! helmpack Discovery - which images does a chart need?
//!
//! Resolves a chart source into a [`ChartNode`](helmpack_core::ChartNode)
//! tree whose image lists are transitively complete:
//!
//! - [`scan`]: four discovery strategies, run per chart
//! - [`aggregate`]: priority-ordered, last-wins deduplication
//! - [`resolver`]: the session that fetches, unpacks and walks dependencies

pub mod aggregate;
pub mod error;
pub mod resolver;
pub mod scan;
pub mod source;

pub use aggregate::{aggregate_node, dedup_last_wins, merge_with_dependencies};
pub use error::{DiscoveryError, Result};
pub use resolver::{ChartResolver, ResolverOptions};
pub use scan::{
    RenderOutcome, SCAN_PRIORITY, ScanReport, ScanStrategy, StrategyOutput, scan_chart,
};
pub use source::ChartSource;
