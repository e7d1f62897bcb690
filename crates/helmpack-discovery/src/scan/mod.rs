//! Multi-strategy image extraction
//!
//! Each chart is scanned by up to four strategies. None of them is reliable
//! on its own: annotations may be stale, rendering may fail, values may hold
//! images that no template uses. Their outputs are combined by
//! [`crate::aggregate::aggregate_node`] in [`SCAN_PRIORITY`] order.

pub mod annotations;
pub mod rendered;
pub mod textual;
pub mod values;

use helmpack_client::ChartTool;
use helmpack_core::{ImageReference, LoadedChart};

pub use rendered::RenderOutcome;

/// A discovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanStrategy {
    /// `images` and `artifacthub.io/images` annotations in `Chart.yaml`
    DeclaredMetadata,
    /// `image` keys in the output of the chart tool's render
    RenderedManifest,
    /// `image` keys in `values.yaml` / `values.yml`
    RawValues,
    /// Regular expressions over template sources, only when rendering fails
    TextualFallback,
}

/// Order in which scanner outputs are concatenated before deduplication
///
/// Deduplication keeps the last occurrence of each reference, so a strategy
/// later in this list overrides an earlier one for the same string. Changing
/// the order changes which `chart_source` and metadata survive.
pub const SCAN_PRIORITY: [ScanStrategy; 4] = [
    ScanStrategy::DeclaredMetadata,
    ScanStrategy::RenderedManifest,
    ScanStrategy::RawValues,
    ScanStrategy::TextualFallback,
];

impl ScanStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ScanStrategy::DeclaredMetadata => "declared metadata",
            ScanStrategy::RenderedManifest => "rendered manifest",
            ScanStrategy::RawValues => "raw values",
            ScanStrategy::TextualFallback => "textual fallback",
        }
    }
}

impl std::fmt::Display for ScanStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Candidates found by one strategy
#[derive(Debug, Clone)]
pub struct StrategyOutput {
    pub strategy: ScanStrategy,
    pub images: Vec<ImageReference>,
}

/// What a scan of one chart did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Accepted candidates per strategy that ran, in run order
    pub counts: Vec<(ScanStrategy, usize)>,
    /// Whether rendering failed and the textual fallback ran
    pub fallback_used: bool,
}

impl ScanReport {
    /// Candidate count for a strategy, `None` if it did not run
    pub fn count(&self, strategy: ScanStrategy) -> Option<usize> {
        self.counts
            .iter()
            .find(|(s, _)| *s == strategy)
            .map(|(_, n)| *n)
    }
}

/// Run every applicable strategy over a chart
pub fn scan_chart<T: ChartTool + ?Sized>(
    chart: &LoadedChart,
    tool: &T,
    release_name: &str,
) -> (Vec<StrategyOutput>, ScanReport) {
    let source = chart.metadata.name.as_str();
    let mut outputs = Vec::new();
    let mut report = ScanReport::default();

    let mut push = |strategy: ScanStrategy, images: Vec<ImageReference>| {
        tracing::debug!(chart = source, %strategy, found = images.len(), "scan finished");
        report.counts.push((strategy, images.len()));
        outputs.push(StrategyOutput { strategy, images });
    };

    push(ScanStrategy::DeclaredMetadata, annotations::scan(chart));

    let fallback_needed = match rendered::scan(chart, tool, release_name) {
        RenderOutcome::Rendered(images) => {
            push(ScanStrategy::RenderedManifest, images);
            false
        }
        RenderOutcome::Failed => true,
    };

    push(ScanStrategy::RawValues, values::scan(chart));

    if fallback_needed {
        push(ScanStrategy::TextualFallback, textual::scan(chart));
    }

    report.fallback_used = fallback_needed;
    (outputs, report)
}

/// Parse raw strings, dropping anything that is not an image
pub(crate) fn parse_all<I, S>(raw: I, chart_source: &str) -> Vec<ImageReference>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|s| ImageReference::parse(s.as_ref(), chart_source))
        .collect()
}
