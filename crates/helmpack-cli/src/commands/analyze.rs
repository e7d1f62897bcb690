//! Analyze command - show the dependency tree and images of a chart

use console::style;
use helmpack_client::ClientConfig;

use crate::display;
use crate::error::Result;

pub fn run(chart: &str, json: bool, config: &ClientConfig) -> Result<()> {
    let (resolver, node) = super::resolve_chart(chart, config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&node)?);
        return Ok(());
    }

    display::header(&format!("Chart Analysis: {} v{}", node.name, node.version));
    display::print_dependencies(&node);
    display::print_images_by_source(&node);

    let fallbacks: Vec<&str> = resolver
        .reports()
        .iter()
        .filter(|(_, report)| report.fallback_used)
        .map(|(name, _)| name.as_str())
        .collect();
    if !fallbacks.is_empty() {
        println!();
        display::warning(&format!(
            "Rendering failed for {}; images were found by text search",
            fallbacks.join(", ")
        ));
    }

    println!();
    println!(
        "{}: {}",
        style("Chart Location").dim(),
        node.path.display()
    );

    Ok(())
}
