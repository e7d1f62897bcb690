//! Display formatting for CLI output

use console::style;
use helmpack_core::{ChartNode, ImageReference};
use indexmap::IndexMap;

const RULE_WIDTH: usize = 60;

/// Print a section header framed by rules
pub fn header(title: &str) {
    println!();
    println!("{}", "=".repeat(RULE_WIDTH));
    println!("{}", style(title).bold());
    println!("{}", "=".repeat(RULE_WIDTH));
}

/// Print the dependency tree below `node`
pub fn print_dependencies(node: &ChartNode) {
    println!();
    println!(
        "{} ({}):",
        style("Dependencies").cyan().bold(),
        node.dependency_count()
    );
    if node.dependencies.is_empty() {
        println!("  None");
        return;
    }
    print_tree(&node.dependencies, 1);
}

fn print_tree(nodes: &[ChartNode], depth: usize) {
    for node in nodes {
        println!(
            "{}• {} {}",
            "  ".repeat(depth),
            node.name,
            style(format!("v{}", node.version)).dim()
        );
        print_tree(&node.dependencies, depth + 1);
    }
}

/// Print the flattened images, grouped by the chart that introduced them
pub fn print_images_by_source(node: &ChartNode) {
    let images = node.flattened_images();
    println!();
    println!(
        "{} ({}):",
        style("Container Images").cyan().bold(),
        images.len()
    );

    if images.is_empty() {
        println!("  None found");
        return;
    }

    for (source, group) in group_by_source(&images) {
        println!();
        println!("  From {}:", style(source).bold());
        for image in group {
            println!("    • {}", image.full_reference);
        }
    }
}

/// Print at most `limit` images, then a count of the rest
pub fn print_image_list<'a, I>(images: I, total: usize, limit: usize)
where
    I: IntoIterator<Item = &'a ImageReference>,
{
    for image in images.into_iter().take(limit) {
        println!(
            "  • {} {}",
            image.full_reference,
            style(format!("(from {})", image.chart_source)).dim()
        );
    }
    if total > limit {
        println!("  ... and {} more", total - limit);
    }
}

pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), message);
}

pub fn failure(message: &str) {
    println!("{} {}", style("✗").red().bold(), message);
}

/// Print a `hint:` line
pub fn hint(message: &str) {
    println!("  {} {}", style("hint:").blue(), message);
}

/// Images grouped by `chart_source`, groups in first-seen order
pub fn group_by_source(images: &[ImageReference]) -> IndexMap<&str, Vec<&ImageReference>> {
    let mut groups: IndexMap<&str, Vec<&ImageReference>> = IndexMap::new();
    for image in images {
        groups
            .entry(image.chart_source.as_str())
            .or_default()
            .push(image);
    }
    groups
}
