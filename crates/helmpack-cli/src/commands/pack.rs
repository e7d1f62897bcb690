//! Pack command - bundle a chart and its images

use console::style;
use std::path::Path;

use helmpack_bundle::{PackOptions, Packager};
use helmpack_client::{ClientConfig, DockerCli};

use crate::display;
use crate::error::Result;
use crate::util::{file_size, format_size};

const LISTED_IMAGES: usize = 10;

pub fn run(chart: &str, output: &Path, no_images: bool, config: &ClientConfig) -> Result<()> {
    let (_resolver, node) = super::resolve_chart(chart, config)?;

    let runtime = if no_images {
        None
    } else {
        let docker = DockerCli::new(&config.docker_binary);
        if docker.is_available() {
            Some(docker)
        } else {
            tracing::warn!("'{}' not available", config.docker_binary);
            None
        }
    };

    let packager = Packager::new(
        runtime,
        PackOptions {
            output_dir: output.to_path_buf(),
            embed_images: !no_images,
        },
    );
    let outcome = packager.pack(&node)?;

    display::header("Bundle Summary");
    println!("Chart: {} v{}", node.name, node.version);
    println!("Dependencies: {}", node.dependency_count());
    println!(
        "Total Images: {} ({} embedded)",
        outcome.manifest.images.len(),
        outcome.embedded
    );
    println!(
        "Bundle: {} ({})",
        outcome.bundle_path.display(),
        format_size(file_size(&outcome.bundle_path))
    );

    let images = &outcome.manifest.images;
    if !images.is_empty() {
        println!();
        println!("{}:", style("Images included").cyan().bold());
        display::print_image_list(
            images.iter().map(|entry| &entry.image),
            images.len(),
            LISTED_IMAGES,
        );
    }

    if !outcome.failed.is_empty() {
        println!();
        display::warning(&format!(
            "{} image(s) could not be embedded:",
            outcome.failed.len()
        ));
        for (reference, reason) in &outcome.failed {
            println!("  • {} {}", reference, style(reason).dim());
        }
    }

    println!();
    display::success("Bundle created successfully!");
    Ok(())
}
