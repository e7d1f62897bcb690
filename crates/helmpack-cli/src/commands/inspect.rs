//! Inspect command - bundle manifest summary without importing

use console::style;
use std::path::Path;

use helmpack_bundle::BundleInfo;

use crate::display;
use crate::error::Result;
use crate::util::format_size;

const LISTED_IMAGES: usize = 15;

pub fn run(bundle: &Path) -> Result<()> {
    let info = BundleInfo::read(bundle)?;
    let metadata = &info.manifest.metadata;

    display::header("Bundle Information");
    println!("Chart: {} v{}", metadata.name, metadata.version);
    println!("Generated: {}", metadata.generated_at);
    println!("Generated By: {}", metadata.generated_by);
    println!("Dependencies: {}", metadata.total_dependencies);
    println!(
        "Images: {} ({} embedded)",
        info.manifest.images.len(),
        info.manifest.embedded_count()
    );

    if info.image_archives.is_empty() {
        println!("Image Archives: Not included");
    } else {
        println!("Image Archives: {} files", info.image_archives.len());
        println!("Images Size: {}", format_size(info.images_size()));
    }
    println!("Bundle Size: {}", format_size(info.bundle_size));

    let images = &info.manifest.images;
    if !images.is_empty() {
        println!();
        println!("{}:", style("Container Images").cyan().bold());
        display::print_image_list(
            images.iter().map(|entry| &entry.image),
            images.len(),
            LISTED_IMAGES,
        );
    }

    Ok(())
}
