//! Import command - publish a bundle into a private registry

use console::style;
use std::path::Path;

use helmpack_bundle::{ImportTarget, Importer};
use helmpack_client::{ClientConfig, DockerCli, HelmCli, RegistryCredentials};

use crate::display;
use crate::error::{CliError, Result};

pub struct ImportArgs<'a> {
    pub bundle: &'a Path,
    pub registry_url: &'a str,
    pub user: Option<String>,
    pub password: Option<String>,
    pub project: &'a str,
    pub insecure: bool,
}

pub fn run(args: ImportArgs<'_>, config: &ClientConfig) -> Result<()> {
    if !args.bundle.is_file() {
        return Err(CliError::bundle(format!(
            "bundle not found: {}",
            args.bundle.display()
        )));
    }

    let credentials = RegistryCredentials::resolve(args.user, args.password)?;
    let target = ImportTarget::new(args.registry_url, args.project, credentials);

    let importer = Importer::new(
        DockerCli::new(&config.docker_binary),
        HelmCli::new(&config.helm_binary).with_insecure(args.insecure),
        target,
    );
    let report = importer.import(args.bundle)?;
    let target = importer.target();

    display::header("Import Summary");
    println!("Chart: {} v{}", report.chart_name, report.chart_version);
    println!("Registry: {}", target.host());
    println!("Project: {}", target.project);
    println!();

    if report.logged_in {
        println!("Images pushed: {}", report.images_pushed.len());
    } else {
        display::warning("Registry login failed, images were not pushed");
    }
    if !report.images_skipped.is_empty() {
        println!(
            "Images not in bundle: {} {}",
            report.images_skipped.len(),
            style("(must already exist in the registry)").dim()
        );
    }
    for (reference, reason) in &report.images_failed {
        display::failure(&format!("{} {}", reference, style(reason).dim()));
    }

    println!("References relocated: {}", report.mapping.len());
    println!("Files rewritten: {}", report.relocation.modified.len());
    for path in &report.relocation.skipped {
        display::warning(&format!("Could not rewrite {}", path.display()));
    }

    println!();
    if report.chart_pushed {
        display::success(&format!("Chart pushed to {}", target.chart_destination()));
        println!();
        println!("You can now deploy the chart using:");
        println!(
            "  helm install <release-name> {}/{}",
            target.chart_destination(),
            report.chart_name
        );
    } else {
        display::failure(&format!(
            "Chart was not pushed to {}",
            target.chart_destination()
        ));
    }

    Ok(())
}
