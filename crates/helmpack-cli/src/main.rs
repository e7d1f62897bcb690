//! helmpack CLI - air-gapped bundles of Helm charts and their images

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use helmpack_client::{ClientConfig, PASSWORD_ENV, USER_ENV};

mod commands;
mod display;
mod error;
mod exit_codes;
mod util;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "helmpack")]
#[command(author = "helmpack Contributors")]
#[command(version)]
#[command(about = "Bundle Helm charts and their container images for air-gapped registries", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short = 'v', long, global = true)]
    debug: bool,

    /// Configuration file [default: ~/.config/helmpack/config.yaml]
    #[arg(long, global = true, env = "HELMPACK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the dependency tree and container images of a chart
    Analyze {
        /// Chart directory, .tgz archive, or http(s):// / oci:// URL
        chart: String,

        /// Print the resolved chart tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bundle a chart, its dependencies and its images
    Pack {
        /// Chart directory, .tgz archive, or http(s):// / oci:// URL
        chart: String,

        /// Output directory for the bundle
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// List images in the manifest without pulling them
        #[arg(long)]
        no_images: bool,
    },

    /// Push a bundle's images and relocated chart into a registry
    Import {
        /// Bundle file (.helmpack.tgz)
        bundle: PathBuf,

        /// Registry URL
        #[arg(long)]
        registry_url: String,

        /// Registry user
        #[arg(long, env = USER_ENV)]
        user: Option<String>,

        /// Registry password
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,

        /// Target project [default: from config, else library]
        #[arg(long)]
        project: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,
    },

    /// Show a bundle's manifest without importing it
    #[command(alias = "info")]
    Inspect {
        /// Bundle file (.helmpack.tgz)
        bundle: PathBuf,
    },

    /// Check registry API access and container runtime login
    TestRegistry {
        /// Registry URL
        #[arg(long)]
        registry_url: String,

        /// Registry user
        #[arg(long, env = USER_ENV)]
        user: Option<String>,

        /// Registry password
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: Option<String>,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ClientConfig> {
    match path {
        Some(path) => ClientConfig::load_from(path).map_err(|e| CliError::Other {
            message: format!("Cannot load configuration: {}", e),
            help: None,
        }),
        None => Ok(ClientConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Ignoring configuration file: {}", e);
            ClientConfig::default()
        })),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { chart, json } => commands::analyze::run(&chart, json, &config),

        Commands::Pack {
            chart,
            output,
            no_images,
        } => commands::pack::run(&chart, &output, no_images, &config),

        Commands::Import {
            bundle,
            registry_url,
            user,
            password,
            project,
            insecure,
        } => {
            let project = project.unwrap_or_else(|| config.default_project.clone());
            commands::import::run(
                commands::import::ImportArgs {
                    bundle: &bundle,
                    registry_url: &registry_url,
                    user,
                    password,
                    project: &project,
                    insecure,
                },
                &config,
            )
        }

        Commands::Inspect { bundle } => commands::inspect::run(&bundle),

        Commands::TestRegistry {
            registry_url,
            user,
            password,
            insecure,
        } => commands::test_registry::run(&registry_url, user, password, insecure, &config),
    }
}

fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    if let Err(err) = run(cli) {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
    std::process::exit(exit_codes::SUCCESS);
}
