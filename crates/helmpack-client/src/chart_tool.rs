//! Chart-management collaborator
//!
//! [`ChartTool`] is the seam between helmpack and the `helm` CLI. Discovery
//! and bundling only ever talk to the trait; [`HelmCli`] shells out and
//! [`crate::mock::MockChartTool`] stands in for tests.

use std::path::{Path, PathBuf};

use crate::credentials::RegistryCredentials;
use crate::error::{ClientError, Result};
use crate::process;

const PACKAGED_MARKER: &str = "Successfully packaged chart and saved it to:";

/// Operations helmpack needs from a chart tool
pub trait ChartTool {
    /// Fetch a remote chart and unpack it into `dest`
    fn fetch(&self, source: &str, dest: &Path) -> Result<()>;

    /// Refresh `charts/` from the dependencies declared in `Chart.yaml`
    fn update_dependencies(&self, chart_dir: &Path) -> Result<()>;

    /// Render the chart's templates with default values
    fn render(&self, chart_dir: &Path, release_name: &str) -> Result<String>;

    /// Package a chart directory into `dest_dir`, returning the archive path
    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf>;

    /// Authenticate against an OCI registry host
    fn login(&self, host: &str, credentials: &RegistryCredentials) -> Result<()>;

    /// Push a packaged chart to `oci://<host>/<project>`
    fn push(&self, archive: &Path, destination: &str) -> Result<()>;
}

/// [`ChartTool`] backed by the `helm` executable
#[derive(Debug, Clone)]
pub struct HelmCli {
    binary: String,
    insecure: bool,
}

impl HelmCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            insecure: false,
        }
    }

    /// Skip TLS verification for registry operations
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Check whether the binary can be executed
    pub fn is_available(&self) -> bool {
        process::check_available(&self.binary)
    }

    fn run(&self, args: Vec<String>) -> Result<String> {
        process::run(&self.binary, &args)
    }
}

impl Default for HelmCli {
    fn default() -> Self {
        Self::new("helm")
    }
}

impl ChartTool for HelmCli {
    fn fetch(&self, source: &str, dest: &Path) -> Result<()> {
        tracing::info!(source, "fetching chart");
        self.run(vec![
            "pull".to_string(),
            source.to_string(),
            "--untar".to_string(),
            "--destination".to_string(),
            dest.display().to_string(),
        ])?;
        Ok(())
    }

    fn update_dependencies(&self, chart_dir: &Path) -> Result<()> {
        self.run(vec![
            "dependency".to_string(),
            "update".to_string(),
            chart_dir.display().to_string(),
        ])?;
        Ok(())
    }

    fn render(&self, chart_dir: &Path, release_name: &str) -> Result<String> {
        self.run(vec![
            "template".to_string(),
            release_name.to_string(),
            chart_dir.display().to_string(),
        ])
    }

    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dest_dir)?;
        let stdout = self.run(vec![
            "package".to_string(),
            chart_dir.display().to_string(),
            "--destination".to_string(),
            dest_dir.display().to_string(),
        ])?;

        if let Some(path) = parse_packaged_path(&stdout) {
            return Ok(path);
        }

        single_archive_in(dest_dir).ok_or_else(|| ClientError::UnexpectedOutput {
            command: format!("{} package", self.binary),
            message: format!("no chart archive found in {}", dest_dir.display()),
        })
    }

    fn login(&self, host: &str, credentials: &RegistryCredentials) -> Result<()> {
        let mut args = vec![
            "registry".to_string(),
            "login".to_string(),
            host.to_string(),
            "--username".to_string(),
            credentials.username.clone(),
            "--password-stdin".to_string(),
        ];
        if self.insecure {
            args.push("--insecure".to_string());
        }
        process::run_with_stdin(&self.binary, &args, Some(&credentials.password))?;
        Ok(())
    }

    fn push(&self, archive: &Path, destination: &str) -> Result<()> {
        tracing::info!(archive = %archive.display(), destination, "pushing chart");
        let mut args = vec![
            "push".to_string(),
            archive.display().to_string(),
            destination.to_string(),
        ];
        if self.insecure {
            args.push("--insecure-skip-tls-verify".to_string());
        }
        self.run(args)?;
        Ok(())
    }
}

/// Extract the archive path from `helm package` output
pub fn parse_packaged_path(stdout: &str) -> Option<PathBuf> {
    stdout.lines().find_map(|line| {
        line.split_once(PACKAGED_MARKER)
            .map(|(_, path)| path.trim())
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
    })
}

fn single_archive_in(dir: &Path) -> Option<PathBuf> {
    let mut archives: Vec<PathBuf> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "tgz").unwrap_or(false))
        .collect();

    if archives.len() == 1 { archives.pop() } else { None }
}
