//! Chart source classification

use std::path::{Path, PathBuf};

use crate::error::{DiscoveryError, Result};

const REMOTE_SCHEMES: [&str; 3] = ["http://", "https://", "oci://"];
const ARCHIVE_SUFFIXES: [&str; 2] = [".tgz", ".tar.gz"];

/// Where a chart comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// Fetched by the chart tool (`http://`, `https://`, `oci://`)
    Remote(String),
    /// A chart directory, used in place
    Directory(PathBuf),
    /// A packaged chart, extracted into a workspace
    Archive(PathBuf),
}

impl ChartSource {
    /// Classify a user-supplied chart location
    pub fn parse(input: &str) -> Result<Self> {
        if REMOTE_SCHEMES.iter().any(|scheme| input.starts_with(scheme)) {
            return Ok(ChartSource::Remote(input.to_string()));
        }

        let path = Path::new(input);
        if path.is_dir() {
            return Ok(ChartSource::Directory(path.to_path_buf()));
        }

        if path.is_file() {
            if ARCHIVE_SUFFIXES.iter().any(|suffix| input.ends_with(suffix)) {
                return Ok(ChartSource::Archive(path.to_path_buf()));
            }
            return Err(DiscoveryError::UnsupportedSource {
                source_path: input.to_string(),
            });
        }

        Err(DiscoveryError::SourceNotFound {
            source_path: input.to_string(),
        })
    }
}

impl std::fmt::Display for ChartSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartSource::Remote(url) => write!(f, "{}", url),
            ChartSource::Directory(path) | ChartSource::Archive(path) => {
                write!(f, "{}", path.display())
            }
        }
    }
}
