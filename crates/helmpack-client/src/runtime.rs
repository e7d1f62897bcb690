//! Container runtime collaborator

use std::path::Path;

use crate::credentials::RegistryCredentials;
use crate::error::{ClientError, Result};
use crate::process;

/// An image known to the local runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    /// Image ID, or the reference when the ID is unknown
    pub id: String,
    /// Reference the image was pulled or loaded as
    pub reference: Option<String>,
}

impl ImageHandle {
    pub fn new(id: impl Into<String>, reference: Option<String>) -> Self {
        Self {
            id: id.into(),
            reference,
        }
    }

    /// The string to address the image by (reference if known, else ID)
    pub fn name(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.id)
    }
}

/// Operations helmpack needs from a container runtime
pub trait ContainerRuntime {
    /// Pull an image from its registry
    fn pull(&self, reference: &str) -> Result<ImageHandle>;

    /// Save an image to a tar archive, returning its size in bytes
    fn save(&self, image: &ImageHandle, dest: &Path) -> Result<u64>;

    /// Load images from a tar archive
    fn load(&self, archive: &Path) -> Result<Vec<ImageHandle>>;

    /// Add a tag to a local image
    fn tag(&self, image: &ImageHandle, target: &str) -> Result<()>;

    /// Push a tagged image
    fn push(&self, reference: &str) -> Result<()>;

    /// Remove a local image and all its tags
    fn remove(&self, image: &ImageHandle) -> Result<()>;

    /// Authenticate against a registry host
    fn login(&self, host: &str, credentials: &RegistryCredentials) -> Result<()>;
}

/// [`ContainerRuntime`] backed by the `docker` executable
#[derive(Debug, Clone)]
pub struct DockerCli {
    binary: String,
}

impl DockerCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Check whether the daemon answers
    pub fn is_available(&self) -> bool {
        process::check_available(&self.binary)
    }

    fn run(&self, args: Vec<String>) -> Result<String> {
        process::run(&self.binary, &args)
    }

    fn image_id(&self, reference: &str) -> Result<String> {
        let out = self.run(vec![
            "image".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Id}}".to_string(),
            reference.to_string(),
        ])?;
        let id = out.trim();
        if id.is_empty() {
            return Err(ClientError::ImageNotFound {
                reference: reference.to_string(),
            });
        }
        Ok(id.to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerRuntime for DockerCli {
    fn pull(&self, reference: &str) -> Result<ImageHandle> {
        self.run(vec!["pull".to_string(), reference.to_string()])?;
        let id = self.image_id(reference)?;
        Ok(ImageHandle::new(id, Some(reference.to_string())))
    }

    fn save(&self, image: &ImageHandle, dest: &Path) -> Result<u64> {
        self.run(vec![
            "save".to_string(),
            "-o".to_string(),
            dest.display().to_string(),
            image.name().to_string(),
        ])?;
        Ok(std::fs::metadata(dest)?.len())
    }

    fn load(&self, archive: &Path) -> Result<Vec<ImageHandle>> {
        let out = self.run(vec![
            "load".to_string(),
            "-i".to_string(),
            archive.display().to_string(),
        ])?;

        let handles = parse_load_output(&out);
        if handles.is_empty() {
            return Err(ClientError::UnexpectedOutput {
                command: format!("{} load", self.binary),
                message: format!("no image loaded from {}", archive.display()),
            });
        }

        // Resolve IDs so removal drops every tag of the loaded image
        Ok(handles
            .into_iter()
            .map(|handle| match &handle.reference {
                Some(reference) => match self.image_id(reference) {
                    Ok(id) => ImageHandle::new(id, handle.reference.clone()),
                    Err(_) => handle,
                },
                None => handle,
            })
            .collect())
    }

    fn tag(&self, image: &ImageHandle, target: &str) -> Result<()> {
        self.run(vec![
            "tag".to_string(),
            image.name().to_string(),
            target.to_string(),
        ])?;
        Ok(())
    }

    fn push(&self, reference: &str) -> Result<()> {
        self.run(vec!["push".to_string(), reference.to_string()])?;
        Ok(())
    }

    fn remove(&self, image: &ImageHandle) -> Result<()> {
        self.run(vec!["rmi".to_string(), "-f".to_string(), image.id.clone()])?;
        Ok(())
    }

    fn login(&self, host: &str, credentials: &RegistryCredentials) -> Result<()> {
        let args = vec![
            "login".to_string(),
            host.to_string(),
            "--username".to_string(),
            credentials.username.clone(),
            "--password-stdin".to_string(),
        ];
        process::run_with_stdin(&self.binary, &args, Some(&credentials.password))?;
        Ok(())
    }
}

/// Parse `docker load` output into handles
///
/// Named images print `Loaded image: <ref>`, untagged ones
/// `Loaded image ID: <id>`.
pub fn parse_load_output(stdout: &str) -> Vec<ImageHandle> {
    stdout
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if let Some(id) = line.strip_prefix("Loaded image ID:") {
                Some(ImageHandle::new(id.trim(), None))
            } else {
                line.strip_prefix("Loaded image:").map(|reference| {
                    let reference = reference.trim();
                    ImageHandle::new(reference, Some(reference.to_string()))
                })
            }
        })
        .filter(|handle| !handle.id.is_empty())
        .collect()
}
