//! In-memory collaborators for testing
//!
//! Both mocks are cheap to clone and share their state, so a test keeps a
//! clone for assertions while the session under test owns the other.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use helmpack_core::{ChartMetadata, create_archive, encode_reference};

use crate::chart_tool::ChartTool;
use crate::credentials::RegistryCredentials;
use crate::error::{ClientError, Result};
use crate::runtime::{ContainerRuntime, ImageHandle};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn failure(command: &str, message: &str) -> ClientError {
    ClientError::CommandFailed {
        command: command.to_string(),
        status: "exit code 1".to_string(),
        stderr: message.to_string(),
    }
}

fn chart_name(chart_dir: &Path) -> String {
    std::fs::read_to_string(chart_dir.join("Chart.yaml"))
        .ok()
        .and_then(|content| ChartMetadata::parse(&content).ok())
        .map(|meta| meta.name)
        .unwrap_or_else(|| {
            chart_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        })
}

#[derive(Debug, Default)]
struct ChartToolState {
    remote: HashMap<String, PathBuf>,
    renders: HashMap<String, String>,
    render_failures: HashSet<String>,
    fail_dependency_update: bool,
    fail_login: bool,
    fail_push: bool,
    operations: Vec<String>,
    packaged: Vec<BTreeMap<String, String>>,
    pushed: Vec<(String, String)>,
}

/// In-memory [`ChartTool`]
///
/// Rendering is keyed by the chart name found in `Chart.yaml`. Charts
/// without a configured render produce empty output.
#[derive(Clone, Default)]
pub struct MockChartTool {
    state: Arc<Mutex<ChartToolState>>,
}

impl MockChartTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `source` by copying the chart directory `chart_dir`
    pub fn with_remote(self, source: &str, chart_dir: &Path) -> Self {
        lock(&self.state)
            .remote
            .insert(source.to_string(), chart_dir.to_path_buf());
        self
    }

    /// Render output for the chart named `chart`
    pub fn with_render(self, chart: &str, output: &str) -> Self {
        lock(&self.state)
            .renders
            .insert(chart.to_string(), output.to_string());
        self
    }

    /// Make rendering the chart named `chart` fail
    pub fn with_render_failure(self, chart: &str) -> Self {
        lock(&self.state).render_failures.insert(chart.to_string());
        self
    }

    pub fn with_dependency_update_failure(self) -> Self {
        lock(&self.state).fail_dependency_update = true;
        self
    }

    pub fn with_login_failure(self) -> Self {
        lock(&self.state).fail_login = true;
        self
    }

    pub fn with_push_failure(self) -> Self {
        lock(&self.state).fail_push = true;
        self
    }

    /// Every call made so far, in order
    pub fn operations(&self) -> Vec<String> {
        lock(&self.state).operations.clone()
    }

    /// Text files of each packaged chart, keyed by relative path
    pub fn packaged(&self) -> Vec<BTreeMap<String, String>> {
        lock(&self.state).packaged.clone()
    }

    /// `(archive file name, destination)` of each push
    pub fn pushed(&self) -> Vec<(String, String)> {
        lock(&self.state).pushed.clone()
    }

    fn record(&self, operation: String) {
        lock(&self.state).operations.push(operation);
    }
}

impl ChartTool for MockChartTool {
    fn fetch(&self, source: &str, dest: &Path) -> Result<()> {
        self.record(format!("fetch {}", source));
        let chart_dir = lock(&self.state).remote.get(source).cloned();
        let chart_dir = chart_dir.ok_or_else(|| failure("helm pull", "chart not found"))?;

        let target = dest.join(chart_name(&chart_dir));
        helmpack_core::copy_tree(&chart_dir, &target)
            .map_err(|e| failure("helm pull", &e.to_string()))
    }

    fn update_dependencies(&self, chart_dir: &Path) -> Result<()> {
        self.record(format!("dependency update {}", chart_name(chart_dir)));
        if lock(&self.state).fail_dependency_update {
            return Err(failure("helm dependency update", "repository unreachable"));
        }
        Ok(())
    }

    fn render(&self, chart_dir: &Path, release_name: &str) -> Result<String> {
        let name = chart_name(chart_dir);
        self.record(format!("template {} {}", release_name, name));

        let state = lock(&self.state);
        if state.render_failures.contains(&name) {
            return Err(failure("helm template", "template rendering failed"));
        }
        Ok(state.renders.get(&name).cloned().unwrap_or_default())
    }

    fn package(&self, chart_dir: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let content = std::fs::read_to_string(chart_dir.join("Chart.yaml"))?;
        let meta = ChartMetadata::parse(&content)
            .map_err(|e| failure("helm package", &e.to_string()))?;
        self.record(format!("package {}", meta.name));

        let mut files = BTreeMap::new();
        for entry in walkdir_files(chart_dir)? {
            if let Ok(text) = std::fs::read_to_string(&entry) {
                if let Ok(rel) = entry.strip_prefix(chart_dir) {
                    files.insert(rel.to_string_lossy().replace('\\', "/"), text);
                }
            }
        }
        lock(&self.state).packaged.push(files);

        std::fs::create_dir_all(dest_dir)?;
        let output = dest_dir.join(format!("{}-{}.tgz", meta.name, meta.version));
        create_archive(chart_dir, &meta.name, &output)
            .map_err(|e| failure("helm package", &e.to_string()))
    }

    fn login(&self, host: &str, _credentials: &RegistryCredentials) -> Result<()> {
        self.record(format!("registry login {}", host));
        if lock(&self.state).fail_login {
            return Err(failure("helm registry login", "unauthorized"));
        }
        Ok(())
    }

    fn push(&self, archive: &Path, destination: &str) -> Result<()> {
        let file = archive
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.record(format!("push {} {}", file, destination));

        let mut state = lock(&self.state);
        if state.fail_push {
            return Err(failure("helm push", "denied: requested access is forbidden"));
        }
        state.pushed.push((file, destination.to_string()));
        Ok(())
    }
}

fn walkdir_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| failure("helm package", &e.to_string()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

const SAVED_PREFIX: &str = "mock-image:";

#[derive(Debug, Default)]
struct RuntimeState {
    missing: HashSet<String>,
    push_failures: HashSet<String>,
    fail_login: bool,
    operations: Vec<String>,
    tags: Vec<(String, String)>,
    pushed: Vec<String>,
    removed: Vec<String>,
}

/// In-memory [`ContainerRuntime`]
///
/// Every reference can be pulled unless marked missing. Saved archives are
/// small text files naming the reference, which `load` reads back.
#[derive(Clone, Default)]
pub struct MockRuntime {
    state: Arc<Mutex<RuntimeState>>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make pulling `reference` fail
    pub fn with_missing(self, reference: &str) -> Self {
        lock(&self.state).missing.insert(reference.to_string());
        self
    }

    /// Make pushing `reference` fail
    pub fn with_push_failure(self, reference: &str) -> Self {
        lock(&self.state)
            .push_failures
            .insert(reference.to_string());
        self
    }

    pub fn with_login_failure(self) -> Self {
        lock(&self.state).fail_login = true;
        self
    }

    /// The image ID the mock assigns to `reference`
    pub fn image_id(reference: &str) -> String {
        format!("sha256:{}", encode_reference(reference))
    }

    /// Every call made so far, in order
    pub fn operations(&self) -> Vec<String> {
        lock(&self.state).operations.clone()
    }

    /// `(source, target)` of each tag
    pub fn tags(&self) -> Vec<(String, String)> {
        lock(&self.state).tags.clone()
    }

    /// References pushed successfully
    pub fn pushed(&self) -> Vec<String> {
        lock(&self.state).pushed.clone()
    }

    /// Image IDs removed
    pub fn removed(&self) -> Vec<String> {
        lock(&self.state).removed.clone()
    }

    fn record(&self, operation: String) {
        lock(&self.state).operations.push(operation);
    }
}

impl ContainerRuntime for MockRuntime {
    fn pull(&self, reference: &str) -> Result<ImageHandle> {
        self.record(format!("pull {}", reference));
        if lock(&self.state).missing.contains(reference) {
            return Err(failure(
                "docker pull",
                &format!("manifest for {} not found", reference),
            ));
        }
        Ok(ImageHandle::new(
            Self::image_id(reference),
            Some(reference.to_string()),
        ))
    }

    fn save(&self, image: &ImageHandle, dest: &Path) -> Result<u64> {
        self.record(format!("save {}", image.name()));
        let content = format!("{}{}\n", SAVED_PREFIX, image.name());
        std::fs::write(dest, &content)?;
        Ok(content.len() as u64)
    }

    fn load(&self, archive: &Path) -> Result<Vec<ImageHandle>> {
        self.record(format!("load {}", archive.display()));
        let content = std::fs::read_to_string(archive)?;
        let reference = content
            .trim()
            .strip_prefix(SAVED_PREFIX)
            .ok_or_else(|| ClientError::UnexpectedOutput {
                command: "docker load".to_string(),
                message: format!("no image loaded from {}", archive.display()),
            })?;
        Ok(vec![ImageHandle::new(
            Self::image_id(reference),
            Some(reference.to_string()),
        )])
    }

    fn tag(&self, image: &ImageHandle, target: &str) -> Result<()> {
        self.record(format!("tag {} {}", image.name(), target));
        lock(&self.state)
            .tags
            .push((image.name().to_string(), target.to_string()));
        Ok(())
    }

    fn push(&self, reference: &str) -> Result<()> {
        self.record(format!("push {}", reference));
        let mut state = lock(&self.state);
        if state.push_failures.contains(reference) {
            return Err(failure("docker push", "denied"));
        }
        state.pushed.push(reference.to_string());
        Ok(())
    }

    fn remove(&self, image: &ImageHandle) -> Result<()> {
        self.record(format!("rmi {}", image.id));
        lock(&self.state).removed.push(image.id.clone());
        Ok(())
    }

    fn login(&self, host: &str, _credentials: &RegistryCredentials) -> Result<()> {
        self.record(format!("login {}", host));
        if lock(&self.state).fail_login {
            return Err(failure("docker login", "unauthorized: incorrect username or password"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_runtime_save_load_cycle() {
        let temp = TempDir::new().unwrap();
        let runtime = MockRuntime::new();
        let observer = runtime.clone();

        let handle = runtime.pull("myorg/app:2.1").unwrap();
        let archive = temp.path().join("app.tar");
        let size = runtime.save(&handle, &archive).unwrap();
        assert!(size > 0);

        let loaded = runtime.load(&archive).unwrap();
        assert_eq!(loaded, vec![handle.clone()]);

        runtime.tag(&loaded[0], "harbor.local/library/app:2.1").unwrap();
        runtime.push("harbor.local/library/app:2.1").unwrap();
        runtime.remove(&loaded[0]).unwrap();

        assert_eq!(observer.pushed(), vec!["harbor.local/library/app:2.1"]);
        assert_eq!(observer.removed(), vec![MockRuntime::image_id("myorg/app:2.1")]);
        assert_eq!(observer.operations().len(), 6);
    }

    #[test]
    fn test_runtime_configured_failures() {
        let runtime = MockRuntime::new()
            .with_missing("ghost:1")
            .with_push_failure("harbor.local/library/app:1")
            .with_login_failure();

        assert!(runtime.pull("ghost:1").is_err());
        assert!(runtime.push("harbor.local/library/app:1").is_err());
        assert!(
            runtime
                .login("harbor.local", &RegistryCredentials::new("a", "b"))
                .is_err()
        );
        assert!(runtime.pushed().is_empty());
    }

    #[test]
    fn test_chart_tool_render_by_chart_name() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Chart.yaml"), "name: app\nversion: 1.0.0\n").unwrap();

        let tool = MockChartTool::new().with_render("app", "image: nginx\n");
        assert_eq!(
            tool.render(temp.path(), "test-release").unwrap(),
            "image: nginx\n"
        );

        let tool = MockChartTool::new().with_render_failure("app");
        assert!(tool.render(temp.path(), "test-release").is_err());
        assert_eq!(tool.operations(), vec!["template test-release app"]);
    }

    #[test]
    fn test_chart_tool_fetch_and_package() {
        let temp = TempDir::new().unwrap();
        let chart = temp.path().join("src");
        std::fs::create_dir_all(chart.join("templates")).unwrap();
        std::fs::write(chart.join("Chart.yaml"), "name: app\nversion: 1.0.0\n").unwrap();
        std::fs::write(chart.join("templates/cm.yaml"), "data: {}\n").unwrap();

        let tool = MockChartTool::new().with_remote("oci://example.com/charts/app", &chart);
        let dest = temp.path().join("fetched");
        std::fs::create_dir_all(&dest).unwrap();
        tool.fetch("oci://example.com/charts/app", &dest).unwrap();
        assert!(dest.join("app/templates/cm.yaml").is_file());
        assert!(tool.fetch("oci://example.com/charts/other", &dest).is_err());

        let archive = tool.package(&dest.join("app"), &temp.path().join("out")).unwrap();
        assert!(archive.ends_with("app-1.0.0.tgz"));
        assert!(archive.is_file());
        assert_eq!(
            tool.packaged()[0].get("templates/cm.yaml").map(String::as_str),
            Some("data: {}\n")
        );
    }
}
