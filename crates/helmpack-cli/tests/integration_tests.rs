//! Integration tests for CLI commands
//!
//! The binary runs against a configuration naming chart and container
//! tools that do not exist, so rendering falls back to text search and
//! nothing ever reaches a real registry.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use helmpack_core::{copy_tree, create_archive};
use tempfile::TempDir;

const BUNDLE_ERROR: i32 = 6;
const CHART_ERROR: i32 = 4;
const REGISTRY_ERROR: i32 = 7;

/// Get the fixtures path
fn fixtures_path() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../fixtures")
}

/// A scratch area holding a config file and a copy of the `app` chart
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.yaml"),
            "helmBinary: helmpack-test-missing-helm\ndockerBinary: helmpack-test-missing-docker\n",
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Copy of `fixtures/app` with `redis` packaged under `charts/`
    fn app_chart(&self) -> PathBuf {
        let fixtures = Path::new(fixtures_path());
        let app = self.path().join("app");
        copy_tree(&fixtures.join("app"), &app).unwrap();
        std::fs::create_dir_all(app.join("charts")).unwrap();
        create_archive(
            &fixtures.join("redis"),
            "redis",
            &app.join("charts/redis-18.0.0.tgz"),
        )
        .unwrap();
        app
    }

    fn helmpack(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_helmpack"))
            .args(args)
            .env("HELMPACK_CONFIG", self.path().join("config.yaml"))
            .env_remove("HELMPACK_REGISTRY_USER")
            .env_remove("HELMPACK_REGISTRY_PASSWORD")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to execute helmpack")
    }

    /// Pack the fixture chart without images and return the bundle path
    fn bundle(&self) -> PathBuf {
        let app = self.app_chart();
        let out = self.path().join("out");
        let output = self.helmpack(&[
            "pack",
            app.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--no-images",
        ]);
        assert!(
            output.status.success(),
            "pack failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        out.join("app-1.0.0.helmpack.tgz")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

mod analyze_command {
    use super::*;

    #[test]
    fn test_analyze_json() {
        let ws = Workspace::new();
        let app = ws.app_chart();

        let output = ws.helmpack(&["analyze", app.to_str().unwrap(), "--json"]);
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_str(&stdout(&output)).expect("Output should be valid JSON");
        assert_eq!(json["name"], "app");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["dependencies"][0]["name"], "redis");

        let images: Vec<&str> = json["images"]
            .as_array()
            .unwrap()
            .iter()
            .map(|i| i["full_reference"].as_str().unwrap())
            .collect();
        assert_eq!(
            images,
            vec![
                "myorg/migrate:1.0",
                "myorg/app:2.1",
                "busybox:1.36",
                "nginx:1.25",
                "bitnami/redis:7.2",
            ]
        );
        assert_eq!(json["images"][4]["chart_source"], "redis");
    }

    #[test]
    fn test_analyze_human_output() {
        let ws = Workspace::new();
        let app = ws.app_chart();

        let output = ws.helmpack(&["analyze", app.to_str().unwrap()]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        assert!(stdout.contains("Chart Analysis: app v1.0.0"));
        assert!(stdout.contains("From redis"));
        assert!(stdout.contains("bitnami/redis:7.2"));
        assert!(stdout.contains("images were found by text search"));
    }

    #[test]
    fn test_analyze_missing_chart() {
        let ws = Workspace::new();
        let missing = ws.path().join("missing");

        let output = ws.helmpack(&["analyze", missing.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(CHART_ERROR));
    }

    #[test]
    fn test_analyze_directory_without_chart_yaml() {
        let ws = Workspace::new();
        let empty = ws.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();

        let output = ws.helmpack(&["analyze", empty.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(CHART_ERROR));
    }
}

mod pack_command {
    use super::*;

    #[test]
    fn test_pack_without_images() {
        let ws = Workspace::new();
        let bundle = ws.bundle();
        assert!(bundle.is_file());
    }

    #[test]
    fn test_pack_summary() {
        let ws = Workspace::new();
        let app = ws.app_chart();
        let out = ws.path().join("bundles");

        let output = ws.helmpack(&[
            "pack",
            app.to_str().unwrap(),
            "--output",
            out.to_str().unwrap(),
        ]);
        assert!(output.status.success());

        // No container runtime: every image is listed, none embedded
        let stdout = stdout(&output);
        assert!(stdout.contains("Total Images: 5 (0 embedded)"));
        assert!(stdout.contains("Bundle created successfully"));
        assert!(out.join("app-1.0.0.helmpack.tgz").is_file());
    }
}

mod inspect_command {
    use super::*;

    #[test]
    fn test_inspect_bundle() {
        let ws = Workspace::new();
        let bundle = ws.bundle();

        let output = ws.helmpack(&["inspect", bundle.to_str().unwrap()]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        assert!(stdout.contains("Chart: app v1.0.0"));
        assert!(stdout.contains("Dependencies: 1"));
        assert!(stdout.contains("Image Archives: Not included"));
        assert!(stdout.contains("myorg/migrate:1.0"));
    }

    #[test]
    fn test_info_alias() {
        let ws = Workspace::new();
        let bundle = ws.bundle();

        let output = ws.helmpack(&["info", bundle.to_str().unwrap()]);
        assert!(output.status.success());
    }

    #[test]
    fn test_inspect_garbage_file() {
        let ws = Workspace::new();
        let garbage = ws.path().join("garbage.helmpack.tgz");
        std::fs::write(&garbage, "not a bundle").unwrap();

        let output = ws.helmpack(&["inspect", garbage.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(BUNDLE_ERROR));
    }
}

mod import_command {
    use super::*;

    #[test]
    fn test_import_requires_credentials() {
        let ws = Workspace::new();
        let bundle = ws.bundle();

        let output = ws.helmpack(&[
            "import",
            bundle.to_str().unwrap(),
            "--registry-url",
            "https://harbor.example.com",
        ]);
        assert_eq!(output.status.code(), Some(REGISTRY_ERROR));
    }

    #[test]
    fn test_import_missing_bundle() {
        let ws = Workspace::new();
        let missing = ws.path().join("missing.helmpack.tgz");

        let output = ws.helmpack(&[
            "import",
            missing.to_str().unwrap(),
            "--registry-url",
            "https://harbor.example.com",
            "--user",
            "admin",
            "--password",
            "secret",
        ]);
        assert_eq!(output.status.code(), Some(BUNDLE_ERROR));
    }

    #[test]
    fn test_import_without_tools_reports_and_succeeds() {
        let ws = Workspace::new();
        let bundle = ws.bundle();

        let output = ws.helmpack(&[
            "import",
            bundle.to_str().unwrap(),
            "--registry-url",
            "https://harbor.example.com",
            "--user",
            "admin",
            "--password",
            "secret",
            "--project",
            "apps",
        ]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        assert!(stdout.contains("Registry login failed"));
        assert!(stdout.contains("References relocated: 5"));
        assert!(stdout.contains("Chart was not pushed to oci://harbor.example.com/apps"));
        assert!(!String::from_utf8_lossy(&output.stderr).contains("secret"));
    }
}

mod help {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let ws = Workspace::new();
        let output = ws.helmpack(&["--help"]);
        assert!(output.status.success());

        let stdout = stdout(&output);
        for command in ["analyze", "pack", "import", "inspect", "test-registry"] {
            assert!(stdout.contains(command), "missing {}", command);
        }
    }
}
