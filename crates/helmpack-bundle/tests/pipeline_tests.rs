//! Analyze, pack and import a chart with mock collaborators

use std::path::Path;

use helmpack_bundle::{BundleInfo, ImportTarget, Importer, PackOptions, Packager};
use helmpack_client::{MockChartTool, MockRuntime, RegistryCredentials};
use helmpack_core::create_archive;
use helmpack_discovery::ChartResolver;
use tempfile::TempDir;

fn write_chart(dir: &Path, chart_yaml: &str, values: &str) {
    std::fs::create_dir_all(dir.join("templates")).unwrap();
    std::fs::write(dir.join("Chart.yaml"), chart_yaml).unwrap();
    std::fs::write(dir.join("values.yaml"), values).unwrap();
}

/// `app` with a packaged `redis` dependency
fn app_chart(root: &Path) -> std::path::PathBuf {
    let redis = root.join("redis-src");
    write_chart(&redis, "name: redis\nversion: 18.0.0\n", "image: bitnami/redis:7.2\n");

    let app = root.join("app");
    write_chart(
        &app,
        "name: app\nversion: 1.0.0\ndependencies:\n  - name: redis\n    version: 18.x\n",
        "image: myorg/app:2.1\n",
    );
    std::fs::write(
        app.join("templates/deployment.yaml"),
        "containers:\n  - image: {{ .Values.image }}\n",
    )
    .unwrap();
    std::fs::create_dir_all(app.join("charts")).unwrap();
    create_archive(&redis, "redis", &app.join("charts/redis-18.0.0.tgz")).unwrap();
    app
}

#[test]
fn test_analyze_pack_import() {
    let temp = TempDir::new().unwrap();
    let app = app_chart(temp.path());

    let tool = MockChartTool::new().with_render(
        "app",
        "---\nkind: Deployment\nspec:\n  containers:\n    - image: myorg/app:2.1\n",
    );
    let mut resolver = ChartResolver::new(tool);
    let node = resolver.resolve(app.to_str().unwrap()).unwrap();

    assert_eq!(
        node.flattened_images()
            .iter()
            .map(|i| i.full_reference.as_str())
            .collect::<Vec<_>>(),
        vec!["myorg/app:2.1", "bitnami/redis:7.2"]
    );

    let outcome = Packager::new(
        Some(MockRuntime::new()),
        PackOptions {
            output_dir: temp.path().join("out"),
            embed_images: true,
        },
    )
    .pack(&node)
    .unwrap();
    assert_eq!(outcome.embedded, 2);

    let info = BundleInfo::read(&outcome.bundle_path).unwrap();
    assert_eq!(info.manifest.metadata.total_images, 2);
    assert_eq!(info.manifest.metadata.total_dependencies, 1);
    assert_eq!(info.image_archives.len(), 2);

    let runtime = MockRuntime::new();
    let chart_tool = MockChartTool::new();
    let importer = Importer::new(
        runtime.clone(),
        chart_tool.clone(),
        ImportTarget::new(
            "harbor.example.com",
            "library",
            RegistryCredentials::new("admin", "secret"),
        ),
    );
    let report = importer.import(&outcome.bundle_path).unwrap();

    assert_eq!(
        runtime.pushed(),
        vec![
            "harbor.example.com/library/app:2.1",
            "harbor.example.com/library/redis:7.2",
        ]
    );
    assert!(report.chart_pushed);

    let packaged = chart_tool.packaged();
    assert_eq!(
        packaged[0]["values.yaml"],
        "image: harbor.example.com/library/app:2.1\n"
    );
    // Template placeholders are left alone
    assert_eq!(
        packaged[0]["templates/deployment.yaml"],
        "containers:\n  - image: {{ .Values.image }}\n"
    );
}

#[test]
fn test_workspaces_are_removed() {
    let temp = TempDir::new().unwrap();
    let app = app_chart(temp.path());
    let archive = temp.path().join("app-1.0.0.tgz");
    create_archive(&app, "app", &archive).unwrap();

    let mut resolver = ChartResolver::new(MockChartTool::new());
    let node = resolver.resolve(archive.to_str().unwrap()).unwrap();
    let workspaces = resolver.workspace_paths();

    let outcome = Packager::new(
        None::<MockRuntime>,
        PackOptions {
            output_dir: temp.path().join("out"),
            embed_images: false,
        },
    )
    .pack(&node)
    .unwrap();
    assert!(outcome.bundle_path.is_file());

    drop(resolver);
    assert!(workspaces.iter().all(|w| !w.exists()));
}

#[test]
fn test_template_image_is_relocated() {
    let temp = TempDir::new().unwrap();
    let app = temp.path().join("app");
    std::fs::create_dir_all(app.join("templates")).unwrap();
    std::fs::write(app.join("Chart.yaml"), "name: app\nversion: 1.0.0\n").unwrap();
    std::fs::write(
        app.join("templates/deployment.yaml"),
        "containers:\n  - image: myorg/app:2.1\n",
    )
    .unwrap();

    let mut resolver = ChartResolver::new(MockChartTool::new().with_render_failure("app"));
    let node = resolver.resolve(app.to_str().unwrap()).unwrap();
    assert_eq!(node.images.len(), 1);
    assert_eq!(node.images[0].registry, "docker.io");
    assert_eq!(node.images[0].repository, "myorg/app");
    assert_eq!(node.images[0].tag, "2.1");

    let outcome = Packager::new(
        None::<MockRuntime>,
        PackOptions {
            output_dir: temp.path().join("out"),
            embed_images: false,
        },
    )
    .pack(&node)
    .unwrap();

    let chart_tool = MockChartTool::new();
    let report = Importer::new(
        MockRuntime::new(),
        chart_tool.clone(),
        ImportTarget::new(
            "harbor.example.com",
            "library",
            RegistryCredentials::new("admin", "secret"),
        ),
    )
    .import(&outcome.bundle_path)
    .unwrap();

    assert_eq!(report.images_skipped.len(), 1);
    assert_eq!(
        chart_tool.packaged()[0]["templates/deployment.yaml"],
        "containers:\n  - image: harbor.example.com/library/app:2.1\n"
    );
}
