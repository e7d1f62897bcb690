//! Archive creation and extraction for bundles and charts
//!
//! Bundles are `.tgz` files with a single top-level directory. Entries are
//! written in sorted order with a zero mtime so identical inputs produce
//! identical archives.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, EntryType, Header};

use crate::error::{CoreError, Result};

/// Create a `.tgz` archive of `source_dir`, rooted at `top_level/`
///
/// Returns the path to the created archive file.
pub fn create_archive(source_dir: &Path, top_level: &str, output: &Path) -> Result<PathBuf> {
    if !source_dir.is_dir() {
        return Err(CoreError::Archive {
            message: format!("Not a directory: {}", source_dir.display()),
        });
    }

    let file = File::create(output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    add_dir_to_archive(&mut builder, top_level)?;

    for entry in walkdir::WalkDir::new(source_dir)
        .min_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| CoreError::Archive {
                message: e.to_string(),
            })?;
        let archive_path = format!("{}/{}", top_level, to_archive_path(rel));

        if entry.path().is_dir() {
            add_dir_to_archive(&mut builder, &archive_path)?;
        } else {
            add_file_to_archive(&mut builder, entry.path(), &archive_path)?;
        }
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?;

    Ok(output.to_path_buf())
}

/// Extract an archive to a destination directory
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    std::fs::create_dir_all(dest)?;

    archive.unpack(dest).map_err(|e| CoreError::Archive {
        message: format!("Failed to extract {}: {}", archive_path.display(), e),
    })?;

    Ok(())
}

/// Find the single directory directly below `dir`
///
/// Charts and bundles unpack to exactly one top-level directory. Zero or
/// several candidates are an error rather than a guess.
pub fn single_top_level_dir(dir: &Path) -> Result<PathBuf> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }

    match dirs.len() {
        1 => Ok(dirs.remove(0)),
        0 => Err(CoreError::Archive {
            message: format!("No top-level directory found in {}", dir.display()),
        }),
        n => {
            dirs.sort();
            let names: Vec<String> = dirs
                .iter()
                .filter_map(|d| d.file_name().map(|n| n.to_string_lossy().to_string()))
                .collect();
            Err(CoreError::Archive {
                message: format!(
                    "Ambiguous archive layout: {} top-level directories ({})",
                    n,
                    names.join(", ")
                ),
            })
        }
    }
}

/// List files in an archive
pub fn list_archive(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let path = entry.path()?.to_string_lossy().to_string();
        let size = entry.header().size()?;
        let is_dir = entry.header().entry_type().is_dir();

        entries.push(ArchiveEntry { path, size, is_dir });
    }

    Ok(entries)
}

/// Read a specific file from an archive
pub fn read_file_from_archive(archive_path: &Path, file_path: &str) -> Result<Vec<u8>> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().to_string();

        if path.trim_start_matches("./") == file_path {
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            return Ok(content);
        }
    }

    Err(CoreError::Archive {
        message: format!("File not found in archive: {}", file_path),
    })
}

/// Recursively copy a directory tree
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)?;

    for entry in walkdir::WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CoreError::Archive {
                message: e.to_string(),
            })?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// File stem for a saved image
///
/// The sha256 of the reference, so distinct references never share a file
/// (`a/b:c` and `a_b_c` would under character substitution).
pub fn encode_reference(full_reference: &str) -> String {
    hex::encode(Sha256::digest(full_reference.as_bytes()))
}

/// Information about a file in an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Relative path within the archive
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

fn to_archive_path(rel: &Path) -> String {
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn add_dir_to_archive<W: Write>(builder: &mut Builder<W>, archive_path: &str) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_entry_type(EntryType::Directory);
    header.set_size(0);
    header.set_mode(0o755);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, format!("{}/", archive_path), std::io::empty())?;

    Ok(())
}

fn add_file_to_archive<W: Write>(
    builder: &mut Builder<W>,
    file_path: &Path,
    archive_path: &str,
) -> Result<()> {
    let file = File::open(file_path)?;
    let size = file.metadata()?.len();

    let mut header = Header::new_gnu();
    header.set_size(size);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, file)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_tree(dir: &Path) {
        std::fs::create_dir_all(dir.join("chart/templates")).unwrap();
        std::fs::create_dir_all(dir.join("images")).unwrap();
        std::fs::write(dir.join("bundle.yaml"), "kind: HelmPackBundle\n").unwrap();
        std::fs::write(dir.join("chart/Chart.yaml"), "name: app\n").unwrap();
        std::fs::write(
            dir.join("chart/templates/deployment.yaml"),
            "image: nginx:1.25\n",
        )
        .unwrap();
    }

    #[test]
    fn test_create_and_extract_archive() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        create_tree(&source);

        let archive_path = temp.path().join("app-1.0.0.helmpack.tgz");
        create_archive(&source, "app-1.0.0", &archive_path).unwrap();
        assert!(archive_path.exists());

        let entries = list_archive(&archive_path).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"app-1.0.0/bundle.yaml"));
        assert!(paths.contains(&"app-1.0.0/chart/templates/deployment.yaml"));
        assert!(entries.iter().any(|e| e.is_dir && e.path == "app-1.0.0/images/"));

        let dest = temp.path().join("out");
        extract_archive(&archive_path, &dest).unwrap();

        let top = single_top_level_dir(&dest).unwrap();
        assert_eq!(top, dest.join("app-1.0.0"));
        assert!(top.join("images").is_dir());
        assert_eq!(
            std::fs::read_to_string(top.join("chart/templates/deployment.yaml")).unwrap(),
            "image: nginx:1.25\n"
        );
    }

    #[test]
    fn test_archives_are_reproducible() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        create_tree(&source);

        let a = temp.path().join("a.tgz");
        let b = temp.path().join("b.tgz");
        create_archive(&source, "app-1.0.0", &a).unwrap();
        create_archive(&source, "app-1.0.0", &b).unwrap();

        assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
    }

    #[test]
    fn test_read_file_from_archive() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        create_tree(&source);
        let archive_path = temp.path().join("bundle.tgz");
        create_archive(&source, "app-1.0.0", &archive_path).unwrap();

        let content = read_file_from_archive(&archive_path, "app-1.0.0/bundle.yaml").unwrap();
        assert_eq!(content, b"kind: HelmPackBundle\n");

        let err = read_file_from_archive(&archive_path, "missing.yaml").unwrap_err();
        assert!(matches!(err, CoreError::Archive { .. }));
    }

    #[test]
    fn test_single_top_level_dir_rejects_zero_and_many() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("stray.txt"), "").unwrap();
        assert!(single_top_level_dir(temp.path()).is_err());

        std::fs::create_dir(temp.path().join("one")).unwrap();
        assert_eq!(
            single_top_level_dir(temp.path()).unwrap(),
            temp.path().join("one")
        );

        std::fs::create_dir(temp.path().join("two")).unwrap();
        let err = single_top_level_dir(temp.path()).unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[test]
    fn test_copy_tree_is_verbatim() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        create_tree(&source);

        let dest = temp.path().join("copy");
        copy_tree(&source.join("chart"), &dest).unwrap();

        assert_eq!(
            std::fs::read_to_string(dest.join("templates/deployment.yaml")).unwrap(),
            "image: nginx:1.25\n"
        );
        assert!(dest.join("Chart.yaml").is_file());
    }

    #[test]
    fn test_encode_reference() {
        let encoded = encode_reference("docker.io/library/nginx:1.25");
        assert_eq!(encoded.len(), 64);
        assert!(encoded.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(encoded, encode_reference("docker.io/library/nginx:1.25"));
        assert_ne!(encoded, encode_reference("docker.io_library_nginx_1.25"));
    }
}
