//! Zip bundling for release archives.

use crate::error::PackageError;
use crate::runtime::Runtime;
use anyhow::{Context, Result};
use log::{debug, info};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::FileOptions;

/// One file stored in the archive under a flat entry name.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    pub source: PathBuf,
    pub name: String,
}

impl ArchiveEntry {
    pub fn new(source: PathBuf, name: impl Into<String>) -> Self {
        Self {
            source,
            name: name.into(),
        }
    }
}

/// Writes release archives atomically: the zip is assembled in memory,
/// written to `<dest>.partial`, then renamed onto `dest`. A half-written
/// archive never exists under the final name.
pub struct ZipBundler;

impl ZipBundler {
    /// Bundle `entries` into a zip archive at `dest`, replacing any
    /// existing archive. Entries are stored in the given order.
    pub fn bundle<R: Runtime>(
        &self,
        runtime: &R,
        dest: &Path,
        entries: &[ArchiveEntry],
    ) -> Result<(), PackageError> {
        let buffer = self.assemble(runtime, dest, entries)?;

        let partial = partial_path(dest);
        debug!("Writing archive to {:?}", partial);
        if let Err(reason) = self.commit(runtime, &partial, dest, &buffer) {
            if runtime.exists(&partial) {
                let _ = runtime.remove_file(&partial);
            }
            return Err(PackageError::ArchiveWrite {
                path: dest.to_path_buf(),
                reason,
            });
        }

        info!("Wrote {}", dest.display());
        Ok(())
    }

    fn assemble<R: Runtime>(
        &self,
        runtime: &R,
        dest: &Path,
        entries: &[ArchiveEntry],
    ) -> Result<Vec<u8>, PackageError> {
        // The zip crate requires Write + Seek, but the runtime hands out
        // plain streams, so the archive is assembled in memory first.
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        for entry in entries {
            if !runtime.exists(&entry.source) {
                return Err(PackageError::MissingAsset {
                    path: entry.source.clone(),
                });
            }
            self.append(runtime, &mut zip, entry, options)
                .map_err(|reason| PackageError::ArchiveWrite {
                    path: dest.to_path_buf(),
                    reason,
                })?;
        }

        let cursor = zip
            .finish()
            .context("Failed to finish ZIP archive")
            .map_err(|reason| PackageError::ArchiveWrite {
                path: dest.to_path_buf(),
                reason,
            })?;
        Ok(cursor.into_inner())
    }

    fn append<R: Runtime>(
        &self,
        runtime: &R,
        zip: &mut ZipWriter<Cursor<Vec<u8>>>,
        entry: &ArchiveEntry,
        options: FileOptions<()>,
    ) -> Result<()> {
        debug!("Adding {} from {:?}", entry.name, entry.source);
        let mut reader = runtime
            .open(&entry.source)
            .with_context(|| format!("Failed to open {:?}", entry.source))?;
        zip.start_file(entry.name.as_str(), options)
            .with_context(|| format!("Failed to start archive entry {}", entry.name))?;
        std::io::copy(&mut reader, zip)
            .with_context(|| format!("Failed to write archive entry {}", entry.name))?;
        Ok(())
    }

    fn commit<R: Runtime>(
        &self,
        runtime: &R,
        partial: &Path,
        dest: &Path,
        bytes: &[u8],
    ) -> Result<()> {
        runtime.write(partial, bytes)?;
        // Renaming over an existing file fails on Windows.
        if runtime.exists(dest) {
            runtime.remove_file(dest)?;
        }
        runtime.rename(partial, dest)?;
        Ok(())
    }
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_os_string();
    name.push(".partial");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MockRuntime, RealRuntime};
    use std::fs::{self, File};
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn entry_names(path: &Path) -> Vec<String> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_bundle_stores_entries_in_order_with_flat_names() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("game"), b"binary").unwrap();
        let nested = dir.path().join("data");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("level.db"), b"rows").unwrap();

        let dest = dir.path().join("release.zip");
        let entries = vec![
            ArchiveEntry::new(dir.path().join("game"), "game"),
            ArchiveEntry::new(nested.join("level.db"), "level.db"),
        ];

        ZipBundler.bundle(&RealRuntime, &dest, &entries).unwrap();

        assert_eq!(entry_names(&dest), vec!["game", "level.db"]);
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn test_bundle_preserves_file_contents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("game"), b"binary bytes").unwrap();
        let dest = dir.path().join("release.zip");

        ZipBundler
            .bundle(
                &RealRuntime,
                &dest,
                &[ArchiveEntry::new(dir.path().join("game"), "game")],
            )
            .unwrap();

        let mut archive = ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut contents = Vec::new();
        archive
            .by_name("game")
            .unwrap()
            .read_to_end(&mut contents)
            .unwrap();
        assert_eq!(contents, b"binary bytes");
    }

    #[test]
    fn test_bundle_replaces_existing_archive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("game"), b"v2").unwrap();
        let dest = dir.path().join("release.zip");
        fs::write(&dest, b"stale non-zip data").unwrap();

        ZipBundler
            .bundle(
                &RealRuntime,
                &dest,
                &[ArchiveEntry::new(dir.path().join("game"), "game")],
            )
            .unwrap();

        assert_eq!(entry_names(&dest), vec!["game"]);
    }

    #[test]
    fn test_bundle_missing_source_leaves_no_archive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("present"), b"here").unwrap();
        let dest = dir.path().join("release.zip");

        let entries = vec![
            ArchiveEntry::new(dir.path().join("present"), "present"),
            ArchiveEntry::new(dir.path().join("absent.png"), "absent.png"),
        ];
        let err = ZipBundler
            .bundle(&RealRuntime, &dest, &entries)
            .unwrap_err();

        match err {
            PackageError::MissingAsset { path } => {
                assert_eq!(path, dir.path().join("absent.png"));
            }
            other => panic!("Expected MissingAsset, got {:?}", other),
        }
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn test_bundle_removes_partial_on_commit_failure() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("game"), b"binary").unwrap();
        let dest = dir.path().join("release.zip");
        let partial = partial_path(&dest);

        let mut runtime = MockRuntime::new();
        let source = dir.path().join("game");
        runtime
            .expect_exists()
            .withf(move |p| p == source)
            .return_const(true);
        runtime.expect_open().returning(|p| {
            let reader: Box<dyn Read + Send> = Box::new(File::open(p)?);
            Ok(reader)
        });
        runtime.expect_write().returning(|_, _| Ok(()));
        {
            let dest = dest.clone();
            runtime
                .expect_exists()
                .withf(move |p| p == dest)
                .return_const(false);
        }
        runtime
            .expect_rename()
            .returning(|_, _| Err(anyhow::anyhow!("permission denied")));
        {
            let partial = partial.clone();
            runtime
                .expect_exists()
                .withf(move |p| p == partial)
                .return_const(true);
        }
        {
            let partial = partial.clone();
            runtime
                .expect_remove_file()
                .withf(move |p| p == partial)
                .times(1)
                .returning(|_| Ok(()));
        }

        let err = ZipBundler
            .bundle(
                &runtime,
                &dest,
                &[ArchiveEntry::new(dir.path().join("game"), "game")],
            )
            .unwrap_err();

        match err {
            PackageError::ArchiveWrite { path, .. } => assert_eq!(path, dest),
            other => panic!("Expected ArchiveWrite, got {:?}", other),
        }
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("westpunk_linux.zip")),
            PathBuf::from("westpunk_linux.zip.partial")
        );
    }
}
