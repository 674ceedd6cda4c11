//! One platform's compile-copy-archive-cleanup sequence.

use crate::archive::{ArchiveEntry, ZipBundler};
use crate::error::PackageError;
use crate::manifest::STATIC_ASSETS;
use crate::platform::PlatformTarget;
use crate::runtime::Runtime;
use anyhow::{Result, anyhow};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Compiler invocation used to produce the game executable.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolchain {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            program: "go".to_string(),
            args: vec!["install".to_string()],
        }
    }
}

impl Toolchain {
    /// Parse a whitespace-separated command string, e.g. `go install`.
    pub fn parse(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| anyhow!("compiler command is empty"))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Builds one platform's executable and bundles it with the static assets
/// into a release archive.
pub struct Packager {
    /// Project root containing the toolchain output directory (`bin/`) and
    /// the assets directory (`pkg/westpunk/`).
    pub project_root: PathBuf,
    pub toolchain: Toolchain,
    /// Directory the finished archive is written to.
    pub output_dir: PathBuf,
}

impl Packager {
    pub fn new(project_root: PathBuf, toolchain: Toolchain) -> Self {
        Self {
            project_root,
            toolchain,
            output_dir: PathBuf::from("."),
        }
    }

    /// Toolchain output directory holding freshly built executables.
    fn bin_dir(&self) -> PathBuf {
        self.project_root.join("bin")
    }

    /// Directory holding the static assets shipped with every release.
    fn assets_dir(&self) -> PathBuf {
        self.project_root.join("pkg").join("westpunk")
    }

    /// Compile, copy, archive and clean up for one platform target.
    ///
    /// Returns the path of the finished archive. The transient executable
    /// copy placed in the assets directory is removed on every exit path,
    /// so the assets directory always returns to its pre-invocation state.
    pub fn package<R: Runtime>(
        &self,
        runtime: &R,
        target: &PlatformTarget,
    ) -> Result<PathBuf, PackageError> {
        self.compile(runtime, target)?;

        let built = self.bin_dir().join(target.executable_relative_path());
        if !runtime.exists(&built) {
            return Err(PackageError::MissingAsset { path: built });
        }

        let assets_dir = self.assets_dir();
        let transient = TransientCopy::create(runtime, &assets_dir, target, &built)?;

        let mut entries = vec![ArchiveEntry::new(
            transient.path().to_path_buf(),
            target.executable_name(),
        )];
        for name in STATIC_ASSETS {
            entries.push(ArchiveEntry::new(assets_dir.join(name), name));
        }

        let archive_path = self.output_dir.join(target.archive_name());
        ZipBundler.bundle(runtime, &archive_path, &entries)?;
        Ok(archive_path)
    }

    fn compile<R: Runtime>(
        &self,
        runtime: &R,
        target: &PlatformTarget,
    ) -> Result<(), PackageError> {
        info!(
            "Building westpunk for {}/{}",
            target.os_name, target.arch_name
        );
        let code = runtime
            .run_command(
                &self.toolchain.program,
                &self.toolchain.args,
                &target.build_env(),
                &self.project_root,
            )
            .map_err(|reason| PackageError::CompilerUnavailable {
                program: self.toolchain.program.clone(),
                reason,
            })?;
        if code != 0 {
            return Err(PackageError::BuildFailed {
                os: target.os_name.to_string(),
                code,
            });
        }
        Ok(())
    }
}

/// Scoped copy of the built executable inside the assets directory.
///
/// The copy, and any directories created for its sub-path, is removed when
/// the guard drops, whether packaging succeeded or failed.
struct TransientCopy<'a, R: Runtime> {
    runtime: &'a R,
    path: PathBuf,
    assets_dir: PathBuf,
}

impl<'a, R: Runtime> TransientCopy<'a, R> {
    fn create(
        runtime: &'a R,
        assets_dir: &Path,
        target: &PlatformTarget,
        built: &Path,
    ) -> Result<Self, PackageError> {
        let path = assets_dir.join(target.executable_relative_path());
        if let Some(parent) = path.parent()
            && parent != assets_dir
        {
            runtime
                .create_dir_all(parent)
                .map_err(|reason| PackageError::ArchiveWrite {
                    path: path.clone(),
                    reason,
                })?;
        }
        runtime
            .copy(built, &path)
            .map_err(|reason| PackageError::ArchiveWrite {
                path: path.clone(),
                reason,
            })?;
        debug!("Copied {:?} to {:?}", built, path);
        Ok(Self {
            runtime,
            path,
            assets_dir: assets_dir.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl<R: Runtime> Drop for TransientCopy<'_, R> {
    fn drop(&mut self) {
        if let Err(err) = self.runtime.remove_file(&self.path) {
            warn!(
                "Failed to remove transient executable {:?}: {:#}",
                self.path, err
            );
            return;
        }
        debug!("Removed transient executable {:?}", self.path);

        // Prune directories created for a sub-path target, innermost first.
        // Stops at the first non-empty directory.
        let mut dir = self.path.parent();
        while let Some(d) = dir {
            if d == self.assets_dir || self.runtime.remove_dir(d).is_err() {
                break;
            }
            dir = d.parent();
        }
    }
}
