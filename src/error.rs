//! Failure taxonomy for a single platform's packaging attempt.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PackageError {
    /// The compiler could not be spawned at all.
    #[error("compiler `{program}` could not be run: {reason}")]
    CompilerUnavailable {
        program: String,
        reason: anyhow::Error,
    },

    /// The compiler ran but exited with a nonzero status.
    #[error("compiler exited with status {code} while building for {os}")]
    BuildFailed { os: String, code: i32 },

    /// An expected input file (executable or static asset) is absent.
    #[error("required file is missing: {path}")]
    MissingAsset { path: PathBuf },

    /// The archive (or the transient files it is built from) could not be
    /// created or written.
    #[error("failed to write archive {path}: {reason}")]
    ArchiveWrite {
        path: PathBuf,
        reason: anyhow::Error,
    },
}

impl PackageError {
    /// Process exit code for this failure: 1 for build failures, 2 for
    /// packaging failures.
    pub fn exit_code(&self) -> u8 {
        match self {
            PackageError::CompilerUnavailable { .. } | PackageError::BuildFailed { .. } => 1,
            PackageError::MissingAsset { .. } | PackageError::ArchiveWrite { .. } => 2,
        }
    }
}
