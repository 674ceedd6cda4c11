//! The fixed list of non-executable files bundled into every release archive.

use crate::runtime::Runtime;
use std::path::{Path, PathBuf};

/// Static assets shipped in every platform's archive, in archive order.
/// Only the executable entry differs between platforms.
pub const STATIC_ASSETS: [&str; 7] = [
    "background.png",
    "database.db",
    "dirtlayerground.png",
    "grasslayerground.png",
    "oaklog.png",
    "spritesheet.png",
    "tree.png",
];

/// Manifest members absent from `dir`, in manifest order.
pub fn missing_assets<R: Runtime>(runtime: &R, dir: &Path) -> Vec<PathBuf> {
    STATIC_ASSETS
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| !runtime.exists(path))
        .collect()
}
