//! Platform target table.
//!
//! Single source of truth for the platforms a release can be built for,
//! consumed by both the dispatcher's default-all behavior and its name
//! matching.

use std::path::PathBuf;

/// One operating system / CPU architecture combination a release is built
/// for, with the location of the executable the toolchain produces for it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformTarget {
    /// User-facing platform token; also names the archive.
    pub os_name: &'static str,
    pub arch_name: &'static str,
    /// OS value understood by the compiler toolchain. Differs from
    /// `os_name` for macOS, which the toolchain spells `darwin`.
    pub toolchain_os: &'static str,
    /// Path of the built executable relative to the toolchain output
    /// directory, `/`-separated.
    pub executable_path: &'static str,
}

const SUPPORTED: [PlatformTarget; 3] = [
    PlatformTarget {
        os_name: "macos",
        arch_name: "amd64",
        toolchain_os: "darwin",
        executable_path: "westpunk",
    },
    PlatformTarget {
        os_name: "windows",
        arch_name: "amd64",
        toolchain_os: "windows",
        executable_path: "westpunk.exe",
    },
    PlatformTarget {
        os_name: "linux",
        arch_name: "amd64",
        toolchain_os: "linux",
        executable_path: "linux/bin/westpunk",
    },
];

impl PlatformTarget {
    /// Every supported target, in the fixed enumeration order.
    pub fn supported() -> &'static [PlatformTarget] {
        &SUPPORTED
    }

    /// Environment block handed to the compile subprocess.
    pub fn build_env(&self) -> Vec<(String, String)> {
        vec![
            ("GOOS".to_string(), self.toolchain_os.to_string()),
            ("GOARCH".to_string(), self.arch_name.to_string()),
        ]
    }

    /// Executable path with `/` separators normalized for the host.
    pub fn executable_relative_path(&self) -> PathBuf {
        self.executable_path.split('/').collect()
    }

    /// Bare executable file name, used as the archive entry name.
    pub fn executable_name(&self) -> &'static str {
        self.executable_path
            .rsplit('/')
            .next()
            .unwrap_or(self.executable_path)
    }

    pub fn archive_name(&self) -> String {
        format!("westpunk_{}.zip", self.os_name)
    }
}
