//! Selects which platforms to package and runs them sequentially.

use crate::packager::Packager;
use crate::platform::PlatformTarget;
use crate::runtime::Runtime;
use log::{error, info};

/// Targets selected by a list of requested platform tokens.
///
/// An empty request selects every supported target. Otherwise a target is
/// selected iff its os name appears verbatim (case-sensitive) among the
/// tokens. Targets keep the fixed enumeration order regardless of argument
/// order, and unrecognized tokens are ignored.
pub fn select_targets(requested: &[String]) -> Vec<&'static PlatformTarget> {
    PlatformTarget::supported()
        .iter()
        .filter(|target| {
            requested.is_empty() || requested.iter().any(|token| token == target.os_name)
        })
        .collect()
}

/// Run the packager once per selected target, strictly sequentially.
///
/// Compiling mutates no process-global state (the target travels in the
/// child's own environment block), but invocations are still run one at a
/// time: each failure is reported where it occurs and does not stop later
/// targets. Returns the process exit code, 0 when every target succeeded,
/// otherwise the first failure's code.
pub fn dispatch<R: Runtime>(runtime: &R, packager: &Packager, requested: &[String]) -> u8 {
    let mut exit = 0u8;
    for target in select_targets(requested) {
        match packager.package(runtime, target) {
            Ok(path) => info!("Packaged {} into {}", target.os_name, path.display()),
            Err(err) => {
                error!("Packaging {} failed: {}", target.os_name, err);
                if exit == 0 {
                    exit = err.exit_code();
                }
            }
        }
    }
    exit
}
