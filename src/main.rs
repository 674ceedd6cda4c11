use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use westpak::dispatch::dispatch;
use westpak::packager::{Packager, Toolchain};
use westpak::runtime::RealRuntime;

/// westpak - westpunk release packager
///
/// Build the game for one or more platforms and bundle each executable
/// together with the static assets into westpunk_<platform>.zip in the
/// current directory.
///
/// Examples:
///   westpak                  # package every supported platform
///   westpak windows linux    # package only the named platforms
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Platforms to package (macos, windows, linux); all of them when omitted
    #[arg(value_name = "PLATFORM")]
    platforms: Vec<String>,

    /// Project root containing bin/ and pkg/westpunk/ (also via WESTPAK_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "WESTPAK_ROOT",
        value_name = "PATH"
    )]
    project_root: Option<PathBuf>,

    /// Compiler command invoked to build the executable (also via WESTPAK_COMPILER)
    #[arg(
        long = "compiler",
        env = "WESTPAK_COMPILER",
        value_name = "COMMAND",
        default_value = "go install"
    )]
    compiler: String,
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let project_root = match cli.project_root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    let toolchain = Toolchain::parse(&cli.compiler)?;
    let packager = Packager::new(project_root, toolchain);

    Ok(ExitCode::from(dispatch(
        &RealRuntime,
        &packager,
        &cli.platforms,
    )))
}
