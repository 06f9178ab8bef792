//! Command-line interface.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::build;
use crate::config::{BuildConfig, ConfigError};

#[derive(Parser)]
#[command(
    name = "tokenforge",
    about = "Build design-token sources into platform stylesheets",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every configured platform output
    Build {
        /// Path to the build configuration file
        #[arg(long)]
        config: PathBuf,
    },
    /// Remove the configured build directories
    Clean {
        /// Path to the build configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    match cli.command {
        Command::Build { config } => run_build(&config),
        Command::Clean { config } => run_clean(&config),
    }
}

/// Load the config; globs and build paths resolve relative to its directory.
fn load(path: &Path) -> Result<(BuildConfig, PathBuf), ConfigError> {
    let config = BuildConfig::from_path(path)?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((config, base_dir))
}

fn run_build(path: &Path) -> ExitCode {
    let (config, base_dir) = match load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    match build::build(&config, &base_dir) {
        Ok(summary) => {
            for warning in &summary.warnings {
                eprintln!("warning: {}", warning);
            }
            println!("{}", summary.report());
            if summary.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_clean(path: &Path) -> ExitCode {
    let (config, base_dir) = match load(path) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let mut failed = false;
    for platform in config.platforms.values() {
        let dir = base_dir.join(&platform.build_path);
        if !dir.exists() {
            continue;
        }
        match fs::remove_dir_all(&dir) {
            Ok(()) => println!("Removed {}", dir.display()),
            Err(err) => {
                eprintln!("error: failed to remove {}: {}", dir.display(), err);
                failed = true;
            }
        }
    }
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
