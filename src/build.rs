//! Platform builder: runs every configured platform/output pair through
//! filter, resolution, formatting, and the final write.
//!
//! One output failing never aborts its siblings; every outcome is collected
//! into a [`BuildSummary`] reported at the end of the run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::config::{BuildConfig, OutputSpec, PlatformSpec};
use crate::formats::{Format, UnknownFormat};
use crate::loader::{self, LoadError};
use crate::resolve::{ResolveError, Resolver};
use crate::transform::{TransformGroup, UnknownTransformGroup};
use crate::{Token, TokenSet};

/// Per-output failure. Recoverable: the output is skipped and reported,
/// siblings still run.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error(transparent)]
    Transform(#[from] UnknownTransformGroup),
    #[error(transparent)]
    Format(#[from] UnknownFormat),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub enum OutputStatus {
    Written,
    Failed(OutputError),
}
impl OutputStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, OutputStatus::Written)
    }
}
impl fmt::Display for OutputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStatus::Written => write!(f, "written"),
            OutputStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Outcome of one platform/output pair.
#[derive(Debug)]
pub struct OutputResult {
    pub platform: String,
    pub destination: PathBuf,
    pub status: OutputStatus,
}

/// Result of a complete build run.
#[derive(Debug, Default)]
pub struct BuildSummary {
    pub outputs: Vec<OutputResult>,
    pub warnings: Vec<String>,
}
impl BuildSummary {
    pub fn written_count(&self) -> usize {
        self.outputs.iter().filter(|r| r.status.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outputs.len() - self.written_count()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn failures(&self) -> Vec<&OutputResult> {
        self.outputs
            .iter()
            .filter(|r| !r.status.is_success())
            .collect()
    }

    /// Per-output report: every destination with its success or the
    /// specific error, plus collected loader warnings.
    pub fn report(&self) -> String {
        let mut lines = Vec::new();
        let written = self.written_count();
        let failed = self.failed_count();
        let total = self.outputs.len();
        if failed > 0 {
            lines.push(format!(
                "Build failed: {} written, {} failed ({} total)",
                written, failed, total
            ));
        } else {
            lines.push(format!("Build succeeded: {} written ({} total)", written, total));
        }
        for result in &self.outputs {
            lines.push(format!(
                "  - {} -> {}: {}",
                result.platform,
                result.destination.display(),
                result.status
            ));
        }
        if !self.warnings.is_empty() {
            lines.push(format!("Warnings ({}):", self.warnings.len()));
            for warning in &self.warnings {
                lines.push(format!("  - {}", warning));
            }
        }
        lines.join("\n")
    }
}

/// Run a full build: load and merge sources, then render every configured
/// output. Loading failures are fatal; output failures are collected.
///
/// Outputs only read the shared set and write disjoint destinations, so
/// they run in parallel. The summary stays in configuration order.
pub fn build(config: &BuildConfig, base_dir: &Path) -> Result<BuildSummary, LoadError> {
    let (set, warnings) = loader::load_tokens(base_dir, &config.source)?;

    let jobs: Vec<(&str, &PlatformSpec, &OutputSpec)> = config
        .platforms
        .iter()
        .flat_map(|(name, platform)| {
            platform
                .files
                .iter()
                .map(move |file| (name.as_str(), platform, file))
        })
        .collect();

    let outputs = jobs
        .par_iter()
        .map(|(name, platform, file)| {
            let destination = base_dir.join(&platform.build_path).join(&file.destination);
            let status = match build_output(&set, platform, file, &destination) {
                Ok(()) => OutputStatus::Written,
                Err(err) => OutputStatus::Failed(err),
            };
            OutputResult {
                platform: name.to_string(),
                destination,
                status,
            }
        })
        .collect();

    Ok(BuildSummary { outputs, warnings })
}

fn build_output(
    set: &TokenSet,
    platform: &PlatformSpec,
    spec: &OutputSpec,
    destination: &Path,
) -> Result<(), OutputError> {
    let group = TransformGroup::lookup(&platform.transform_group)?;
    let format = Format::lookup(&spec.format)?;

    let included: Vec<&Token> = set
        .iter()
        .filter(|token| spec.filter.as_ref().map_or(true, |f| f.matches(token)))
        .collect();

    let mut resolver = Resolver::new(set, group);
    let resolved = resolver.resolve(&included, spec.options.output_references)?;
    let text = format.render(&resolved);

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
    }
    fs::write(destination, text).map_err(|source| OutputError::Write {
        path: destination.to_path_buf(),
        source,
    })
}
