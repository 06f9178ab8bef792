//! Build configuration: source globs, platforms, outputs, and the
//! declarative filter predicates evaluated per token.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::Token;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// The root configuration: source globs plus one entry per platform.
/// Constructed once per run, read-only thereafter.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    pub source: Vec<String>,
    pub platforms: IndexMap<String, PlatformSpec>,
}
impl BuildConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    pub transform_group: String,
    pub build_path: String,
    pub files: Vec<OutputSpec>,
}

/// One configured output artifact within a platform.
#[derive(Debug, Deserialize)]
pub struct OutputSpec {
    pub destination: String,
    pub format: String,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub options: OutputOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputOptions {
    /// When true, a resolved value referencing another token that is also in
    /// the output is emitted as a symbolic reference instead of inlined.
    #[serde(default)]
    pub output_references: bool,
}

/// Per-output inclusion predicate. Predicates are data, not code: a closed
/// combinator set over a single token's path. An absent filter includes
/// every token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Filter {
    PathPrefix(Vec<String>),
    SegmentEquals { index: usize, value: String },
    PathContains(String),
    Not(Box<Filter>),
    AllOf(Vec<Filter>),
    AnyOf(Vec<Filter>),
}
impl Filter {
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Filter::PathPrefix(prefix) => token.path.starts_with(prefix),
            Filter::SegmentEquals { index, value } => token.path.get(*index) == Some(value),
            Filter::PathContains(segment) => token.path.iter().any(|s| s == segment),
            Filter::Not(inner) => !inner.matches(token),
            Filter::AllOf(all) => all.iter().all(|f| f.matches(token)),
            Filter::AnyOf(any) => any.iter().any(|f| f.matches(token)),
        }
    }
}
