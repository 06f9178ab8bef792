//! Source discovery and token loading.
//!
//! Resolves the configured glob patterns, parses every matched file, and
//! merges the flattened trees into one [`TokenSet`]. Merge policy is last
//! writer wins: patterns are processed in declared order, matches within a
//! pattern in sorted path order, and a collision produces a warning, never
//! a silent overwrite.

use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use indexmap::IndexSet;
use thiserror::Error;

use crate::{file_tokens, TokenFile, TokenSet};

/// Fatal loading error. Token identity is undefined without every source
/// file, so any of these aborts the whole run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("empty key in {path} at '{token}'")]
    EmptyKey { path: PathBuf, token: String },
}

/// Load every token source matched by `patterns`, resolved relative to
/// `base_dir`. Returns the merged set plus collected warnings.
pub fn load_tokens(
    base_dir: &Path,
    patterns: &[String],
) -> Result<(TokenSet, Vec<String>), LoadError> {
    let mut warnings = Vec::new();
    let files = discover_files(base_dir, patterns, &mut warnings)?;

    let mut set = TokenSet::default();
    for file in files {
        let text = fs::read_to_string(&file).map_err(|source| LoadError::Io {
            path: file.clone(),
            source,
        })?;
        let tree: TokenFile = serde_json::from_str(&text).map_err(|source| LoadError::Parse {
            path: file.clone(),
            source,
        })?;
        for token in file_tokens(&tree, &file) {
            if token.path.iter().any(|segment| segment.is_empty()) {
                return Err(LoadError::EmptyKey {
                    path: file.clone(),
                    token: token.name(),
                });
            }
            let name = token.name();
            if let Some(previous) = set.insert(token) {
                warnings.push(format!(
                    "token '{}' redefined by {}; keeping the later value (first declared in {})",
                    name,
                    file.display(),
                    previous.source.display()
                ));
            }
        }
    }
    Ok((set, warnings))
}

/// Resolve glob patterns to a deduplicated file list. A file matched by
/// several patterns is parsed once, at its first match.
fn discover_files(
    base_dir: &Path,
    patterns: &[String],
    warnings: &mut Vec<String>,
) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = IndexSet::new();
    for pattern in patterns {
        let full = base_dir.join(pattern);
        let entries =
            glob(&full.to_string_lossy()).map_err(|source| LoadError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
        let mut matched = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => matched.push(path),
                Ok(_) => {}
                Err(err) => warnings.push(format!("skipping unreadable path: {}", err)),
            }
        }
        matched.sort();
        for path in matched {
            files.insert(path);
        }
    }
    Ok(files.into_iter().collect())
}
