//! tokenforge - design-token build pipeline
//!
//! Loads JSON token sources matched by glob patterns, merges them into one
//! ordered token set, and renders each configured platform output through
//! filter, reference-resolution, and formatting stages.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

pub mod build;
pub mod cli;
pub mod config;
pub mod expression;
pub mod formats;
pub mod loader;
pub mod resolve;
pub mod transform;

use expression::TokenValue;

/// One node of a parsed source file: a token declaration or a named group.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TokenOrGroup {
    Token {
        value: TokenValue,
        comment: Option<String>,
        #[serde(rename = "type")]
        kind: Option<String>,
    },
    Group(IndexMap<String, TokenOrGroup>),
}
impl TokenOrGroup {
    fn collect(&self, path: &mut Vec<String>, source: &Path, out: &mut Vec<Token>) {
        match self {
            TokenOrGroup::Token {
                value,
                comment,
                kind,
            } => out.push(Token {
                path: path.clone(),
                value: value.clone(),
                comment: comment.clone(),
                kind: kind.clone(),
                source: source.to_path_buf(),
            }),
            TokenOrGroup::Group(group) => {
                for (key, node) in group {
                    path.push(key.clone());
                    node.collect(path, source, out);
                    path.pop();
                }
            }
        }
    }
}

/// The root of a token source file.
pub type TokenFile = IndexMap<String, TokenOrGroup>;

/// Flatten a parsed file into tokens, assigning each leaf the sequence of
/// key names from the root. Declaration order is preserved.
pub fn file_tokens(tree: &TokenFile, source: &Path) -> Vec<Token> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    for (key, node) in tree {
        path.push(key.clone());
        node.collect(&mut path, source, &mut out);
        path.pop();
    }
    out
}

/// A named leaf value with its hierarchical path.
#[derive(Debug, Clone)]
pub struct Token {
    pub path: Vec<String>,
    pub value: TokenValue,
    pub comment: Option<String>,
    pub kind: Option<String>,
    pub source: PathBuf,
}
impl Token {
    /// Dotted path, used in warnings and errors.
    pub fn name(&self) -> String {
        self.path.join(".")
    }
}

/// The merged collection of all tokens, keyed by path in first-declaration
/// order. Immutable once loading finishes; rebuilt fresh per run.
#[derive(Debug, Default)]
pub struct TokenSet {
    tokens: IndexMap<Vec<String>, Token>,
}
impl TokenSet {
    /// Insert a token, returning the displaced one if the path was taken.
    /// The replacement keeps the original declaration's position.
    pub fn insert(&mut self, token: Token) -> Option<Token> {
        self.tokens.insert(token.path.clone(), token)
    }

    pub fn get(&self, path: &[String]) -> Option<&Token> {
        self.tokens.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
