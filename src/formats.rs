//! Output formats: render a resolved token subsequence as stylesheet text.

use convert_case::{Case, Casing};
use itertools::Itertools;
use slug::slugify;
use thiserror::Error;

use crate::resolve::{Piece, ResolvedToken};

#[derive(Debug, Error)]
#[error("unknown format '{0}'")]
pub struct UnknownFormat(pub String);

pub const HEADER: &str = "/* Generated by tokenforge. Do not edit directly. */";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    CssVariables,
    ScssVariables,
}
impl Format {
    pub fn lookup(name: &str) -> Result<Self, UnknownFormat> {
        match name {
            "css/variables" => Ok(Format::CssVariables),
            "scss/variables" => Ok(Format::ScssVariables),
            other => Err(UnknownFormat(other.to_string())),
        }
    }

    pub fn render(&self, tokens: &[ResolvedToken]) -> String {
        match self {
            Format::CssVariables => render_css(tokens),
            Format::ScssVariables => render_scss(tokens),
        }
    }
}

fn identifier(path: &[String], separator: &str) -> String {
    path.iter()
        .map(|segment| slugify(segment.to_case(Case::Kebab)))
        .join(separator)
}

fn css_name(path: &[String]) -> String {
    format!("--{}", identifier(path, "--"))
}

fn scss_name(path: &[String]) -> String {
    format!("${}", identifier(path, "-"))
}

fn render_css(tokens: &[ResolvedToken]) -> String {
    let body = tokens
        .iter()
        .map(|t| {
            let value: String = t
                .pieces
                .iter()
                .map(|piece| match piece {
                    Piece::Text(text) => text.clone(),
                    Piece::Ref(path) => format!("var({})", css_name(path)),
                })
                .collect();
            let comment = t
                .token
                .comment
                .as_deref()
                .map(|c| format!(" /* {} */", c))
                .unwrap_or_default();
            format!("  {}: {};{}", css_name(&t.token.path), value, comment)
        })
        .join("\n");
    if body.is_empty() {
        format!("{}\n\n:root {{\n}}\n", HEADER)
    } else {
        format!("{}\n\n:root {{\n{}\n}}\n", HEADER, body)
    }
}

fn render_scss(tokens: &[ResolvedToken]) -> String {
    let body = tokens
        .iter()
        .map(|t| {
            let value: String = t
                .pieces
                .iter()
                .map(|piece| match piece {
                    Piece::Text(text) => text.clone(),
                    Piece::Ref(path) => scss_name(path),
                })
                .collect();
            let comment = t
                .token
                .comment
                .as_deref()
                .map(|c| format!(" // {}", c))
                .unwrap_or_default();
            format!("{}: {};{}", scss_name(&t.token.path), value, comment)
        })
        .join("\n");
    if body.is_empty() {
        format!("{}\n", HEADER)
    } else {
        format!("{}\n\n{}\n", HEADER, body)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::expression::{Expression, TokenValue, Value};
    use crate::Token;

    fn resolved(path: &[&str], pieces: Vec<Piece>, comment: Option<&str>) -> (Token, Vec<Piece>) {
        let token = Token {
            path: path.iter().map(|s| s.to_string()).collect(),
            value: TokenValue {
                raw: String::new(),
                expr: Expression::Value(Value::Any(String::new())),
            },
            comment: comment.map(|c| c.to_string()),
            kind: None,
            source: PathBuf::from("test.json"),
        };
        (token, pieces)
    }

    #[test]
    fn lookup_known_formats() {
        assert_eq!(Format::lookup("css/variables").unwrap(), Format::CssVariables);
        assert_eq!(Format::lookup("scss/variables").unwrap(), Format::ScssVariables);
        assert!(Format::lookup("ios/swift").is_err());
    }

    #[test]
    fn css_declarations_and_references() {
        let (base, base_pieces) = resolved(
            &["color", "base"],
            vec![Piece::Text("#ff0000".to_string())],
            Some("brand red"),
        );
        let (accent, accent_pieces) = resolved(
            &["color", "accent"],
            vec![Piece::Ref(vec!["color".to_string(), "base".to_string()])],
            None,
        );
        let tokens = vec![
            ResolvedToken {
                token: &base,
                pieces: base_pieces,
            },
            ResolvedToken {
                token: &accent,
                pieces: accent_pieces,
            },
        ];

        let out = Format::CssVariables.render(&tokens);
        assert!(out.starts_with(HEADER));
        assert!(out.contains("  --color--base: #ff0000; /* brand red */"));
        assert!(out.contains("  --color--accent: var(--color--base);"));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn scss_declarations_and_references() {
        let (base, base_pieces) = resolved(
            &["color", "base"],
            vec![Piece::Text("#ff0000".to_string())],
            None,
        );
        let (accent, accent_pieces) = resolved(
            &["color", "accent"],
            vec![Piece::Ref(vec!["color".to_string(), "base".to_string()])],
            Some("follows base"),
        );
        let tokens = vec![
            ResolvedToken {
                token: &base,
                pieces: base_pieces,
            },
            ResolvedToken {
                token: &accent,
                pieces: accent_pieces,
            },
        ];

        let out = Format::ScssVariables.render(&tokens);
        assert!(out.contains("$color-base: #ff0000;"));
        assert!(out.contains("$color-accent: $color-base; // follows base"));
    }

    #[test]
    fn empty_subsequence_renders_header_only() {
        let css = Format::CssVariables.render(&[]);
        assert!(css.starts_with(HEADER));
        assert!(css.contains(":root {\n}"));

        let scss = Format::ScssVariables.render(&[]);
        assert_eq!(scss, format!("{}\n", HEADER));
    }

    #[test]
    fn names_are_slugged() {
        let (token, pieces) = resolved(
            &["Brand Set", "baseColor"],
            vec![Piece::Text("#fff".to_string())],
            None,
        );
        let tokens = vec![ResolvedToken {
            token: &token,
            pieces,
        }];
        let out = Format::CssVariables.render(&tokens);
        assert!(out.contains("--brand-set--base-color:"));
    }
}
