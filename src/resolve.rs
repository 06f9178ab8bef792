//! Reference resolution for one output.
//!
//! Every included token is first fully inlined through the global set —
//! an explicit work-stack walk over the reference graph with on-stack
//! marks, so cycles and unknown targets are always detected without
//! unbounded recursion. Rendering then keeps a reference symbolic only
//! when the output asks for references and the target survived the
//! filter; otherwise the inlined value is substituted.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::expression::Expression;
use crate::transform::TransformGroup;
use crate::{Token, TokenSet};

/// Per-output resolution failure: the reference graph reached a path that
/// is not in the global set, or a reference chain cycles.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("token '{at}' references unknown token '{to}'")]
    UnknownReference { at: String, to: String },
    #[error("reference cycle: {}", chain.join(" -> "))]
    Cycle { chain: Vec<String> },
}

/// One piece of a resolved value. References survive only when the output
/// keeps them symbolic; how they are spelled is the formatter's business.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Text(String),
    Ref(Vec<String>),
}

/// A token paired with its resolved, transform-applied value.
#[derive(Debug)]
pub struct ResolvedToken<'a> {
    pub token: &'a Token,
    pub pieces: Vec<Piece>,
}

pub struct Resolver<'a> {
    set: &'a TokenSet,
    group: TransformGroup,
    inlined: HashMap<Vec<String>, String>,
}

impl<'a> Resolver<'a> {
    pub fn new(set: &'a TokenSet, group: TransformGroup) -> Self {
        Self {
            set,
            group,
            inlined: HashMap::new(),
        }
    }

    /// Resolve the filtered subsequence. Fails on the first unknown target
    /// or cycle reachable from an included token.
    pub fn resolve(
        &mut self,
        included: &[&'a Token],
        output_references: bool,
    ) -> Result<Vec<ResolvedToken<'a>>, ResolveError> {
        for token in included {
            self.inline(token)?;
        }

        let included_paths: HashSet<&Vec<String>> =
            included.iter().map(|token| &token.path).collect();

        Ok(included
            .iter()
            .map(|&token| ResolvedToken {
                token,
                pieces: self.render(token, output_references, &included_paths),
            })
            .collect())
    }

    /// Compute the fully inlined value of `start` and everything it
    /// references, iteratively. `inlined` is the done-set; `on_stack`
    /// marks in-progress paths for cycle detection.
    fn inline(&mut self, start: &Token) -> Result<(), ResolveError> {
        if self.inlined.contains_key(&start.path) {
            return Ok(());
        }
        let mut stack: Vec<Vec<String>> = vec![start.path.clone()];
        let mut on_stack: HashSet<Vec<String>> = stack.iter().cloned().collect();

        while let Some(path) = stack.last().cloned() {
            let token = self
                .set
                .get(&path)
                .expect("only known paths are pushed on the stack");

            let pending = token
                .value
                .expr
                .refs()
                .into_iter()
                .find(|dep| !self.inlined.contains_key(*dep));

            match pending {
                Some(dep) => {
                    if self.set.get(dep).is_none() {
                        return Err(ResolveError::UnknownReference {
                            at: token.name(),
                            to: dep.join("."),
                        });
                    }
                    if on_stack.contains(dep) {
                        let from = stack.iter().position(|p| p == dep).unwrap();
                        let mut chain: Vec<String> =
                            stack[from..].iter().map(|p| p.join(".")).collect();
                        chain.push(dep.join("."));
                        return Err(ResolveError::Cycle { chain });
                    }
                    on_stack.insert(dep.clone());
                    stack.push(dep.clone());
                }
                None => {
                    let text = self.inline_text(token);
                    self.inlined.insert(path.clone(), text);
                    on_stack.remove(&path);
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Literal text of a token whose references are all inlined already.
    fn inline_text(&self, token: &Token) -> String {
        let piece = |expr: &Expression| match expr {
            Expression::Ref(path) => self.inlined[path].clone(),
            Expression::Value(value) => self.group.apply(value),
            Expression::Parts(_) => unreachable!("parts never nest"),
        };
        match &token.value.expr {
            Expression::Parts(parts) => parts.iter().map(piece).collect(),
            other => piece(other),
        }
    }

    fn render(
        &self,
        token: &Token,
        output_references: bool,
        included: &HashSet<&Vec<String>>,
    ) -> Vec<Piece> {
        let piece = |expr: &Expression| match expr {
            Expression::Ref(path) if output_references && included.contains(path) => {
                Piece::Ref(path.clone())
            }
            Expression::Ref(path) => Piece::Text(self.inlined[path].clone()),
            Expression::Value(value) => Piece::Text(self.group.apply(value)),
            Expression::Parts(_) => unreachable!("parts never nest"),
        };
        match &token.value.expr {
            Expression::Parts(parts) => parts.iter().map(piece).collect(),
            other => vec![piece(other)],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::expression::TokenValue;

    fn token(path: &str, value: &str) -> Token {
        Token {
            path: path.split('.').map(|s| s.to_string()).collect(),
            value: serde_json::from_value::<TokenValue>(serde_json::json!(value)).unwrap(),
            comment: None,
            kind: None,
            source: PathBuf::from("test.json"),
        }
    }

    fn set(tokens: Vec<Token>) -> TokenSet {
        let mut set = TokenSet::default();
        for t in tokens {
            set.insert(t);
        }
        set
    }

    fn texts(resolved: &[ResolvedToken]) -> Vec<String> {
        resolved
            .iter()
            .map(|r| {
                r.pieces
                    .iter()
                    .map(|p| match p {
                        Piece::Text(s) => s.clone(),
                        Piece::Ref(path) => format!("<{}>", path.join(".")),
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn literal_values_pass_through() {
        let set = set(vec![token("global.radius", "4px")]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, false).unwrap();
        assert_eq!(texts(&resolved), vec!["4px"]);
    }

    #[test]
    fn chains_inline_recursively() {
        let set = set(vec![
            token("color.base", "#ff0000"),
            token("color.primary", "{color.base}"),
            token("color.accent", "{color.primary}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, false).unwrap();
        assert_eq!(texts(&resolved), vec!["#ff0000", "#ff0000", "#ff0000"]);
    }

    #[test]
    fn references_stay_symbolic_when_target_included() {
        let set = set(vec![
            token("color.base", "#ff0000"),
            token("color.primary", "{color.base}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, true).unwrap();
        assert_eq!(texts(&resolved), vec!["#ff0000", "<color.base>"]);
    }

    #[test]
    fn filtered_out_target_is_inlined_despite_output_references() {
        let set = set(vec![
            token("color.base", "#ff0000"),
            token("color.primary", "{color.base}"),
        ]);
        let included: Vec<&Token> = set
            .iter()
            .filter(|t| t.name() == "color.primary")
            .collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, true).unwrap();
        assert_eq!(texts(&resolved), vec!["#ff0000"]);
    }

    #[test]
    fn embedded_references_resolve_in_place() {
        let set = set(vec![
            token("color.border", "#00ff00"),
            token("border.default", "1px solid {color.border}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, false).unwrap();
        assert_eq!(
            texts(&resolved),
            vec!["#00ff00", "1px solid #00ff00"]
        );
    }

    #[test]
    fn repeated_reference_is_not_a_cycle() {
        let set = set(vec![
            token("spacing.base", "8px"),
            token("spacing.both", "{spacing.base} {spacing.base}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let resolved = resolver.resolve(&included, false).unwrap();
        assert_eq!(texts(&resolved), vec!["8px", "8px 8px"]);
    }

    #[test]
    fn unknown_target_is_an_error() {
        let set = set(vec![token("color.primary", "{color.missing}")]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let err = resolver.resolve(&included, false).unwrap_err();
        match err {
            ResolveError::UnknownReference { at, to } => {
                assert_eq!(at, "color.primary");
                assert_eq!(to, "color.missing");
            }
            other => panic!("expected unknown reference, got {:?}", other),
        }
    }

    #[test]
    fn cycle_is_detected_and_terminates() {
        let set = set(vec![
            token("color.a", "{color.b}"),
            token("color.b", "{color.a}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let err = resolver.resolve(&included, false).unwrap_err();
        match err {
            ResolveError::Cycle { chain } => {
                assert_eq!(chain.first(), chain.last());
                assert!(chain.contains(&"color.a".to_string()));
                assert!(chain.contains(&"color.b".to_string()));
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let set = set(vec![token("color.a", "{color.a}")]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        let err = resolver.resolve(&included, false).unwrap_err();
        assert!(matches!(err, ResolveError::Cycle { .. }));
    }

    #[test]
    fn cycles_fail_even_when_references_are_kept() {
        let set = set(vec![
            token("color.a", "{color.b}"),
            token("color.b", "{color.a}"),
        ]);
        let included: Vec<&Token> = set.iter().collect();
        let mut resolver = Resolver::new(&set, TransformGroup::Css);
        assert!(resolver.resolve(&included, true).is_err());
    }
}
