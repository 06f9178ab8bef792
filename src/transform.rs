//! Transform groups: the value-normalization rules a platform applies
//! before formatting.

use thiserror::Error;

use crate::expression::{format_number, Value};

#[derive(Debug, Error)]
#[error("unknown transform group '{0}'")]
pub struct UnknownTransformGroup(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformGroup {
    Css,
    Scss,
}
impl TransformGroup {
    pub fn lookup(name: &str) -> Result<Self, UnknownTransformGroup> {
        match name {
            "css" => Ok(TransformGroup::Css),
            "scss" => Ok(TransformGroup::Scss),
            other => Err(UnknownTransformGroup(other.to_string())),
        }
    }

    /// Render a literal through the group's transforms. Both stylesheet
    /// groups normalize `#hex` colors and stringify numbers.
    pub fn apply(&self, value: &Value) -> String {
        match value {
            Value::Color(color) => color.to_hex_string(),
            Value::Number(n) => format_number(*n),
            Value::Any(s) => s.clone(),
        }
    }
}
