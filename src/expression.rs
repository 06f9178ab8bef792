use std::fmt;

use csscolorparser::Color;
use serde::{
    de::{self, Visitor},
    Deserialize, Deserializer,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Color(Color),
    Number(f64),
    Any(String),
}
impl Value {
    fn classify(raw: String) -> Value {
        if raw.starts_with('#') {
            if let Ok(color) = csscolorparser::parse(&raw) {
                return Value::Color(color);
            }
        }
        if let Ok(n) = raw.parse::<f64>() {
            return Value::Number(n);
        }
        Value::Any(raw)
    }
}

/// A parsed token value: a literal, a `{path.to.token}` reference, or a
/// sequence of both for values with embedded references.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Ref(Vec<String>),
    Value(Value),
    Parts(Vec<Expression>),
}
impl Expression {
    fn from_parts(parts: Vec<Part>) -> Expression {
        match parts.len() {
            0 => Expression::Value(Value::Any(String::new())),
            1 => match parts.into_iter().next().unwrap() {
                Part::Reference(path) => Expression::Ref(path),
                Part::Text(text) => Expression::Value(Value::classify(text)),
            },
            _ => Expression::Parts(
                parts
                    .into_iter()
                    .map(|part| match part {
                        Part::Reference(path) => Expression::Ref(path),
                        Part::Text(text) => Expression::Value(Value::Any(text)),
                    })
                    .collect(),
            ),
        }
    }

    /// Reference paths mentioned anywhere in this value.
    pub fn refs(&self) -> Vec<&Vec<String>> {
        match self {
            Expression::Ref(path) => vec![path],
            Expression::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    Expression::Ref(path) => Some(path),
                    _ => None,
                })
                .collect(),
            Expression::Value(_) => Vec::new(),
        }
    }
}

enum Part {
    Reference(Vec<String>),
    Text(String),
}

peg::parser! {
  grammar value_parser() for str {
    pub(crate) rule value() -> Expression
        = parts:(part()*) { Expression::from_parts(parts) }

    rule part() -> Part = reference() / text()

    rule reference() -> Part
        = "{" v:($((!"}" !"." [_])+) ++ ".") "}" { Part::Reference(v.iter().map(|x| x.to_string()).collect()) }

    rule text() -> Part
        = v:$((!"{" [_])+) { Part::Text(v.to_string()) }
  }
}

pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// A token's declared value: the raw pre-resolution text plus its parsed form.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenValue {
    pub raw: String,
    pub expr: Expression,
}

struct TokenValueVisitor;

impl<'de> Visitor<'de> for TokenValueVisitor {
    type Value = TokenValue;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a token value string or number")
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        match value_parser::value(value) {
            Ok(expr) => Ok(TokenValue {
                raw: value.to_string(),
                expr,
            }),
            Err(err) => Err(E::custom(format!("invalid token value '{}': {}", value, err))),
        }
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(TokenValue {
            raw: value.to_string(),
            expr: Expression::Value(Value::Number(value as f64)),
        })
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(TokenValue {
            raw: value.to_string(),
            expr: Expression::Value(Value::Number(value as f64)),
        })
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(TokenValue {
            raw: format_number(value),
            expr: Expression::Value(Value::Number(value)),
        })
    }
}

impl<'de> Deserialize<'de> for TokenValue {
    fn deserialize<D>(deserializer: D) -> Result<TokenValue, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TokenValueVisitor)
    }
}

#[test]
fn test() {
    assert_eq!(
        value_parser::value("{hello.world}").unwrap(),
        Expression::Ref(vec!["hello".to_string(), "world".to_string()])
    );
    assert_eq!(
        value_parser::value("#ff00ff").unwrap(),
        Expression::Value(Value::Color(csscolorparser::parse("#ff00ff").unwrap()))
    );
    assert_eq!(
        value_parser::value("90%").unwrap(),
        Expression::Value(Value::Any("90%".to_string()))
    );
    assert_eq!(
        value_parser::value("ABC Diatype Variable").unwrap(),
        Expression::Value(Value::Any("ABC Diatype Variable".to_string()))
    );
    assert_eq!(
        value_parser::value("232.83").unwrap(),
        Expression::Value(Value::Number(232.83))
    );

    assert_eq!(
        value_parser::value("1px solid {color.border}").unwrap(),
        Expression::Parts(vec![
            Expression::Value(Value::Any("1px solid ".to_string())),
            Expression::Ref(vec!["color".to_string(), "border".to_string()]),
        ])
    );

    assert!(value_parser::value("{}").is_err());
    assert!(value_parser::value("{a..b}").is_err());
}

#[test]
fn test_deserialize() {
    let value: TokenValue = serde_json::from_str("\"{spacing.base}\"").unwrap();
    assert_eq!(value.raw, "{spacing.base}");
    assert_eq!(
        value.expr,
        Expression::Ref(vec!["spacing".to_string(), "base".to_string()])
    );

    let value: TokenValue = serde_json::from_str("4").unwrap();
    assert_eq!(value.raw, "4");
    assert_eq!(value.expr, Expression::Value(Value::Number(4.0)));

    let value: TokenValue = serde_json::from_str("0.5").unwrap();
    assert_eq!(value.raw, "0.5");

    assert!(serde_json::from_str::<TokenValue>("\"{broken\"").is_err());
}
