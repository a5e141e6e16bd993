use serde::{Deserialize, Serialize};

use crate::error::TaleError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaleValue {
    Bool(bool),
    Number(f64),
    String(String),
}

impl TaleValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
        }
    }
}

/// Parses a typed literal as written in scenario source: `true`/`false`,
/// a number, or a single- or double-quoted string. Anything else is a
/// load-time fatal error.
pub fn parse_literal(raw: &str) -> Result<TaleValue, TaleError> {
    let trimmed = raw.trim();
    match trimmed {
        "true" => return Ok(TaleValue::Bool(true)),
        "false" => return Ok(TaleValue::Bool(false)),
        _ => {}
    }

    if let Ok(number) = trimmed.parse::<f64>() {
        return Ok(TaleValue::Number(number));
    }

    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return Ok(TaleValue::String(
                trimmed[1..trimmed.len() - 1].to_string(),
            ));
        }
    }

    Err(TaleError::new(
        "LITERAL_INVALID",
        format!(
            "Literal \"{}\" is not a boolean, number, or quoted string.",
            trimmed
        ),
    ))
}
