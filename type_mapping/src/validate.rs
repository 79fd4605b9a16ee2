//! Validation utilities for type mapping
//!
//! This module checks that an attribute's textual default value can be
//! stored under the attribute's value kind.

use crate::types::AttributeType;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Longest value accepted for `AttributeType::String`
pub const MAX_STRING_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value '{value}' is not a valid {kind} default: {reason}")]
pub struct DefaultValueError {
    pub kind: AttributeType,
    pub value: String,
    pub reason: &'static str,
}

impl DefaultValueError {
    fn new(kind: AttributeType, value: &str, reason: &'static str) -> Self {
        Self {
            kind,
            value: value.to_string(),
            reason,
        }
    }
}

/// Check that `value` is a valid default for `kind`
pub fn validate_default_value(kind: AttributeType, value: &str) -> Result<(), DefaultValueError> {
    parse_default_value(kind, value).map(|_| ())
}

/// Convert a textual default into the JSON value stored for `kind`
pub fn parse_default_value(kind: AttributeType, value: &str) -> Result<Value, DefaultValueError> {
    let trimmed = value.trim();
    match kind {
        AttributeType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(DefaultValueError::new(kind, value, "expected true or false")),
        },
        AttributeType::Integer => trimmed
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| DefaultValueError::new(kind, value, "expected an integer")),
        AttributeType::Decimal | AttributeType::Money => {
            if is_decimal_literal(trimmed) {
                // Kept as text to preserve precision
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(DefaultValueError::new(kind, value, "expected a decimal number"))
            }
        }
        AttributeType::String => {
            if value.chars().count() > MAX_STRING_LENGTH {
                Err(DefaultValueError::new(kind, value, "value is too long"))
            } else {
                Ok(Value::String(value.to_string()))
            }
        }
        AttributeType::Text => Ok(Value::String(value.to_string())),
        AttributeType::DateTime => {
            if chrono::DateTime::parse_from_rfc3339(trimmed).is_ok()
                || chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok()
            {
                Ok(Value::String(trimmed.to_string()))
            } else {
                Err(DefaultValueError::new(kind, value, "expected an RFC 3339 date"))
            }
        }
        AttributeType::Json => serde_json::from_str(trimmed)
            .map_err(|_| DefaultValueError::new(kind, value, "expected JSON")),
        AttributeType::Dictionary => {
            if trimmed.is_empty() {
                Err(DefaultValueError::new(kind, value, "expected a dictionary item alias"))
            } else {
                Ok(Value::String(trimmed.to_string()))
            }
        }
        AttributeType::Entity => parse_entity_reference(kind, value, trimmed),
        AttributeType::DictionarySet | AttributeType::EntitySet => {
            let items: Vec<Value> = serde_json::from_str(trimmed)
                .map_err(|_| DefaultValueError::new(kind, value, "expected a JSON array"))?;
            for item in &items {
                let valid = match (kind, item) {
                    (AttributeType::DictionarySet, Value::String(alias)) => !alias.is_empty(),
                    (AttributeType::EntitySet, Value::String(key)) => Uuid::parse_str(key).is_ok(),
                    (AttributeType::EntitySet, Value::Number(key)) => key.is_i64(),
                    _ => false,
                };
                if !valid {
                    return Err(DefaultValueError::new(kind, value, "invalid set item"));
                }
            }
            Ok(Value::Array(items))
        }
    }
}

fn parse_entity_reference(
    kind: AttributeType,
    value: &str,
    trimmed: &str,
) -> Result<Value, DefaultValueError> {
    if let Ok(key) = Uuid::parse_str(trimmed) {
        return Ok(Value::String(key.to_string()));
    }
    trimmed
        .parse::<i64>()
        .map(Value::from)
        .map_err(|_| DefaultValueError::new(kind, value, "expected an entity key"))
}

fn is_decimal_literal(text: &str) -> bool {
    let digits = text.strip_prefix(&['-', '+'][..]).unwrap_or(text);
    let mut parts = digits.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let whole_ok = !whole.is_empty() && whole.chars().all(|c| c.is_ascii_digit());
    match fraction {
        Some(fraction) => {
            whole_ok && !fraction.is_empty() && fraction.chars().all(|c| c.is_ascii_digit())
        }
        None => whole_ok,
    }
}
