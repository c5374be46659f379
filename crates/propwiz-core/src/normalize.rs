//! Canonical comparable form of raw form values.
//!
//! A just-typed `"5"` must equal a persisted `5`, and an empty field must
//! equal an absent one, so that dirty-checking ignores cosmetic differences.

use std::collections::BTreeMap;

use serde_json::Value;

/// Canonical form of a form value.
#[derive(Debug, Clone, PartialEq)]
pub enum Canonical {
    /// Null, absent, or a blank string
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<Canonical>),
    Record(BTreeMap<String, Canonical>),
}

/// Normalizes one leaf value.
///
/// - `null`, absent and blank strings become [`Canonical::Empty`]
/// - strings are trimmed; numeric-looking ones become numbers
/// - booleans and numbers pass through
///
/// Lists and objects are normalized element-wise; an empty list or object
/// is [`Canonical::Empty`] so it matches an absent field.
pub fn normalize(value: Option<&Value>) -> Canonical {
    match value {
        None | Some(Value::Null) => Canonical::Empty,
        Some(Value::Bool(flag)) => Canonical::Bool(*flag),
        Some(Value::Number(number)) => number
            .as_f64()
            .map(Canonical::Number)
            .unwrap_or_else(|| Canonical::Text(number.to_string())),
        Some(Value::String(text)) => normalize_text(text),
        Some(Value::Array(items)) if items.is_empty() => Canonical::Empty,
        Some(Value::Array(items)) => {
            Canonical::List(items.iter().map(|item| normalize(Some(item))).collect())
        }
        Some(Value::Object(fields)) => {
            let record: BTreeMap<String, Canonical> = fields
                .iter()
                .map(|(key, field)| (key.clone(), normalize(Some(field))))
                .filter(|(_, field)| *field != Canonical::Empty)
                .collect();
            if record.is_empty() {
                Canonical::Empty
            } else {
                Canonical::Record(record)
            }
        }
    }
}

fn normalize_text(text: &str) -> Canonical {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Canonical::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => Canonical::Number(number),
        _ => Canonical::Text(trimmed.to_string()),
    }
}
