//! Literal example values: parsing author-supplied text and formatting
//! example payloads for display.
use serde_json::Value;

use crate::ty::GenericType;

/// Interpret an author-supplied literal against `ty`.
///
/// Text for a primitive type is kept verbatim. Text for any other type is
/// parsed as JSON; malformed JSON is logged and treated as absent, so the
/// caller falls back to synthesis. Empty text and `null` are absent, and a
/// literal that is already structured is used as-is.
pub fn parse(ty: &GenericType, literal: Option<&Value>) -> Option<Value> {
    match literal? {
        Value::Null => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) if ty.is_basic_type() => Some(Value::String(text.clone())),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => Some(value),
            Err(error) => {
                tracing::debug!(
                    %ty,
                    literal = %text,
                    %error,
                    "failed to parse the example value, falling back to a generated one"
                );
                None
            }
        },
        other => Some(other.clone()),
    }
}

/// Objects and arrays become 2-space indented JSON; scalars pass through
/// as their plain text.
pub fn format(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Array(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => scalar_text(other),
    }
}

/// Plain text of a scalar: strings without quotes, everything else as JSON.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
