//! Lenient readers for request values coming from plugin templates.
//!
//! Callers frequently send unsubstituted placeholders (`"{gogglesId}"`),
//! literal `"undefined"`/`"null"` strings, or numbers encoded as strings. These
//! helpers collapse all of that into `Option`s before any field is forwarded.

use serde_json::Value;

/// Returns the trimmed textual form of `value`, or `None` when the value
/// carries nothing worth forwarding.
pub fn normalize(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };

    if text.is_empty()
        || text.eq_ignore_ascii_case("undefined")
        || text.eq_ignore_ascii_case("null")
        || is_placeholder(&text)
    {
        return None;
    }
    Some(text)
}

/// Trimmed text of a required free-text field such as a search query.
/// Only blank or missing values are rejected; placeholder-looking text is
/// kept because it may be exactly what the user typed.
pub fn required_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn is_placeholder(text: &str) -> bool {
    text.len() >= 2 && text.starts_with('{') && text.ends_with('}')
}

/// Integer from a JSON integer or a numeric string. Floats and anything else
/// yield `None`.
pub fn parse_int(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        other => normalize(Some(other))?.parse().ok(),
    }
}

/// Boolean from a JSON bool or a `"true"`/`"false"` string.
pub fn parse_flag(value: Option<&Value>, default: bool) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => true,
            "false" => false,
            _ => default,
        },
        _ => default,
    }
}

/// Serde adapter for lenient flags inside derived request models.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = serde::Deserialize::deserialize(deserializer)?;
    Ok(parse_flag(value.as_ref(), false))
}

/// Serde adapter for document text: `null` reads as empty, scalars keep
/// their JSON form.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<Value> = serde::Deserialize::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(other @ (Value::Number(_) | Value::Bool(_))) => Ok(other.to_string()),
        Some(_) => Err(serde::de::Error::custom("text must be a string")),
    }
}
