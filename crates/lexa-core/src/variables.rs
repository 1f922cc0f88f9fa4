//! Template variable tracking.
//!
//! The backend sends the variable map either as a JSON object or as a string
//! holding JSON. [`VariableState::decode`] turns either shape into a tagged
//! state so callers can see when decoding fell back to the raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Current values for a template's slots, keyed by variable name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableSet(BTreeMap<String, String>);

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a JSON object, stringifying non-string values.
    ///
    /// `null` becomes an empty value; numbers and booleans keep their JSON text.
    pub fn from_json_map(map: Map<String, Value>) -> Self {
        map.into_iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Names whose value is still blank.
    pub fn unfilled(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// The `variables` field exactly as it appears in a backend response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VariablesWire {
    /// A structured JSON object.
    Map(Map<String, Value>),
    /// JSON text that should hold an object.
    Encoded(String),
    /// Field absent or `null`.
    #[default]
    Missing,
    /// Anything else (arrays, numbers, ...).
    Other(Value),
}

/// Variable state tracked by the client for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VariableState {
    /// Nothing known yet, or the backend omitted the field.
    #[default]
    Unset,
    /// A usable variable map.
    Decoded(VariableSet),
    /// The backend sent text that is not a JSON object. Kept verbatim.
    Raw { raw: String, error: String },
}

impl VariableState {
    /// Decodes a wire value, never failing.
    ///
    /// Undecodable text is kept as [`VariableState::Raw`] and logged.
    pub fn decode(wire: VariablesWire) -> Self {
        match wire {
            VariablesWire::Map(map) => Self::Decoded(VariableSet::from_json_map(map)),
            VariablesWire::Encoded(text) => match decode_encoded_map(&text) {
                Ok(map) => Self::Decoded(VariableSet::from_json_map(map)),
                Err(error) => {
                    tracing::warn!("[Variables] Failed to decode encoded variables: {}", error);
                    Self::Raw { raw: text, error }
                }
            },
            VariablesWire::Missing => Self::Unset,
            VariablesWire::Other(value) => {
                let error = format!("expected an object, got {}", json_kind(&value));
                tracing::warn!("[Variables] Unexpected variables payload: {}", error);
                Self::Raw {
                    raw: value.to_string(),
                    error,
                }
            }
        }
    }

    pub fn as_set(&self) -> Option<&VariableSet> {
        match self {
            Self::Decoded(set) => Some(set),
            _ => None,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Self::Decoded(_))
    }

    /// Value sent back to the backend on the next fill request.
    ///
    /// `Unset` goes out as an empty object; raw text is echoed as a string.
    pub fn to_wire(&self) -> Value {
        match self {
            Self::Unset => Value::Object(Map::new()),
            Self::Decoded(set) => set.to_json(),
            Self::Raw { raw, .. } => Value::String(raw.clone()),
        }
    }
}

/// Parses JSON text into an object.
///
/// Accepts a bare object, an object wrapped in a ```json fence, or an object
/// surrounded by stray prose.
fn decode_encoded_map(text: &str) -> Result<Map<String, Value>, String> {
    let attempt = |s: &str| serde_json::from_str::<Map<String, Value>>(s);

    let first_error = match attempt(text) {
        Ok(map) => return Ok(map),
        Err(e) => e.to_string(),
    };

    let cleaned = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();
    if let Ok(map) = attempt(cleaned) {
        return Ok(map);
    }

    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}'))
        && start < end
        && let Ok(map) = attempt(&text[start..=end])
    {
        return Ok(map);
    }

    Err(first_error)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
