//! # Attribute Sets
//!
//! Flat, optional-field description of one contact, assembled per request.
//!
//! Keys that have no value are simply absent: JSON `null`s and values with no
//! scalar content are dropped when an attribute set is deserialized. Blank
//! text that does reach a set (the normalizer's name defaults) is skipped by
//! the property mapper, so an update built from a partial set never clears
//! fields the caller did not mention.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// Convert an arbitrary JSON value taken from a webhook body.
    ///
    /// Returns `None` for `null`, blank strings, objects, and arrays with no
    /// scalar members.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Object(_) => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self::Text(trimmed.to_string()))
                }
            }
            Value::Array(items) => {
                let list: Vec<String> = items
                    .iter()
                    .filter_map(|item| Self::from_json(item).and_then(|v| v.as_text()))
                    .collect();
                if list.is_empty() {
                    None
                } else {
                    Some(Self::List(list))
                }
            }
        }
    }

    /// Text rendering of scalar values. Lists are joined with `", "`.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(s) => Some(s.clone()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Bool(b) => Some(b.to_string()),
            Self::List(items) => Some(items.join(", ")),
        }
    }

    /// Numeric coercion. Text is parsed after stripping thousands separators
    /// and a leading currency sign.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .trim_start_matches('$')
                    .chars()
                    .filter(|c| *c != ',')
                    .collect();
                cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
            }
            Self::Bool(_) | Self::List(_) => None,
        }
    }

    /// Boolean coercion. Accepts `true/false`, `yes/no`, `1/0` (any case).
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Number(n) => Some(*n != 0.0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" | "on" => Some(true),
                "false" | "no" | "n" | "0" | "off" => Some(false),
                _ => None,
            },
            Self::List(_) => None,
        }
    }

    /// List coercion. Text is split on commas.
    pub fn as_list(&self) -> Option<Vec<String>> {
        let items: Vec<String> = match self {
            Self::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Self::Text(s) => s
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect(),
            Self::Number(_) | Self::Bool(_) => self.as_text().into_iter().collect(),
        };
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}

/// Render a number without a trailing `.0` when it is integral.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Mapping from attribute key to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, AttributeValue>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }

    /// Insert only when a value is present.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<AttributeValue>) {
        if let Some(value) = value {
            self.0.insert(key.into(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }

    /// Text value for `key`, trimmed; blank text counts as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key)
            .and_then(AttributeValue::as_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Numeric value for `key`, coerced from text when necessary.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttributeValue::as_number)
    }

    pub fn email(&self) -> Option<String> {
        self.text("email")
    }

    pub fn phone(&self) -> Option<String> {
        self.text("phone")
    }

    /// True when at least one of email or phone carries a non-blank value.
    pub fn has_contact_method(&self) -> bool {
        self.email().is_some() || self.phone().is_some()
    }

    /// Overwrite keys in `self` with every key in `patch`.
    pub fn apply(&mut self, patch: AttributeSet) {
        self.0.extend(patch.0);
    }
}

impl<'de> Deserialize<'de> for AttributeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Same conversion as webhook fields: values without scalar content
        // are dropped instead of failing the whole set.
        let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
        Ok(Self(
            raw.into_iter()
                .filter_map(|(key, value)| AttributeValue::from_json(&value).map(|v| (key, v)))
                .collect(),
        ))
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "attributes_tests.rs"]
mod tests;
