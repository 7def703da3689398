//! Typed page property values.
//!
//! Each variant serializes to the store's externally tagged JSON shape, e.g.
//! `PropertyValue::Email("a@b.c")` becomes `{"email": "a@b.c"}` and
//! `PropertyValue::Select(..)` becomes `{"select": {"name": "..."}}`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Property values keyed by property display name.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single typed property value as written to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Title(Vec<RichText>),
    RichText(Vec<RichText>),
    Email(String),
    PhoneNumber(String),
    Number(f64),
    Checkbox(bool),
    Select(SelectOption),
    MultiSelect(Vec<SelectOption>),
    Date(DateValue),
    Relation(Vec<RelationRef>),
}

impl PropertyValue {
    /// Title property holding a single text run.
    pub fn title(content: impl Into<String>) -> Self {
        Self::Title(RichText::runs(content))
    }

    /// Rich text property holding a single text run.
    ///
    /// An empty string produces an empty run list, which clears the property.
    pub fn rich_text(content: impl Into<String>) -> Self {
        Self::RichText(RichText::runs(content))
    }

    pub fn select(name: impl Into<String>) -> Self {
        Self::Select(SelectOption { name: name.into() })
    }

    pub fn multi_select<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiSelect(
            names
                .into_iter()
                .map(|name| SelectOption { name: name.into() })
                .collect(),
        )
    }

    /// Date property with a start instant and no end.
    pub fn date(at: DateTime<Utc>) -> Self {
        Self::Date(DateValue {
            start: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            end: None,
        })
    }

    /// Date property from an already formatted ISO-8601 string.
    pub fn date_str(start: impl Into<String>) -> Self {
        Self::Date(DateValue {
            start: start.into(),
            end: None,
        })
    }

    pub fn relation(id: impl Into<String>) -> Self {
        Self::Relation(vec![RelationRef { id: id.into() }])
    }
}

/// One run of rich text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: TextContent,
}

impl RichText {
    fn runs(content: impl Into<String>) -> Vec<Self> {
        let content = content.into();
        if content.is_empty() {
            Vec::new()
        } else {
            vec![Self {
                text: TextContent { content },
            }]
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
}

/// Option reference for select and multi-select properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Reference to another page for relation properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
