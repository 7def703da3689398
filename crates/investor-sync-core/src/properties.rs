//! # Property Mapping
//!
//! Declarative table from attribute key to store property name and type.
//! Adding a field to the record schema is a new row in [`PROPERTY_TABLE`].

use crate::attributes::{AttributeSet, AttributeValue};
use chrono::{DateTime, Utc};
use docstore_sdk::{PropertyMap, PropertyValue};
use tracing::{debug, warn};

pub const EMAIL_PROPERTY: &str = "Email";
pub const PHONE_PROPERTY: &str = "Phone";
pub const MAILING_ADDRESS_PROPERTY: &str = "Mailing Address";
pub const CREATED_AT_PROPERTY: &str = "Created At";
pub const LAST_UPDATED_PROPERTY: &str = "Last Updated";
pub const GROUP_PROPERTY: &str = "Group";

/// Address sub-fields in the order they are joined.
pub const ADDRESS_FIELDS: &[&str] = &[
    "address_street",
    "address_unit",
    "address_city",
    "address_region",
    "address_postal_code",
    "address_country",
];

/// Store property type and the coercion applied to reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    Email,
    Phone,
    Number,
    Checkbox,
    Select,
    MultiSelect,
    Date,
}

impl PropertyKind {
    /// Coerce an attribute value into this property type.
    ///
    /// Returns `None` when the value cannot be represented. Blank text is
    /// `None` for every text-like kind: an empty title or rich text run list
    /// would clear the stored property.
    pub fn coerce(self, value: &AttributeValue) -> Option<PropertyValue> {
        match self {
            Self::Title => non_blank(value).map(PropertyValue::title),
            Self::RichText => non_blank(value).map(PropertyValue::rich_text),
            Self::Email => non_blank(value).map(PropertyValue::Email),
            Self::Phone => non_blank(value).map(PropertyValue::PhoneNumber),
            Self::Number => value.as_number().map(PropertyValue::Number),
            Self::Checkbox => value.as_bool().map(PropertyValue::Checkbox),
            Self::Select => non_blank(value).map(PropertyValue::select),
            Self::MultiSelect => value.as_list().map(PropertyValue::multi_select),
            Self::Date => non_blank(value).map(PropertyValue::date_str),
        }
    }
}

fn non_blank(value: &AttributeValue) -> Option<String> {
    value
        .as_text()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// One row of the property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRule {
    pub attribute: &'static str,
    pub property: &'static str,
    pub kind: PropertyKind,
}

const fn rule(attribute: &'static str, property: &'static str, kind: PropertyKind) -> PropertyRule {
    PropertyRule {
        attribute,
        property,
        kind,
    }
}

/// Canonical attribute → property table shared by every entry point.
pub const PROPERTY_TABLE: &[PropertyRule] = &[
    rule("name", "Name", PropertyKind::Title),
    rule("email", EMAIL_PROPERTY, PropertyKind::Email),
    rule("phone", PHONE_PROPERTY, PropertyKind::Phone),
    rule("first_name", "First Name", PropertyKind::RichText),
    rule("last_name", "Last Name", PropertyKind::RichText),
    rule("investment_amount", "Investment Amount", PropertyKind::Number),
    rule("allocated_amount", "Allocated Amount", PropertyKind::Number),
    rule("ancillary_fees", "Ancillary Fees", PropertyKind::Number),
    rule("number_of_securities", "Number of Securities", PropertyKind::Number),
    rule("security_type_ecf26", "Security Type", PropertyKind::Select),
    rule("investor_state", "Investor State", PropertyKind::Select),
    rule("funds_state_ecf26", "Funding State", PropertyKind::Select),
    rule("investor_type", "Investor Type", PropertyKind::Select),
    rule("source", "Source", PropertyKind::Select),
    rule("is_accredited", "Accredited", PropertyKind::Checkbox),
    rule("checkout_started", "Checkout Started", PropertyKind::Checkbox),
    rule("funded", "Funded", PropertyKind::Checkbox),
    rule("marketing_consent", "Marketing Consent", PropertyKind::Checkbox),
    rule("sms_consent", "SMS Consent", PropertyKind::Checkbox),
    rule("tags", "Tags", PropertyKind::MultiSelect),
    rule("investor_id", "Investor ID", PropertyKind::RichText),
    rule("deal_id", "Deal ID", PropertyKind::RichText),
    rule("deal_title", "Deal", PropertyKind::RichText),
    rule("utm_source", "UTM Source", PropertyKind::RichText),
    rule("utm_medium", "UTM Medium", PropertyKind::RichText),
    rule("utm_campaign", "UTM Campaign", PropertyKind::RichText),
    rule("notes", "Notes", PropertyKind::RichText),
    rule("funded_at", "Funded Date", PropertyKind::Date),
];

/// Look up the table row for an attribute key.
pub fn rule_for(attribute: &str) -> Option<&'static PropertyRule> {
    PROPERTY_TABLE.iter().find(|s| s.attribute == attribute)
}

/// Join present address sub-fields with `", "`.
///
/// Returns `None` when no sub-field is present.
pub fn mailing_address(attributes: &AttributeSet) -> Option<String> {
    let parts: Vec<String> = ADDRESS_FIELDS
        .iter()
        .filter_map(|field| attributes.text(field))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Per-call inputs to [`build_properties`] that do not come from the
/// attribute set.
#[derive(Debug, Clone)]
pub struct MappingContext<'a> {
    /// Group record every upserted record is related to
    pub group_record_id: &'a str,
    /// True when no existing record was resolved
    pub is_new_record: bool,
    pub now: DateTime<Utc>,
}

/// Map an attribute set onto typed store properties.
///
/// Values that cannot be coerced are skipped with a warning. Bookkeeping
/// properties are added on top: the group relation and `Last Updated` on
/// every call, `Created At` only for new records.
pub fn build_properties(attributes: &AttributeSet, context: &MappingContext<'_>) -> PropertyMap {
    let mut properties = PropertyMap::new();

    for (key, value) in attributes.iter() {
        let Some(rule) = rule_for(key) else {
            if !ADDRESS_FIELDS.contains(&key.as_str()) {
                debug!(attribute = %key, "No property mapping for attribute; ignoring");
            }
            continue;
        };

        match rule.kind.coerce(value) {
            Some(property) => {
                properties.insert(rule.property.to_string(), property);
            }
            None => warn!(
                attribute = %key,
                property = rule.property,
                kind = ?rule.kind,
                "Attribute value could not be coerced; skipping"
            ),
        }
    }

    if let Some(address) = mailing_address(attributes) {
        properties.insert(
            MAILING_ADDRESS_PROPERTY.to_string(),
            PropertyValue::rich_text(address),
        );
    }

    if context.is_new_record {
        properties.insert(
            CREATED_AT_PROPERTY.to_string(),
            PropertyValue::date(context.now),
        );
    }
    properties.insert(
        LAST_UPDATED_PROPERTY.to_string(),
        PropertyValue::date(context.now),
    );
    properties.insert(
        GROUP_PROPERTY.to_string(),
        PropertyValue::relation(context.group_record_id),
    );

    properties
}

#[cfg(test)]
#[path = "properties_tests.rs"]
mod tests;
