//! # Event Normalizer
//!
//! Maps a deal-platform webhook body into the canonical [`AttributeSet`].
//!
//! Webhook bodies arrive in two shapes: the investor nested under `investor`
//! with deal details under `deal`, or everything flattened under `data`. Every
//! field is looked up independently across the candidate objects, so either
//! shape (or a mix) normalizes the same way.

use crate::attributes::{AttributeSet, AttributeValue};
use crate::ValidationError;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Value stamped into `source` for records that entered through the webhook.
pub const WEBHOOK_SOURCE: &str = "deal-webhook";

// ============================================================================
// Event labels
// ============================================================================

/// Deal-platform event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DealEvent {
    Created,
    Updated,
    Signed,
    Funded,
    Accepted,
    Unrecognized,
}

impl DealEvent {
    /// Parse an event label such as `investor.funded`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "investor.created" => Self::Created,
            "investor.updated" => Self::Updated,
            "investor.signed" => Self::Signed,
            "investor.funded" => Self::Funded,
            "investor.accepted" => Self::Accepted,
            _ => Self::Unrecognized,
        }
    }
}

/// Value written by an event override.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PatchValue {
    Flag(bool),
    Text(&'static str),
}

impl From<PatchValue> for AttributeValue {
    fn from(value: PatchValue) -> Self {
        match value {
            PatchValue::Flag(b) => AttributeValue::Bool(b),
            PatchValue::Text(s) => AttributeValue::Text(s.to_string()),
        }
    }
}

/// Attribute patches applied per event type.
///
/// `Updated` and `Unrecognized` have no entry: their fields pass through as
/// extracted.
pub const EVENT_OVERRIDES: &[(DealEvent, &[(&str, PatchValue)])] = &[
    (DealEvent::Created, &[("checkout_started", PatchValue::Flag(true))]),
    (DealEvent::Signed, &[("investor_state", PatchValue::Text("signed"))]),
    (
        DealEvent::Funded,
        &[
            ("funded", PatchValue::Flag(true)),
            ("investor_state", PatchValue::Text("funded")),
        ],
    ),
    (DealEvent::Accepted, &[("investor_state", PatchValue::Text("accepted"))]),
];

/// Attribute patch for an event, empty when the event has none.
pub fn overrides_for(event: DealEvent) -> AttributeSet {
    EVENT_OVERRIDES
        .iter()
        .find(|(e, _)| *e == event)
        .map(|(_, patch)| {
            patch
                .iter()
                .map(|(key, value)| (key.to_string(), AttributeValue::from(*value)))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Field mapping
// ============================================================================

/// Which part of the webhook a field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldSource {
    Contact,
    Deal,
}

/// Incoming field name(s) → outgoing attribute key.
struct FieldMapping {
    incoming: &'static [&'static str],
    outgoing: &'static str,
    source: FieldSource,
}

const fn contact(incoming: &'static [&'static str], outgoing: &'static str) -> FieldMapping {
    FieldMapping {
        incoming,
        outgoing,
        source: FieldSource::Contact,
    }
}

const fn deal(incoming: &'static [&'static str], outgoing: &'static str) -> FieldMapping {
    FieldMapping {
        incoming,
        outgoing,
        source: FieldSource::Deal,
    }
}

const FIELD_MAPPINGS: &[FieldMapping] = &[
    contact(&["email"], "email"),
    contact(&["phone_number", "phone"], "phone"),
    contact(&["investment_amount"], "investment_amount"),
    contact(&["allocated_amount"], "allocated_amount"),
    contact(&["number_of_securities"], "number_of_securities"),
    contact(&["security_type"], "security_type_ecf26"),
    contact(&["state"], "investor_state"),
    contact(&["funds_state"], "funds_state_ecf26"),
    contact(&["investor_type"], "investor_type"),
    contact(&["accredited_investor"], "is_accredited"),
    contact(&["tags"], "tags"),
    contact(&["id"], "investor_id"),
    contact(&["funded_at"], "funded_at"),
    contact(&["street_address"], "address_street"),
    contact(&["unit2"], "address_unit"),
    contact(&["city"], "address_city"),
    contact(&["region"], "address_region"),
    contact(&["postal_code"], "address_postal_code"),
    contact(&["country"], "address_country"),
    contact(&["deal_id"], "deal_id"),
    deal(&["id"], "deal_id"),
    deal(&["title"], "deal_title"),
];

// ============================================================================
// Payload
// ============================================================================

/// Webhook body as delivered by the deal platform.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    /// Event label, e.g. `investor.signed`
    #[serde(default, alias = "event_type", alias = "type")]
    pub event: Option<String>,

    #[serde(default)]
    pub investor: Option<Map<String, Value>>,

    #[serde(default)]
    pub deal: Option<Map<String, Value>>,

    /// Flat shape: investor (and sometimes deal) fields inline
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl WebhookPayload {
    fn nested<'a>(map: Option<&'a Map<String, Value>>, key: &str) -> Option<&'a Map<String, Value>> {
        map.and_then(|m| m.get(key)).and_then(Value::as_object)
    }

    /// Objects searched for contact fields, most specific first.
    fn contact_objects(&self) -> Vec<&Map<String, Value>> {
        [
            self.investor.as_ref(),
            Self::nested(self.data.as_ref(), "investor"),
            self.data.as_ref(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Objects searched for deal fields.
    fn deal_objects(&self) -> Vec<&Map<String, Value>> {
        [self.deal.as_ref(), Self::nested(self.data.as_ref(), "deal")]
            .into_iter()
            .flatten()
            .collect()
    }

    /// First present value for any of `names` across `objects`.
    fn lookup(objects: &[&Map<String, Value>], names: &[&str]) -> Option<AttributeValue> {
        objects.iter().find_map(|object| {
            names
                .iter()
                .find_map(|name| object.get(*name).and_then(AttributeValue::from_json))
        })
    }

    pub fn event_label(&self) -> &str {
        self.event.as_deref().unwrap_or("")
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub event: DealEvent,
    pub label: String,
    pub attributes: AttributeSet,
}

/// Normalize a webhook body into an attribute set.
///
/// # Errors
///
/// Returns [`ValidationError::MissingContactMethod`] when the contact carries
/// neither an email address nor a phone number.
pub fn normalize(payload: &WebhookPayload) -> Result<NormalizedEvent, ValidationError> {
    let label = payload.event_label().to_string();
    let event = DealEvent::from_label(&label);
    let contacts = payload.contact_objects();
    let deals = payload.deal_objects();

    let email = WebhookPayload::lookup(&contacts, &["email"]);
    let phone = WebhookPayload::lookup(&contacts, &["phone_number", "phone"]);
    if email.is_none() && phone.is_none() {
        warn!(event = %label, "Rejecting webhook without email or phone");
        return Err(ValidationError::MissingContactMethod);
    }

    let mut attributes = AttributeSet::new();

    for mapping in FIELD_MAPPINGS {
        let objects = match mapping.source {
            FieldSource::Contact => &contacts,
            FieldSource::Deal => &deals,
        };
        attributes.insert_opt(
            mapping.outgoing,
            WebhookPayload::lookup(objects, mapping.incoming),
        );
    }

    // Name fields always exist so the record has something to display.
    let first_name = text_or_empty(WebhookPayload::lookup(&contacts, &["first_name"]));
    let last_name = text_or_empty(WebhookPayload::lookup(&contacts, &["last_name"]));
    let name = format!("{} {}", first_name, last_name).trim().to_string();
    attributes.insert("first_name", first_name);
    attributes.insert("last_name", last_name);
    attributes.insert("name", name);

    if let Some(fees) = ancillary_fees(&attributes) {
        attributes.insert("ancillary_fees", fees);
    }

    let patch = overrides_for(event);
    if event == DealEvent::Unrecognized {
        warn!(event = %label, "Unrecognized deal event; passing fields through");
    } else if !patch.is_empty() {
        debug!(event = %label, keys = patch.len(), "Applying event overrides");
    }
    attributes.apply(patch);

    if let Some(consent) =
        WebhookPayload::lookup(&contacts, &["consent"]).and_then(|v| v.as_bool())
    {
        attributes.insert("marketing_consent", consent);
        attributes.insert("sms_consent", consent);
    }

    attributes.insert("source", WEBHOOK_SOURCE);

    info!(
        event = %label,
        attribute_count = attributes.len(),
        has_email = attributes.email().is_some(),
        has_phone = attributes.phone().is_some(),
        "Normalized deal webhook"
    );

    Ok(NormalizedEvent {
        event,
        label,
        attributes,
    })
}

/// `allocated_amount - investment_amount`, only when both are present and
/// the difference is strictly positive.
pub fn ancillary_fees(attributes: &AttributeSet) -> Option<f64> {
    let allocated = attributes.number("allocated_amount")?;
    let invested = attributes.number("investment_amount")?;
    let fees = allocated - invested;
    if fees > 0.0 {
        Some(round_cents(fees))
    } else {
        None
    }
}

/// Round to cents so float subtraction noise does not leak into the record.
fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn text_or_empty(value: Option<AttributeValue>) -> String {
    value.and_then(|v| v.as_text()).unwrap_or_default()
}

#[cfg(test)]
#[path = "normalizer_tests.rs"]
mod tests;
