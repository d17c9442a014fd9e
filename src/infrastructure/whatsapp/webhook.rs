use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{
    events::{InboundMessageEvent, ProviderEvent, StatusEvent},
    models::ProviderStatus,
};

const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

#[derive(Debug, Default, PartialEq)]
pub struct ParsedWebhook {
    pub events: Vec<ProviderEvent>,
    /// Entries that were present but could not be understood.
    pub skipped: usize,
}

/// Extracts status and inbound-message events from a webhook body. Every
/// entry is decoded on its own, so one malformed status never hides its
/// siblings, and absent arrays simply contribute nothing.
pub fn parse_webhook(body: &Value, received_at: DateTime<Utc>) -> ParsedWebhook {
    let mut parsed = ParsedWebhook::default();

    if body.get("object").and_then(Value::as_str) != Some(BUSINESS_ACCOUNT_OBJECT) {
        return parsed;
    }

    let values = array(body, "entry")
        .flat_map(|entry| array(entry, "changes"))
        .filter_map(|change| change.get("value"));

    for value in values {
        for raw in array(value, "statuses") {
            match decode_status(raw, received_at) {
                Some(event) => parsed.events.push(ProviderEvent::Status(event)),
                None => {
                    warn!(entry = %raw, "skipping malformed status entry");
                    parsed.skipped += 1;
                }
            }
        }

        let contacts: Vec<RawContact> = array(value, "contacts")
            .filter_map(|raw| RawContact::deserialize(raw).ok())
            .collect();

        for raw in array(value, "messages") {
            match decode_message(raw, &contacts) {
                Some(event) => parsed.events.push(ProviderEvent::InboundMessage(event)),
                None => {
                    warn!(entry = %raw, "skipping malformed inbound message");
                    parsed.skipped += 1;
                }
            }
        }
    }

    parsed
}

fn array<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

#[derive(Debug, Deserialize)]
struct RawStatus {
    id: String,
    status: String,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    recipient_id: Option<String>,
    #[serde(default)]
    errors: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: String,
    from: String,
    #[serde(default, rename = "type")]
    message_type: Option<String>,
    #[serde(default)]
    timestamp: Option<Value>,
    #[serde(default)]
    text: Option<RawText>,
}

#[derive(Debug, Deserialize)]
struct RawText {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawContact {
    wa_id: String,
    #[serde(default)]
    profile: Option<RawProfile>,
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    #[serde(default)]
    name: Option<String>,
}

fn decode_status(raw: &Value, received_at: DateTime<Utc>) -> Option<StatusEvent> {
    let raw = RawStatus::deserialize(raw).ok()?;
    let status = ProviderStatus::from_str(&raw.status)?;
    Some(StatusEvent {
        provider_message_id: raw.id,
        status,
        occurred_at: raw
            .timestamp
            .as_ref()
            .and_then(parse_timestamp)
            .unwrap_or(received_at),
        recipient: raw.recipient_id,
        errors: raw.errors.filter(|errors| !errors.is_null()),
    })
}

fn decode_message(raw: &Value, contacts: &[RawContact]) -> Option<InboundMessageEvent> {
    let raw = RawMessage::deserialize(raw).ok()?;
    let contact_name = contacts
        .iter()
        .find(|contact| contact.wa_id == raw.from)
        .and_then(|contact| contact.profile.as_ref())
        .and_then(|profile| profile.name.clone());
    Some(InboundMessageEvent {
        provider_message_id: raw.id,
        message_type: raw.message_type.unwrap_or_else(|| "unknown".to_string()),
        text: raw.text.and_then(|text| text.body),
        occurred_at: raw.timestamp.as_ref().and_then(parse_timestamp),
        from: raw.from,
        contact_name,
    })
}

/// Provider timestamps are unix seconds, sent as a string or a number.
fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::String(text) => text.trim().parse::<i64>().ok()?,
        Value::Number(number) => number.as_i64()?,
        _ => return None,
    };
    DateTime::from_timestamp(seconds, 0)
}
