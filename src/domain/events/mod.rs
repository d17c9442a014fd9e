use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::models::ProviderStatus;

/// Delivery status callback for a previously sent message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusEvent {
    pub provider_message_id: String,
    pub status: ProviderStatus,
    pub occurred_at: DateTime<Utc>,
    pub recipient: Option<String>,
    pub errors: Option<serde_json::Value>,
}

/// Message sent by a recipient to the business number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessageEvent {
    pub provider_message_id: String,
    pub from: String,
    pub message_type: String,
    pub text: Option<String>,
    pub contact_name: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ProviderEvent {
    Status(StatusEvent),
    InboundMessage(InboundMessageEvent),
}
