use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    Birthday,
    Anniversary,
    Festival,
    Apology,
    Appreciation,
    Congratulations,
    GetWellSoon,
    JustBecause,
}

impl Occasion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Occasion::Birthday => "birthday",
            Occasion::Anniversary => "anniversary",
            Occasion::Festival => "festival",
            Occasion::Apology => "apology",
            Occasion::Appreciation => "appreciation",
            Occasion::Congratulations => "congratulations",
            Occasion::GetWellSoon => "get_well_soon",
            Occasion::JustBecause => "just_because",
        }
    }

    /// Human readable name placed into the greeting template.
    pub fn label(&self) -> &'static str {
        match self {
            Occasion::Birthday => "Birthday",
            Occasion::Anniversary => "Anniversary",
            Occasion::Festival => "Festival",
            Occasion::Apology => "Apology",
            Occasion::Appreciation => "Appreciation",
            Occasion::Congratulations => "Congratulations",
            Occasion::GetWellSoon => "Get Well Soon",
            Occasion::JustBecause => "Just Because",
        }
    }

    /// Accepts both the stored form (`get_well_soon`) and the label (`Get Well Soon`).
    pub fn from_str(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "birthday" => Some(Occasion::Birthday),
            "anniversary" => Some(Occasion::Anniversary),
            "festival" => Some(Occasion::Festival),
            "apology" => Some(Occasion::Apology),
            "appreciation" => Some(Occasion::Appreciation),
            "congratulations" => Some(Occasion::Congratulations),
            "get_well_soon" => Some(Occasion::GetWellSoon),
            "just_because" => Some(Occasion::JustBecause),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WishStatus {
    Scheduled,
    Sending,
    Sent,
    Failed,
}

impl WishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WishStatus::Scheduled => "scheduled",
            WishStatus::Sending => "sending",
            WishStatus::Sent => "sent",
            WishStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "scheduled" => Some(WishStatus::Scheduled),
            "sending" => Some(WishStatus::Sending),
            "sent" => Some(WishStatus::Sent),
            "failed" => Some(WishStatus::Failed),
            _ => None,
        }
    }
}

/// Delivery state reported by the messaging provider after a send.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Sent,
    Delivered,
    Read,
    Failed,
}

impl ProviderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderStatus::Sent => "sent",
            ProviderStatus::Delivered => "delivered",
            ProviderStatus::Read => "read",
            ProviderStatus::Failed => "failed",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "sent" => Some(ProviderStatus::Sent),
            "delivered" => Some(ProviderStatus::Delivered),
            "read" => Some(ProviderStatus::Read),
            "failed" => Some(ProviderStatus::Failed),
            _ => None,
        }
    }

    /// Tie-breaker for callbacks carrying the same provider timestamp.
    pub fn rank(&self) -> i32 {
        match self {
            ProviderStatus::Sent => 1,
            ProviderStatus::Delivered => 2,
            ProviderStatus::Read => 3,
            ProviderStatus::Failed => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Document,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Document => "document",
        }
    }
}

/// Durable storage references attached to a wish, at most one per kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachments {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
}

impl Attachments {
    pub fn url(&self, kind: MediaKind) -> Option<&str> {
        let url = match kind {
            MediaKind::Image => self.image_url.as_deref(),
            MediaKind::Video => self.video_url.as_deref(),
            MediaKind::Document => self.document_url.as_deref(),
        };
        url.filter(|value| !value.trim().is_empty())
    }

    pub fn has(&self, kind: MediaKind) -> bool {
        self.url(kind).is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wish {
    pub id: Uuid,
    pub sender_name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub occasion: Occasion,
    pub message_text: Option<String>,
    pub language: String,
    pub attachments: Attachments,
    pub scheduled_at: DateTime<Utc>,
    pub status: WishStatus,
    pub claimed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub provider_message_id: Option<String>,
    pub provider_status: Option<ProviderStatus>,
    pub provider_status_updated_at: Option<DateTime<Utc>>,
    pub provider_event_at: Option<DateTime<Utc>>,
    pub provider_error: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewWish {
    pub sender_name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub occasion: Occasion,
    pub message_text: Option<String>,
    pub language: String,
    pub attachments: Attachments,
    pub scheduled_at: DateTime<Utc>,
}

impl Wish {
    pub fn from_new(new: NewWish, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_name: new.sender_name,
            recipient_name: new.recipient_name,
            recipient_phone: new.recipient_phone,
            occasion: new.occasion,
            message_text: new.message_text,
            language: new.language,
            attachments: new.attachments,
            scheduled_at: new.scheduled_at,
            status: WishStatus::Scheduled,
            claimed_at: None,
            delivered_at: None,
            provider_message_id: None,
            provider_status: None,
            provider_status_updated_at: None,
            provider_event_at: None,
            provider_error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Terminal fields written once every planned message for a wish was attempted.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub status: WishStatus,
    pub delivered_at: Option<DateTime<Utc>>,
    pub provider_message_id: Option<String>,
    pub provider_status: ProviderStatus,
    pub status_updated_at: DateTime<Utc>,
    pub errors: Option<Vec<String>>,
}

impl DeliveryOutcome {
    pub fn error_payload(&self) -> Option<serde_json::Value> {
        self.errors
            .as_ref()
            .map(|errors| serde_json::json!({ "errors": errors }))
    }
}
