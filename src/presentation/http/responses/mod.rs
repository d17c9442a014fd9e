use poem_openapi::Object;
use uuid::Uuid;

use crate::presentation::models::{OccasionKind, ProviderStatusDto, WishStatusDto};

#[derive(Object)]
pub struct WishDispatchResultDto {
    pub wish_id: Uuid,
    pub recipient_name: String,
    pub status: WishStatusDto,
    pub messages_planned: u32,
    pub messages_sent: u32,
    pub provider_message_id: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Object)]
pub struct DispatchResponseDto {
    pub success: bool,
    pub reclaimed: u32,
    pub claimed: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped: u32,
    pub results: Vec<WishDispatchResultDto>,
    pub errors: Vec<String>,
}

#[derive(Object)]
pub struct ReclaimResponseDto {
    pub reclaimed: Vec<Uuid>,
}

#[derive(Object)]
pub struct TestMessageResponseDto {
    pub success: bool,
    pub message_id: String,
}

#[derive(Object)]
pub struct BroadcastResultDto {
    pub phone: String,
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Object)]
pub struct BroadcastResponseDto {
    pub total: u32,
    pub successful: u32,
    pub failed: u32,
    pub results: Vec<BroadcastResultDto>,
}

#[derive(Object)]
pub struct WishDto {
    pub id: Uuid,
    pub sender_name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub occasion: OccasionKind,
    pub message_text: Option<String>,
    pub language: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
    pub scheduled_at: String,
    pub status: WishStatusDto,
    pub delivered_at: Option<String>,
    pub provider_message_id: Option<String>,
    pub provider_status: Option<ProviderStatusDto>,
    pub provider_status_updated_at: Option<String>,
    pub provider_error: Option<serde_json::Value>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Object)]
pub struct WebhookResponseDto {
    pub success: bool,
    pub applied: u32,
    pub stale: u32,
    pub unmatched: u32,
    pub failed: u32,
    pub inbound: u32,
    pub skipped: u32,
}
