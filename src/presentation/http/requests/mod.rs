use chrono::{DateTime, Utc};
use poem_openapi::Object;
use uuid::Uuid;

#[derive(Object, Debug, Default)]
pub struct DispatchRequestDto {
    /// Send only this wish instead of every due one.
    pub wish_id: Option<Uuid>,
}

#[derive(Object, Debug)]
pub struct ScheduleWishRequestDto {
    #[oai(validator(min_length = 1, max_length = 100))]
    pub sender_name: String,
    #[oai(validator(min_length = 1, max_length = 100))]
    pub recipient_name: String,
    #[oai(validator(min_length = 1, max_length = 32))]
    pub recipient_phone: String,
    /// Stored form (`get_well_soon`) or label (`Get Well Soon`).
    pub occasion: String,
    pub message_text: Option<String>,
    pub language: Option<String>,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub document_url: Option<String>,
    /// Defaults to now.
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Object, Debug)]
pub struct TestMessageRequestDto {
    #[oai(validator(min_length = 1))]
    pub phone: String,
    pub message: Option<String>,
}

#[derive(Object, Debug)]
pub struct BroadcastRequestDto {
    pub phones: Vec<String>,
    pub media_id: Option<String>,
    #[oai(validator(maximum(value = "60000")))]
    pub delay_ms: Option<u64>,
}
