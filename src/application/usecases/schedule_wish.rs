use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    application::services::sanitize::format_phone_number,
    domain::{
        errors::DispatchError,
        models::{Attachments, NewWish, Occasion, Wish},
        repositories::WishRepository,
    },
};

const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 15;
const MAX_MESSAGE_CHARS: usize = 1024;

pub struct ScheduleWishRequest {
    pub sender_name: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub occasion: String,
    pub message_text: Option<String>,
    pub language: Option<String>,
    pub attachments: Attachments,
    pub scheduled_at: Option<DateTime<Utc>>,
}

pub struct ScheduleWishUseCase {
    repo: Arc<dyn WishRepository>,
}

impl ScheduleWishUseCase {
    pub fn new(repo: Arc<dyn WishRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, request: ScheduleWishRequest) -> Result<Wish, DispatchError> {
        let new = Self::validate(request)?;
        let wish = self.repo.insert(new).await?;
        info!(
            wish_id = %wish.id,
            scheduled_at = %wish.scheduled_at,
            "wish scheduled"
        );
        Ok(wish)
    }

    fn validate(request: ScheduleWishRequest) -> Result<NewWish, DispatchError> {
        let sender_name = required(&request.sender_name, "sender_name")?;
        let recipient_name = required(&request.recipient_name, "recipient_name")?;

        let digits = format_phone_number(&request.recipient_phone).len();
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
            return Err(DispatchError::Validation(format!(
                "recipient_phone must contain {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"
            )));
        }

        let occasion = Occasion::from_str(&request.occasion).ok_or_else(|| {
            DispatchError::Validation(format!("unknown occasion '{}'", request.occasion))
        })?;

        if let Some(text) = &request.message_text {
            if text.chars().count() > MAX_MESSAGE_CHARS {
                return Err(DispatchError::Validation(format!(
                    "message_text exceeds {MAX_MESSAGE_CHARS} characters"
                )));
            }
        }

        let attachments = Attachments {
            image_url: attachment(request.attachments.image_url, "image_url")?,
            video_url: attachment(request.attachments.video_url, "video_url")?,
            document_url: attachment(request.attachments.document_url, "document_url")?,
        };

        Ok(NewWish {
            sender_name,
            recipient_name,
            recipient_phone: request.recipient_phone.trim().to_string(),
            occasion,
            message_text: request.message_text,
            language: request
                .language
                .map(|language| language.trim().to_string())
                .filter(|language| !language.is_empty())
                .unwrap_or_else(|| "en".to_string()),
            attachments,
            scheduled_at: request.scheduled_at.unwrap_or_else(Utc::now),
        })
    }
}

fn required(value: &str, field: &str) -> Result<String, DispatchError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DispatchError::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn attachment(url: Option<String>, field: &str) -> Result<Option<String>, DispatchError> {
    let Some(url) = url.map(|url| url.trim().to_string()).filter(|url| !url.is_empty()) else {
        return Ok(None);
    };
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(DispatchError::Validation(format!(
            "{field} must be an http(s) url"
        )));
    }
    Ok(Some(url))
}
