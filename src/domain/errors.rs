use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("wish {0} was already claimed or processed")]
    ClaimConflict(Uuid),
    #[error("wish {0} not found")]
    NotFound(Uuid),
    #[error("failed to fetch media from storage{}: {reason}", describe_status(.status))]
    MediaFetch { status: Option<u16>, reason: String },
    #[error("media upload failed{}: {}", describe_status(.status), provider_error_message(.body))]
    MediaUpload {
        status: Option<u16>,
        body: serde_json::Value,
    },
    #[error("whatsapp api error{}: {}", describe_status(.status), provider_error_message(.body))]
    Dispatch {
        status: Option<u16>,
        body: serde_json::Value,
    },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DispatchError {
    /// Errors that make every further send in the invocation pointless.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DispatchError::Configuration(_))
    }
}

/// Extracts `error.message` from a provider error body, falling back to compact JSON.
pub fn provider_error_message(body: &serde_json::Value) -> String {
    body.get("error")
        .and_then(|error| error.get("message"))
        .and_then(|message| message.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

fn describe_status(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" (status {status})"))
        .unwrap_or_default()
}
