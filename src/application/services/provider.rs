use async_trait::async_trait;

use crate::domain::{
    errors::DispatchError,
    models::{MediaKind, TemplateMessage},
};

/// Outbound side of the business messaging provider.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    /// Fails with `DispatchError::Configuration` when credentials are missing.
    fn ensure_ready(&self) -> Result<(), DispatchError>;

    /// Fetches the attachment from storage and re-uploads it, returning the
    /// provider media handle. A handle is never shared between wishes.
    async fn upload_media(&self, url: &str, kind: MediaKind) -> Result<String, DispatchError>;

    /// Sends one template message and returns the provider message id.
    async fn send_template(&self, message: &TemplateMessage) -> Result<String, DispatchError>;
}
