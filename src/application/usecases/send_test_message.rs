use std::sync::Arc;

use tracing::info;

use crate::{
    application::{
        handlers::wish_dispatcher::{DEFAULT_GREETING, DispatchConfig},
        services::{
            provider::MessagingProvider,
            sanitize::{format_phone_number, sanitize_parameter},
        },
    },
    domain::{
        errors::DispatchError,
        models::{TemplateKind, TemplateMessage},
    },
};

const TEST_RECIPIENT: &str = "Friend";
const TEST_OCCASION: &str = "Test";

pub struct SendTestMessageRequest {
    pub phone: String,
    pub message: Option<String>,
}

/// Sends the text greeting template to an arbitrary number, bypassing storage.
pub struct SendTestMessageUseCase {
    provider: Arc<dyn MessagingProvider>,
    config: DispatchConfig,
}

impl SendTestMessageUseCase {
    pub fn new(provider: Arc<dyn MessagingProvider>, config: DispatchConfig) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, request: SendTestMessageRequest) -> Result<String, DispatchError> {
        let to = format_phone_number(&request.phone);
        if to.is_empty() {
            return Err(DispatchError::Validation("phone is required".to_string()));
        }
        self.provider.ensure_ready()?;

        let message = request
            .message
            .as_deref()
            .map(sanitize_parameter)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        let template = TemplateMessage {
            to,
            template_name: self
                .config
                .templates
                .name_for(TemplateKind::TextPrimary)
                .to_string(),
            locale: self.config.locale_for(""),
            header: None,
            body_parameters: vec![
                TEST_RECIPIENT.to_string(),
                sanitize_parameter(&self.config.brand_name),
                TEST_OCCASION.to_string(),
                message,
            ],
        };

        let message_id = self.provider.send_template(&template).await?;
        info!(provider_message_id = %message_id, "test message sent");
        Ok(message_id)
    }
}
