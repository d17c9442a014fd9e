use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::{
    application::{
        handlers::wish_dispatcher::DispatchConfig,
        services::{provider::MessagingProvider, sanitize::format_phone_number},
    },
    domain::{
        errors::DispatchError,
        models::{HeaderMedia, MediaKind, TemplateMessage},
    },
};

pub const DEFAULT_BROADCAST_DELAY: Duration = Duration::from_millis(2000);

pub struct BroadcastRequest {
    pub phones: Vec<String>,
    /// Previously uploaded header image; uploaded from the configured URL when absent.
    pub media_id: Option<String>,
    pub delay: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct BroadcastResult {
    pub phone: String,
    pub provider_message_id: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BroadcastReport {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<BroadcastResult>,
}

/// Sends the marketing template, one image header and no body text, to a
/// list of numbers. The image is uploaded at most once per broadcast.
pub struct BroadcastMarketingUseCase {
    provider: Arc<dyn MessagingProvider>,
    config: DispatchConfig,
}

impl BroadcastMarketingUseCase {
    pub fn new(provider: Arc<dyn MessagingProvider>, config: DispatchConfig) -> Self {
        Self { provider, config }
    }

    pub async fn execute(&self, request: BroadcastRequest) -> Result<BroadcastReport, DispatchError> {
        if request.phones.is_empty() {
            return Err(DispatchError::Validation(
                "phones array is required".to_string(),
            ));
        }
        self.provider.ensure_ready()?;

        let handle = self.media_handle(request.media_id).await?;
        let delay = request.delay.unwrap_or(DEFAULT_BROADCAST_DELAY);
        let template_name = self.config.templates.marketing.clone();
        let locale = self.config.locale_for("");

        let mut results = Vec::with_capacity(request.phones.len());
        for (index, phone) in request.phones.iter().enumerate() {
            if index > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let message = TemplateMessage {
                to: format_phone_number(phone),
                template_name: template_name.clone(),
                locale: locale.clone(),
                header: Some(HeaderMedia {
                    kind: MediaKind::Image,
                    handle: handle.clone(),
                }),
                body_parameters: Vec::new(),
            };

            let result = match self.provider.send_template(&message).await {
                Ok(id) => BroadcastResult {
                    phone: phone.clone(),
                    provider_message_id: Some(id),
                    error: None,
                },
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(phone = %phone, error = %err, "marketing send failed");
                    BroadcastResult {
                        phone: phone.clone(),
                        provider_message_id: None,
                        error: Some(err.to_string()),
                    }
                }
            };
            results.push(result);
        }

        let successful = results
            .iter()
            .filter(|result| result.provider_message_id.is_some())
            .count();
        info!(
            total = results.len(),
            successful,
            "marketing broadcast finished"
        );

        Ok(BroadcastReport {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        })
    }

    async fn media_handle(&self, media_id: Option<String>) -> Result<String, DispatchError> {
        if let Some(id) = media_id.filter(|id| !id.trim().is_empty()) {
            return Ok(id);
        }
        let url = self
            .config
            .marketing_image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                DispatchError::Validation(
                    "media_id is required when MARKETING_IMAGE_URL is not configured".to_string(),
                )
            })?;
        self.provider.upload_media(url, MediaKind::Image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{ScriptedProvider, no_delay_config};

    fn config_with_image() -> DispatchConfig {
        DispatchConfig {
            marketing_image_url: Some("https://store.example.com/promo.jpg".to_string()),
            ..no_delay_config()
        }
    }

    #[tokio::test]
    async fn uploads_once_and_sends_to_every_phone() {
        let provider = Arc::new(ScriptedProvider::new());
        let usecase = BroadcastMarketingUseCase::new(provider.clone(), config_with_image());

        let report = usecase
            .execute(BroadcastRequest {
                phones: vec!["+91 98765 43210".to_string(), "15550102000".to_string()],
                media_id: None,
                delay: Some(Duration::ZERO),
            })
            .await
            .unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 2);
        assert_eq!(provider.uploads().len(), 1);
        let sent = provider.sent();
        assert!(sent.iter().all(|m| m.template_name == "whats_mark"));
        assert!(sent.iter().all(|m| m.body_parameters.is_empty()));
        assert!(
            sent.iter()
                .all(|m| m.header.as_ref().map(|h| h.handle.as_str()) == Some("media.1"))
        );
        assert_eq!(sent[0].to, "919876543210");
    }

    #[tokio::test]
    async fn supplied_media_id_skips_upload() {
        let provider = Arc::new(ScriptedProvider::new());
        let usecase = BroadcastMarketingUseCase::new(provider.clone(), no_delay_config());

        usecase
            .execute(BroadcastRequest {
                phones: vec!["15550102000".to_string()],
                media_id: Some("media-42".to_string()),
                delay: None,
            })
            .await
            .unwrap();

        assert!(provider.uploads().is_empty());
        assert_eq!(
            provider.sent()[0].header.as_ref().map(|h| h.handle.clone()),
            Some("media-42".to_string())
        );
    }

    #[tokio::test]
    async fn empty_phone_list_is_rejected() {
        let provider = Arc::new(ScriptedProvider::new());
        let usecase = BroadcastMarketingUseCase::new(provider, config_with_image());

        let err = usecase
            .execute(BroadcastRequest {
                phones: Vec::new(),
                media_id: None,
                delay: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::Validation(_)));
    }

    #[tokio::test]
    async fn per_phone_failures_are_reported() {
        let provider = Arc::new(ScriptedProvider::new().failing_template("whats_mark"));
        let usecase = BroadcastMarketingUseCase::new(provider, config_with_image());

        let report = usecase
            .execute(BroadcastRequest {
                phones: vec!["15550102000".to_string()],
                media_id: None,
                delay: None,
            })
            .await
            .unwrap();

        assert_eq!(report.failed, 1);
        assert!(report.results[0].error.is_some());
    }
}
