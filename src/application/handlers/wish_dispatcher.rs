use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    application::services::{
        provider::MessagingProvider,
        sanitize::{format_phone_number, sanitize_parameter},
        template_selector::select_templates,
    },
    domain::{
        errors::DispatchError,
        models::{
            DeliveryOutcome, HeaderMedia, PlannedMessage, ProviderStatus, TemplateKind,
            TemplateMessage, Wish, WishStatus,
        },
        repositories::WishRepository,
    },
};

pub const DEFAULT_GREETING: &str = "Wishing you all the best!";

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    pub text: String,
    pub image: String,
    pub video: String,
    pub document: String,
    pub video_follow_up: String,
    pub document_follow_up: String,
    pub marketing: String,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            text: "wish_text".to_string(),
            image: "wish_text_image".to_string(),
            video: "wish_text_video".to_string(),
            document: "wish_text_doc".to_string(),
            video_follow_up: "wish_video_only".to_string(),
            document_follow_up: "wish_doc_only".to_string(),
            marketing: "whats_mark".to_string(),
        }
    }
}

impl TemplateCatalog {
    pub fn name_for(&self, kind: TemplateKind) -> &str {
        match kind {
            TemplateKind::TextPrimary => &self.text,
            TemplateKind::ImagePrimary => &self.image,
            TemplateKind::VideoPrimary => &self.video,
            TemplateKind::DocumentPrimary => &self.document,
            TemplateKind::VideoFollowUp => &self.video_follow_up,
            TemplateKind::DocumentFollowUp => &self.document_follow_up,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub templates: TemplateCatalog,
    /// Approved template locales; the first one is the fallback.
    pub locales: Vec<String>,
    pub message_delay: Duration,
    pub wish_delay: Duration,
    pub batch_limit: u32,
    pub stale_claim_timeout: Duration,
    pub brand_name: String,
    pub marketing_image_url: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            templates: TemplateCatalog::default(),
            locales: vec!["en".to_string()],
            message_delay: Duration::from_millis(500),
            wish_delay: Duration::from_millis(1000),
            batch_limit: 100,
            stale_claim_timeout: Duration::from_secs(15 * 60),
            brand_name: "WishBird".to_string(),
            marketing_image_url: None,
        }
    }
}

impl DispatchConfig {
    pub fn locale_for(&self, language: &str) -> String {
        let language = language.trim();
        self.locales
            .iter()
            .find(|locale| locale.eq_ignore_ascii_case(language))
            .or_else(|| self.locales.first())
            .cloned()
            .unwrap_or_else(|| "en".to_string())
    }
}

/// Sanitized greeting fields shared by every message of one wish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingContent {
    pub to: String,
    pub locale: String,
    pub recipient_name: String,
    pub sender_name: String,
    pub occasion: String,
    pub message: String,
}

impl GreetingContent {
    pub fn from_wish(wish: &Wish, config: &DispatchConfig) -> Self {
        let message = wish
            .message_text
            .as_deref()
            .map(sanitize_parameter)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| DEFAULT_GREETING.to_string());

        Self {
            to: format_phone_number(&wish.recipient_phone),
            locale: config.locale_for(&wish.language),
            recipient_name: sanitize_parameter(&wish.recipient_name),
            sender_name: sanitize_parameter(&wish.sender_name),
            occasion: sanitize_parameter(wish.occasion.label()),
            message,
        }
    }

    pub fn parameters_for(&self, template: TemplateKind) -> Vec<String> {
        if template.carries_full_body() {
            vec![
                self.recipient_name.clone(),
                self.sender_name.clone(),
                self.occasion.clone(),
                self.message.clone(),
            ]
        } else {
            vec![self.sender_name.clone()]
        }
    }
}

#[derive(Debug, Clone)]
pub struct WishDispatchReport {
    pub wish_id: Uuid,
    pub recipient_name: String,
    pub status: WishStatus,
    pub messages_planned: usize,
    pub messages_sent: usize,
    pub provider_message_id: Option<String>,
    pub errors: Option<Vec<String>>,
}

pub struct WishDispatchHandler {
    repo: Arc<dyn WishRepository>,
    provider: Arc<dyn MessagingProvider>,
    config: DispatchConfig,
}

impl WishDispatchHandler {
    pub fn new(
        repo: Arc<dyn WishRepository>,
        provider: Arc<dyn MessagingProvider>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            repo,
            provider,
            config,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Sends every planned message of a claimed wish and records the outcome.
    ///
    /// The claim is renewed before each message. Once another run has taken
    /// the wish over, nothing more is sent and `ClaimConflict` is returned.
    pub async fn handle(&self, wish: Wish) -> Result<WishDispatchReport, DispatchError> {
        let content = GreetingContent::from_wish(&wish, &self.config);
        let plan = select_templates(&wish.attachments);

        info!(
            wish_id = %wish.id,
            occasion = wish.occasion.as_str(),
            messages = plan.len(),
            "dispatching wish"
        );

        let mut claim = self.renew_claim(wish.id, wish.claimed_at).await?;
        let mut errors = Vec::new();
        let mut messages_sent = 0;
        let mut provider_message_id = None;

        for (index, planned) in plan.iter().enumerate() {
            if index > 0 {
                if !self.config.message_delay.is_zero() {
                    tokio::time::sleep(self.config.message_delay).await;
                }
                claim = self.renew_claim(wish.id, Some(claim)).await?;
            }

            match self.deliver(&content, planned).await {
                Ok(message_id) => {
                    info!(
                        wish_id = %wish.id,
                        template = planned.template.as_str(),
                        provider_message_id = %message_id,
                        "message sent"
                    );
                    messages_sent += 1;
                    if provider_message_id.is_none() {
                        self.record_correlation(wish.id, claim, &message_id).await?;
                        provider_message_id = Some(message_id);
                    }
                }
                Err(err) if err.is_fatal() => {
                    self.release_claim(wish.id, claim).await;
                    return Err(err);
                }
                Err(err) => {
                    warn!(
                        wish_id = %wish.id,
                        template = planned.template.as_str(),
                        error = %err,
                        "message failed"
                    );
                    errors.push(format!("{}: {err}", planned.template.as_str()));
                }
            }
        }

        let now = Utc::now();
        let delivered = messages_sent > 0;
        let outcome = DeliveryOutcome {
            status: if delivered {
                WishStatus::Sent
            } else {
                WishStatus::Failed
            },
            delivered_at: delivered.then_some(now),
            provider_message_id: provider_message_id.clone(),
            provider_status: if delivered {
                ProviderStatus::Sent
            } else {
                ProviderStatus::Failed
            },
            status_updated_at: now,
            errors: (!errors.is_empty()).then(|| errors.clone()),
        };
        if !self.repo.record_outcome(wish.id, claim, &outcome).await? {
            return Err(claim_lost(wish.id));
        }

        Ok(WishDispatchReport {
            wish_id: wish.id,
            recipient_name: wish.recipient_name,
            status: outcome.status,
            messages_planned: plan.len(),
            messages_sent,
            provider_message_id,
            errors: outcome.errors,
        })
    }

    /// Best effort: a failed release is logged and the wish waits for the
    /// stale-claim sweep.
    pub async fn release_claim(&self, wish_id: Uuid, claimed_at: DateTime<Utc>) {
        if let Err(err) = self.repo.release_claim(wish_id, claimed_at).await {
            error!(wish_id = %wish_id, error = %err, "failed to release claim");
        }
    }

    async fn renew_claim(
        &self,
        wish_id: Uuid,
        held: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, DispatchError> {
        let renewed = match held {
            Some(held) => self.repo.renew_claim(wish_id, held, Utc::now()).await?,
            None => None,
        };
        renewed.ok_or_else(|| claim_lost(wish_id))
    }

    async fn record_correlation(
        &self,
        wish_id: Uuid,
        claim: DateTime<Utc>,
        message_id: &str,
    ) -> Result<(), DispatchError> {
        match self
            .repo
            .record_correlation(wish_id, claim, message_id, Utc::now())
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => Err(claim_lost(wish_id)),
            Err(err) => {
                warn!(
                    wish_id = %wish_id,
                    provider_message_id = %message_id,
                    error = %err,
                    "failed to store provider message id early"
                );
                Ok(())
            }
        }
    }

    async fn deliver(
        &self,
        content: &GreetingContent,
        planned: &PlannedMessage,
    ) -> Result<String, DispatchError> {
        let header = match &planned.media {
            Some(media) => Some(HeaderMedia {
                kind: media.kind,
                handle: self.provider.upload_media(&media.url, media.kind).await?,
            }),
            None => None,
        };

        let message = TemplateMessage {
            to: content.to.clone(),
            template_name: self.config.templates.name_for(planned.template).to_string(),
            locale: content.locale.clone(),
            header,
            body_parameters: content.parameters_for(planned.template),
        };

        self.provider.send_template(&message).await
    }
}

fn claim_lost(wish_id: Uuid) -> DispatchError {
    warn!(wish_id = %wish_id, "claim taken over by another run, stopping");
    DispatchError::ClaimConflict(wish_id)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::{
        application::{
            testing::{FailingReleaseRepository, ScriptedProvider, no_delay_config, sample_wish},
            usecases::reconcile_status::{ReconcileReport, ReconcileStatusUseCase},
        },
        domain::{
            events::{ProviderEvent, StatusEvent},
            models::{Attachments, MediaKind},
            repositories::ClaimOutcome,
        },
        infrastructure::repositories::in_memory::InMemoryWishRepository,
    };

    /// Delivers a `delivered` callback for the first message while the video
    /// follow-up is still uploading.
    struct CallbackDuringUpload {
        inner: ScriptedProvider,
        reconcile: ReconcileStatusUseCase,
        delivered_at: chrono::DateTime<Utc>,
        report: Mutex<Option<ReconcileReport>>,
    }

    #[async_trait]
    impl MessagingProvider for CallbackDuringUpload {
        fn ensure_ready(&self) -> Result<(), DispatchError> {
            self.inner.ensure_ready()
        }

        async fn upload_media(&self, url: &str, kind: MediaKind) -> Result<String, DispatchError> {
            if kind == MediaKind::Video {
                let report = self
                    .reconcile
                    .execute(vec![ProviderEvent::Status(StatusEvent {
                        provider_message_id: "wamid.1".to_string(),
                        status: ProviderStatus::Delivered,
                        occurred_at: self.delivered_at,
                        recipient: None,
                        errors: None,
                    })])
                    .await;
                *self.report.lock().unwrap() = Some(report);
            }
            self.inner.upload_media(url, kind).await
        }

        async fn send_template(&self, message: &TemplateMessage) -> Result<String, DispatchError> {
            self.inner.send_template(message).await
        }
    }

    async fn claimed(repo: &InMemoryWishRepository, attachments: Attachments) -> Wish {
        let mut new = sample_wish();
        new.attachments = attachments;
        let wish = repo.insert(new).await.unwrap();
        match repo.claim_by_id(wish.id, Utc::now()).await.unwrap() {
            ClaimOutcome::Claimed(wish) => wish,
            other => panic!("expected claim, got {other:?}"),
        }
    }

    #[test]
    fn greeting_content_is_sanitized_and_defaulted() {
        let mut new = sample_wish();
        new.recipient_name = "Asha\nRao".to_string();
        new.message_text = Some(" \n ".to_string());
        new.recipient_phone = "+91 98765 43210".to_string();
        new.language = "hi".to_string();
        let wish = Wish::from_new(new, Utc::now());

        let content = GreetingContent::from_wish(&wish, &no_delay_config());
        assert_eq!(content.recipient_name, "Asha Rao");
        assert_eq!(content.message, DEFAULT_GREETING);
        assert_eq!(content.to, "919876543210");
        assert_eq!(content.locale, "en");
        assert_eq!(content.occasion, "Birthday");
    }

    #[test]
    fn follow_up_parameters_carry_only_the_sender() {
        let wish = Wish::from_new(sample_wish(), Utc::now());
        let content = GreetingContent::from_wish(&wish, &no_delay_config());
        assert_eq!(content.parameters_for(TemplateKind::TextPrimary).len(), 4);
        assert_eq!(
            content.parameters_for(TemplateKind::DocumentFollowUp),
            vec!["Ravi".to_string()]
        );
    }

    #[test]
    fn locale_falls_back_to_first_configured() {
        let config = DispatchConfig {
            locales: vec!["en".to_string(), "hi".to_string()],
            ..DispatchConfig::default()
        };
        assert_eq!(config.locale_for("HI"), "hi");
        assert_eq!(config.locale_for("fr"), "en");
    }

    #[tokio::test]
    async fn sends_messages_in_plan_order() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let handler = WishDispatchHandler::new(repo.clone(), provider.clone(), no_delay_config());
        let wish = claimed(
            &repo,
            Attachments {
                image_url: Some("https://store.example.com/card.jpg".into()),
                video_url: Some("https://store.example.com/clip.mp4".into()),
                document_url: Some("https://store.example.com/poem.pdf".into()),
            },
        )
        .await;

        let report = handler.handle(wish.clone()).await.unwrap();

        let sent = provider.sent();
        let names: Vec<_> = sent.iter().map(|m| m.template_name.as_str()).collect();
        assert_eq!(names, ["wish_text_image", "wish_video_only", "wish_doc_only"]);
        assert_eq!(sent[0].body_parameters.len(), 4);
        assert_eq!(sent[1].header.as_ref().map(|h| h.kind), Some(MediaKind::Video));
        assert_eq!(report.messages_sent, 3);
        assert_eq!(report.provider_message_id.as_deref(), Some("wamid.1"));

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Sent);
        assert_eq!(stored.provider_message_id.as_deref(), Some("wamid.1"));
        assert_eq!(stored.provider_status, Some(ProviderStatus::Sent));
        assert!(stored.delivered_at.is_some());
        assert!(stored.provider_error.is_none());
    }

    #[tokio::test]
    async fn one_failed_upload_still_marks_wish_sent() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new().failing_upload(MediaKind::Video));
        let handler = WishDispatchHandler::new(repo.clone(), provider.clone(), no_delay_config());
        let wish = claimed(
            &repo,
            Attachments {
                image_url: Some("https://store.example.com/card.jpg".into()),
                video_url: Some("https://store.example.com/clip.mp4".into()),
                document_url: None,
            },
        )
        .await;

        let report = handler.handle(wish.clone()).await.unwrap();
        assert_eq!(report.status, WishStatus::Sent);

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Sent);
        assert_eq!(stored.provider_message_id.as_deref(), Some("wamid.1"));
        let errors = stored.provider_error.unwrap()["errors"].clone();
        let errors = errors.as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().unwrap().starts_with("video_follow_up:"));
    }

    #[tokio::test]
    async fn every_message_failing_marks_wish_failed() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(
            ScriptedProvider::new()
                .failing_upload(MediaKind::Image)
                .failing_template("wish_doc_only"),
        );
        let handler = WishDispatchHandler::new(repo.clone(), provider.clone(), no_delay_config());
        let wish = claimed(
            &repo,
            Attachments {
                image_url: Some("https://store.example.com/card.jpg".into()),
                video_url: None,
                document_url: Some("https://store.example.com/poem.pdf".into()),
            },
        )
        .await;

        let report = handler.handle(wish.clone()).await.unwrap();
        assert_eq!(report.status, WishStatus::Failed);
        assert_eq!(report.errors.as_ref().map(Vec::len), Some(2));

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Failed);
        assert!(stored.provider_message_id.is_none());
        assert!(stored.delivered_at.is_none());
        assert_eq!(stored.provider_status, Some(ProviderStatus::Failed));
    }

    #[tokio::test]
    async fn configuration_error_releases_the_claim() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new().misconfigured_sends());
        let handler = WishDispatchHandler::new(repo.clone(), provider, no_delay_config());
        let wish = claimed(&repo, Attachments::default()).await;

        let err = handler.handle(wish.clone()).await.unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Scheduled);
        assert!(stored.claimed_at.is_none());
        assert!(
            repo.claim_due(Utc::now() + ChronoDuration::seconds(1), 10)
                .await
                .unwrap()
                .iter()
                .any(|w| w.id == wish.id)
        );
    }

    #[tokio::test]
    async fn callback_for_first_message_during_follow_up_is_kept() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let delivered_at = Utc::now();
        let provider = Arc::new(CallbackDuringUpload {
            inner: ScriptedProvider::new(),
            reconcile: ReconcileStatusUseCase::new(repo.clone()),
            delivered_at,
            report: Mutex::new(None),
        });
        let handler = WishDispatchHandler::new(repo.clone(), provider.clone(), no_delay_config());
        let wish = claimed(
            &repo,
            Attachments {
                image_url: Some("https://store.example.com/card.jpg".into()),
                video_url: Some("https://store.example.com/clip.mp4".into()),
                document_url: None,
            },
        )
        .await;

        let report = handler.handle(wish.clone()).await.unwrap();
        assert_eq!(report.messages_sent, 2);

        let during = provider.report.lock().unwrap().clone().unwrap();
        assert_eq!(during.applied, 1);
        assert_eq!(during.unmatched, 0);

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Sent);
        assert_eq!(stored.provider_message_id.as_deref(), Some("wamid.1"));
        assert_eq!(stored.provider_status, Some(ProviderStatus::Delivered));
        assert_eq!(stored.provider_status_updated_at, Some(delivered_at));
    }

    #[tokio::test]
    async fn stops_when_another_run_took_the_wish_over() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let handler = WishDispatchHandler::new(repo.clone(), provider.clone(), no_delay_config());
        let stale = claimed(&repo, Attachments::default()).await;

        repo.reclaim_stale(Utc::now() + ChronoDuration::seconds(1))
            .await
            .unwrap();
        let takeover = Utc::now() + ChronoDuration::seconds(5);
        repo.claim_by_id(stale.id, takeover).await.unwrap();

        let err = handler.handle(stale.clone()).await.unwrap_err();
        assert!(matches!(err, DispatchError::ClaimConflict(id) if id == stale.id));
        assert!(provider.sent().is_empty());

        let stored = repo.get(stale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, WishStatus::Sending);
        assert_eq!(stored.claimed_at, Some(takeover));
    }

    #[tokio::test]
    async fn failed_release_keeps_the_configuration_error() {
        let repo = Arc::new(FailingReleaseRepository::new());
        let provider = Arc::new(ScriptedProvider::new().misconfigured_sends());
        let handler = WishDispatchHandler::new(repo.clone(), provider, no_delay_config());
        let wish = repo.insert(sample_wish()).await.unwrap();
        let ClaimOutcome::Claimed(wish) = repo.claim_by_id(wish.id, Utc::now()).await.unwrap()
        else {
            panic!("fresh wish was not claimable");
        };

        let err = handler.handle(wish).await.unwrap_err();

        assert!(matches!(err, DispatchError::Configuration(_)));
        assert_eq!(repo.release_attempts(), 1);
    }
}
