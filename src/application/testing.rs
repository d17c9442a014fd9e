use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::{
    application::{handlers::wish_dispatcher::DispatchConfig, services::provider::MessagingProvider},
    domain::{
        errors::DispatchError,
        events::StatusEvent,
        models::{
            Attachments, DeliveryOutcome, MediaKind, NewWish, Occasion, ProviderStatus,
            TemplateMessage, Wish, WishStatus,
        },
        repositories::{ClaimOutcome, StatusApplyOutcome, WishRepository},
    },
    infrastructure::repositories::in_memory::InMemoryWishRepository,
};

pub fn sample_wish() -> NewWish {
    NewWish {
        sender_name: "Ravi".to_string(),
        recipient_name: "Asha".to_string(),
        recipient_phone: "+91 98765 43210".to_string(),
        occasion: Occasion::Birthday,
        message_text: Some("Have a wonderful year ahead".to_string()),
        language: "en".to_string(),
        attachments: Attachments::default(),
        scheduled_at: Utc::now() - ChronoDuration::minutes(1),
    }
}

/// Inserts a wish and records it as sent under `message_id`, going through a claim.
pub async fn sent_wish(repo: &dyn WishRepository, message_id: &str) -> Wish {
    let wish = repo.insert(sample_wish()).await.unwrap();
    let ClaimOutcome::Claimed(claimed) = repo.claim_by_id(wish.id, Utc::now()).await.unwrap()
    else {
        panic!("fresh wish {} was not claimable", wish.id);
    };
    let now = Utc::now();
    let recorded = repo
        .record_outcome(
            claimed.id,
            claimed.claimed_at.unwrap(),
            &DeliveryOutcome {
                status: WishStatus::Sent,
                delivered_at: Some(now),
                provider_message_id: Some(message_id.to_string()),
                provider_status: ProviderStatus::Sent,
                status_updated_at: now,
                errors: None,
            },
        )
        .await
        .unwrap();
    assert!(recorded);
    claimed
}

pub fn no_delay_config() -> DispatchConfig {
    DispatchConfig {
        message_delay: Duration::ZERO,
        wish_delay: Duration::ZERO,
        ..DispatchConfig::default()
    }
}

/// Provider double that records sends and fails on request.
#[derive(Default)]
pub struct ScriptedProvider {
    not_ready: bool,
    misconfigured_sends: bool,
    failing_uploads: HashSet<MediaKind>,
    failing_templates: HashSet<String>,
    next_id: AtomicUsize,
    uploads: Mutex<Vec<(String, MediaKind)>>,
    sent: Mutex<Vec<TemplateMessage>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn not_ready(mut self) -> Self {
        self.not_ready = true;
        self
    }

    pub fn misconfigured_sends(mut self) -> Self {
        self.misconfigured_sends = true;
        self
    }

    pub fn failing_upload(mut self, kind: MediaKind) -> Self {
        self.failing_uploads.insert(kind);
        self
    }

    pub fn failing_template(mut self, name: &str) -> Self {
        self.failing_templates.insert(name.to_string());
        self
    }

    pub fn sent(&self) -> Vec<TemplateMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<(String, MediaKind)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessagingProvider for ScriptedProvider {
    fn ensure_ready(&self) -> Result<(), DispatchError> {
        if self.not_ready {
            return Err(DispatchError::Configuration(
                "WHATSAPP_ACCESS_TOKEN is not set".to_string(),
            ));
        }
        Ok(())
    }

    async fn upload_media(&self, url: &str, kind: MediaKind) -> Result<String, DispatchError> {
        if self.failing_uploads.contains(&kind) {
            return Err(DispatchError::MediaUpload {
                status: Some(400),
                body: json!({"error": {"message": format!("{} rejected", kind.as_str())}}),
            });
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((url.to_string(), kind));
        Ok(format!("media.{}", uploads.len()))
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<String, DispatchError> {
        if self.misconfigured_sends {
            return Err(DispatchError::Configuration(
                "WHATSAPP_PHONE_NUMBER_ID is not set".to_string(),
            ));
        }
        if self.failing_templates.contains(&message.template_name) {
            return Err(DispatchError::Dispatch {
                status: Some(400),
                body: json!({"error": {"message": "template rejected"}}),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("wamid.{id}"))
    }
}

/// In-memory repository whose `release_claim` always fails.
#[derive(Default)]
pub struct FailingReleaseRepository {
    inner: InMemoryWishRepository,
    release_attempts: AtomicUsize,
}

impl FailingReleaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn release_attempts(&self) -> usize {
        self.release_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WishRepository for FailingReleaseRepository {
    async fn insert(&self, wish: NewWish) -> anyhow::Result<Wish> {
        self.inner.insert(wish).await
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Wish>> {
        self.inner.get(id).await
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> anyhow::Result<Vec<Wish>> {
        self.inner.claim_due(now, limit).await
    }

    async fn claim_by_id(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<ClaimOutcome> {
        self.inner.claim_by_id(id, now).await
    }

    async fn renew_claim(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        self.inner.renew_claim(id, claimed_at, now).await
    }

    async fn release_claim(&self, id: Uuid, _claimed_at: DateTime<Utc>) -> anyhow::Result<()> {
        self.release_attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("connection reset while releasing {id}")
    }

    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> anyhow::Result<Vec<Uuid>> {
        self.inner.reclaim_stale(claimed_before).await
    }

    async fn record_correlation(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        provider_message_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        self.inner
            .record_correlation(id, claimed_at, provider_message_id, at)
            .await
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        outcome: &DeliveryOutcome,
    ) -> anyhow::Result<bool> {
        self.inner.record_outcome(id, claimed_at, outcome).await
    }

    async fn apply_provider_status(
        &self,
        event: &StatusEvent,
    ) -> anyhow::Result<StatusApplyOutcome> {
        self.inner.apply_provider_status(event).await
    }
}
