use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    events::StatusEvent,
    models::{DeliveryOutcome, NewWish, ProviderStatus, Wish, WishStatus},
    repositories::{ClaimOutcome, StatusApplyOutcome, WishRepository, supersedes},
};

/// Keeps wishes in process memory. Every claim runs under one write lock, which
/// gives the same compare-and-swap guarantee as the conditional SQL update.
#[derive(Default)]
pub struct InMemoryWishRepository {
    wishes: Arc<RwLock<HashMap<Uuid, Wish>>>,
}

impl InMemoryWishRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WishRepository for InMemoryWishRepository {
    async fn insert(&self, wish: NewWish) -> anyhow::Result<Wish> {
        let wish = Wish::from_new(wish, Utc::now());
        let mut wishes = self.wishes.write().await;
        wishes.insert(wish.id, wish.clone());
        Ok(wish)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Wish>> {
        let wishes = self.wishes.read().await;
        Ok(wishes.get(&id).cloned())
    }

    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> anyhow::Result<Vec<Wish>> {
        let mut wishes = self.wishes.write().await;

        let mut due: Vec<_> = wishes
            .values()
            .filter(|w| w.status == WishStatus::Scheduled && w.scheduled_at <= now)
            .map(|w| (w.scheduled_at, w.id))
            .collect();
        due.sort();
        due.truncate(limit as usize);

        let mut claimed = Vec::with_capacity(due.len());
        for (_, id) in due {
            if let Some(wish) = wishes.get_mut(&id) {
                wish.status = WishStatus::Sending;
                wish.claimed_at = Some(now);
                wish.updated_at = now;
                claimed.push(wish.clone());
            }
        }
        Ok(claimed)
    }

    async fn claim_by_id(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<ClaimOutcome> {
        let mut wishes = self.wishes.write().await;
        let Some(wish) = wishes.get_mut(&id) else {
            return Ok(ClaimOutcome::NotFound);
        };
        if wish.status != WishStatus::Scheduled {
            return Ok(ClaimOutcome::Conflict);
        }
        wish.status = WishStatus::Sending;
        wish.claimed_at = Some(now);
        wish.updated_at = now;
        Ok(ClaimOutcome::Claimed(wish.clone()))
    }

    async fn renew_claim(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>> {
        let mut wishes = self.wishes.write().await;
        let Some(wish) = wishes.get_mut(&id).filter(|w| holds(w, claimed_at)) else {
            return Ok(None);
        };
        wish.claimed_at = Some(now);
        wish.updated_at = now;
        Ok(Some(now))
    }

    async fn release_claim(&self, id: Uuid, claimed_at: DateTime<Utc>) -> anyhow::Result<()> {
        let mut wishes = self.wishes.write().await;
        if let Some(wish) = wishes.get_mut(&id).filter(|w| holds(w, claimed_at)) {
            wish.status = WishStatus::Scheduled;
            wish.claimed_at = None;
            wish.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> anyhow::Result<Vec<Uuid>> {
        let mut wishes = self.wishes.write().await;
        let now = Utc::now();
        let mut reclaimed = Vec::new();
        for wish in wishes.values_mut() {
            let stale = wish.status == WishStatus::Sending
                && wish.claimed_at.is_none_or(|claimed_at| claimed_at < claimed_before);
            if stale {
                wish.status = WishStatus::Scheduled;
                wish.claimed_at = None;
                wish.updated_at = now;
                reclaimed.push(wish.id);
            }
        }
        Ok(reclaimed)
    }

    async fn record_correlation(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        provider_message_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let mut wishes = self.wishes.write().await;
        let Some(wish) = wishes.get_mut(&id).filter(|w| holds(w, claimed_at)) else {
            return Ok(false);
        };
        if wish.provider_message_id.is_none() {
            wish.provider_message_id = Some(provider_message_id.to_string());
            wish.provider_status = Some(ProviderStatus::Sent);
            wish.provider_status_updated_at = Some(at);
            wish.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        outcome: &DeliveryOutcome,
    ) -> anyhow::Result<bool> {
        let mut wishes = self.wishes.write().await;
        let wish = wishes
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("wish {id} not found"))?;
        if !holds(wish, claimed_at) {
            return Ok(false);
        }

        wish.status = outcome.status;
        wish.delivered_at = outcome.delivered_at;
        wish.provider_message_id = outcome.provider_message_id.clone();
        if wish.provider_event_at.is_none() {
            wish.provider_status = Some(outcome.provider_status);
            wish.provider_status_updated_at = Some(outcome.status_updated_at);
            wish.provider_error = outcome.error_payload();
        } else if let Some(errors) = outcome.error_payload() {
            wish.provider_error = Some(errors);
        }
        wish.updated_at = Utc::now();
        Ok(true)
    }

    async fn apply_provider_status(
        &self,
        event: &StatusEvent,
    ) -> anyhow::Result<StatusApplyOutcome> {
        let mut wishes = self.wishes.write().await;
        let Some(wish) = wishes
            .values_mut()
            .find(|w| w.provider_message_id.as_deref() == Some(event.provider_message_id.as_str()))
        else {
            return Ok(StatusApplyOutcome::Unmatched);
        };

        let applied_rank = wish
            .provider_event_at
            .and(wish.provider_status)
            .map(|status| status.rank());
        if !supersedes(
            event.occurred_at,
            event.status.rank(),
            wish.provider_event_at,
            applied_rank,
        ) {
            return Ok(StatusApplyOutcome::Stale);
        }

        wish.provider_status = Some(event.status);
        wish.provider_status_updated_at = Some(event.occurred_at);
        wish.provider_event_at = Some(event.occurred_at);
        wish.provider_error = event.errors.clone();
        wish.updated_at = Utc::now();
        Ok(StatusApplyOutcome::Applied)
    }
}

fn holds(wish: &Wish, claimed_at: DateTime<Utc>) -> bool {
    wish.status == WishStatus::Sending && wish.claimed_at == Some(claimed_at)
}
