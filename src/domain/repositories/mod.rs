use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    events::StatusEvent,
    models::{DeliveryOutcome, NewWish, Wish},
};

/// Result of claiming a single wish by id.
#[derive(Debug)]
pub enum ClaimOutcome {
    Claimed(Wish),
    /// The wish exists but was not `scheduled`, so another run owns it or it is done.
    Conflict,
    NotFound,
}

/// Result of applying one provider status callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusApplyOutcome {
    Applied,
    /// A newer callback for the same message was already applied.
    Stale,
    /// No wish carries this provider message id.
    Unmatched,
}

#[async_trait]
pub trait WishRepository: Send + Sync {
    async fn insert(&self, wish: NewWish) -> anyhow::Result<Wish>;

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Wish>>;

    /// Atomically moves every due `scheduled` wish to `sending` and returns
    /// only the rows this call transitioned.
    async fn claim_due(&self, now: DateTime<Utc>, limit: u32) -> anyhow::Result<Vec<Wish>>;

    async fn claim_by_id(&self, id: Uuid, now: DateTime<Utc>) -> anyhow::Result<ClaimOutcome>;

    /// Re-stamps a claim still held under `claimed_at` and returns the new
    /// stamp, or `None` once the wish was reclaimed or finished elsewhere.
    async fn renew_claim(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<DateTime<Utc>>>;

    /// Returns a claim held under `claimed_at` to `scheduled` without recording
    /// an outcome. A claim taken over by another run is left alone.
    async fn release_claim(&self, id: Uuid, claimed_at: DateTime<Utc>) -> anyhow::Result<()>;

    /// Returns `sending` wishes claimed before `claimed_before` to `scheduled`.
    async fn reclaim_stale(&self, claimed_before: DateTime<Utc>) -> anyhow::Result<Vec<Uuid>>;

    /// Stores the first provider message id while the wish is still being
    /// sent, so early status callbacks find it. `false` when the claim is lost.
    async fn record_correlation(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        provider_message_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    /// Writes the terminal fields of a wish still claimed under `claimed_at`.
    /// A provider status already applied by a callback is kept. `false` when
    /// the claim is lost.
    async fn record_outcome(
        &self,
        id: Uuid,
        claimed_at: DateTime<Utc>,
        outcome: &DeliveryOutcome,
    ) -> anyhow::Result<bool>;

    async fn apply_provider_status(&self, event: &StatusEvent)
    -> anyhow::Result<StatusApplyOutcome>;
}

/// Ordering rule shared by every repository: a callback wins when it is newer
/// than the last applied one, or equally old with a rank at least as high.
pub fn supersedes(
    incoming_at: DateTime<Utc>,
    incoming_rank: i32,
    applied_at: Option<DateTime<Utc>>,
    applied_rank: Option<i32>,
) -> bool {
    match applied_at {
        None => true,
        Some(applied_at) if incoming_at > applied_at => true,
        Some(applied_at) if incoming_at == applied_at => {
            incoming_rank >= applied_rank.unwrap_or_default()
        }
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn newer_callbacks_supersede_older_ones() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        assert!(supersedes(t, 1, None, None));
        assert!(supersedes(t + Duration::seconds(1), 2, Some(t), Some(3)));
        assert!(!supersedes(t - Duration::seconds(1), 3, Some(t), Some(2)));
    }

    #[test]
    fn equal_timestamps_fall_back_to_rank() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        assert!(supersedes(t, 2, Some(t), Some(1)));
        assert!(supersedes(t, 2, Some(t), Some(2)));
        assert!(!supersedes(t, 1, Some(t), Some(3)));
    }
}
