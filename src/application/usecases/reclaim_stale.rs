use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::domain::{errors::DispatchError, repositories::WishRepository};

/// Returns wishes stuck in `sending` past the claim timeout to `scheduled`.
///
/// A wish claimed by a process that crashed mid-send is picked up again by
/// the next run. Messages already accepted by the provider before the crash
/// may be sent a second time.
pub struct ReclaimStaleClaimsUseCase {
    repo: Arc<dyn WishRepository>,
    timeout: Duration,
}

impl ReclaimStaleClaimsUseCase {
    pub fn new(repo: Arc<dyn WishRepository>, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    pub async fn execute(&self) -> Result<Vec<Uuid>, DispatchError> {
        let timeout = TimeDelta::from_std(self.timeout)
            .map_err(|err| DispatchError::Configuration(format!("invalid claim timeout: {err}")))?;
        let reclaimed = self.repo.reclaim_stale(Utc::now() - timeout).await?;

        for id in &reclaimed {
            warn!(wish_id = %id, "reclaimed stale claim");
        }
        Ok(reclaimed)
    }
}
