use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::{
    application::{
        handlers::wish_dispatcher::{WishDispatchHandler, WishDispatchReport},
        services::provider::MessagingProvider,
        usecases::reclaim_stale::ReclaimStaleClaimsUseCase,
    },
    domain::{errors::DispatchError, models::WishStatus, repositories::WishRepository},
};

#[derive(Debug, Clone, Default)]
pub struct DispatchRunReport {
    pub reclaimed: usize,
    pub claimed: usize,
    pub sent: usize,
    pub failed: usize,
    /// Wishes another run took over after a stale-claim sweep.
    pub skipped: usize,
    pub results: Vec<WishDispatchReport>,
    /// Wishes whose outcome could not be recorded; they stay claimed until reclaimed.
    pub errors: Vec<String>,
}

/// Batch run: reclaim stale claims, claim every due wish and send them one
/// after another with a pause between wishes.
pub struct DispatchDueWishesUseCase {
    repo: Arc<dyn WishRepository>,
    provider: Arc<dyn MessagingProvider>,
    handler: Arc<WishDispatchHandler>,
    reclaim: Arc<ReclaimStaleClaimsUseCase>,
}

impl DispatchDueWishesUseCase {
    pub fn new(
        repo: Arc<dyn WishRepository>,
        provider: Arc<dyn MessagingProvider>,
        handler: Arc<WishDispatchHandler>,
        reclaim: Arc<ReclaimStaleClaimsUseCase>,
    ) -> Self {
        Self {
            repo,
            provider,
            handler,
            reclaim,
        }
    }

    pub async fn execute(&self) -> Result<DispatchRunReport, DispatchError> {
        self.provider.ensure_ready()?;

        let mut report = DispatchRunReport {
            reclaimed: self.reclaim.execute().await?.len(),
            ..DispatchRunReport::default()
        };

        let config = self.handler.config();
        let claimed = self.repo.claim_due(Utc::now(), config.batch_limit).await?;
        report.claimed = claimed.len();
        info!(claimed = claimed.len(), reclaimed = report.reclaimed, "dispatch run started");

        let mut pending = claimed.into_iter().enumerate();
        while let Some((index, wish)) = pending.next() {
            if index > 0 && !config.wish_delay.is_zero() {
                tokio::time::sleep(config.wish_delay).await;
            }

            let wish_id = wish.id;
            match self.handler.handle(wish).await {
                Ok(result) => {
                    match result.status {
                        WishStatus::Sent => report.sent += 1,
                        _ => report.failed += 1,
                    }
                    report.results.push(result);
                }
                Err(DispatchError::ClaimConflict(_)) => report.skipped += 1,
                Err(err) if err.is_fatal() => {
                    error!(wish_id = %wish_id, error = %err, "dispatch run aborted");
                    for (_, remaining) in pending {
                        if let Some(claimed_at) = remaining.claimed_at {
                            self.handler.release_claim(remaining.id, claimed_at).await;
                        }
                    }
                    return Err(err);
                }
                Err(err) => {
                    error!(wish_id = %wish_id, error = %err, "failed to record wish outcome");
                    report.errors.push(format!("{wish_id}: {err}"));
                }
            }
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            errors = report.errors.len(),
            "dispatch run finished"
        );
        Ok(report)
    }
}
