use std::sync::Arc;
use std::time::Duration;

use tokio::{
    task::JoinHandle,
    time::{MissedTickBehavior, interval},
};
use tracing::{error, info};

use crate::application::usecases::dispatch_due_wishes::DispatchDueWishesUseCase;

/// In-process cron: runs the batch dispatch on a fixed interval.
pub struct DispatchScheduler {
    period: Duration,
}

impl DispatchScheduler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn spawn(self, dispatch: Arc<DispatchDueWishesUseCase>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(dispatch).await })
    }

    async fn run(self, dispatch: Arc<DispatchDueWishesUseCase>) {
        info!(period_secs = self.period.as_secs(), "dispatch scheduler started");

        let mut ticker = interval(self.period);
        // A slow run must not be followed by a burst of catch-up runs.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match dispatch.execute().await {
                Ok(report) if report.claimed > 0 || report.reclaimed > 0 => info!(
                    claimed = report.claimed,
                    sent = report.sent,
                    failed = report.failed,
                    reclaimed = report.reclaimed,
                    "scheduled dispatch finished"
                ),
                Ok(_) => {}
                Err(err) => error!(error = %err, "scheduled dispatch failed"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::{
        application::{
            handlers::wish_dispatcher::WishDispatchHandler,
            testing::{ScriptedProvider, no_delay_config, sample_wish},
            usecases::reclaim_stale::ReclaimStaleClaimsUseCase,
        },
        domain::{models::WishStatus, repositories::WishRepository},
        infrastructure::repositories::in_memory::InMemoryWishRepository,
    };

    #[tokio::test]
    async fn first_tick_dispatches_due_wishes() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let config = no_delay_config();
        let reclaim = Arc::new(ReclaimStaleClaimsUseCase::new(
            repo.clone(),
            config.stale_claim_timeout,
        ));
        let handler = Arc::new(WishDispatchHandler::new(repo.clone(), provider.clone(), config));
        let dispatch = Arc::new(DispatchDueWishesUseCase::new(
            repo.clone(),
            provider.clone(),
            handler,
            reclaim,
        ));
        let wish = repo.insert(sample_wish()).await.unwrap();

        let task = DispatchScheduler::new(Duration::from_secs(3600)).spawn(dispatch);

        let deadline = Utc::now() + chrono::TimeDelta::seconds(5);
        loop {
            let stored = repo.get(wish.id).await.unwrap().unwrap();
            if stored.status == WishStatus::Sent {
                break;
            }
            assert!(Utc::now() < deadline, "scheduler never dispatched the wish");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        task.abort();
        assert_eq!(provider.sent().len(), 1);
    }
}
