use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    application::{
        handlers::wish_dispatcher::{WishDispatchHandler, WishDispatchReport},
        services::provider::MessagingProvider,
    },
    domain::{
        errors::DispatchError,
        repositories::{ClaimOutcome, WishRepository},
    },
};

/// Targeted send of one wish, claimed by id.
pub struct SendWishUseCase {
    repo: Arc<dyn WishRepository>,
    provider: Arc<dyn MessagingProvider>,
    handler: Arc<WishDispatchHandler>,
}

impl SendWishUseCase {
    pub fn new(
        repo: Arc<dyn WishRepository>,
        provider: Arc<dyn MessagingProvider>,
        handler: Arc<WishDispatchHandler>,
    ) -> Self {
        Self {
            repo,
            provider,
            handler,
        }
    }

    pub async fn execute(&self, wish_id: Uuid) -> Result<WishDispatchReport, DispatchError> {
        self.provider.ensure_ready()?;

        match self.repo.claim_by_id(wish_id, Utc::now()).await? {
            ClaimOutcome::Claimed(wish) => self.handler.handle(wish).await,
            ClaimOutcome::Conflict => Err(DispatchError::ClaimConflict(wish_id)),
            ClaimOutcome::NotFound => Err(DispatchError::NotFound(wish_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::testing::{ScriptedProvider, no_delay_config, sample_wish},
        domain::models::WishStatus,
        infrastructure::repositories::in_memory::InMemoryWishRepository,
    };

    fn usecase(
        repo: Arc<InMemoryWishRepository>,
        provider: Arc<ScriptedProvider>,
    ) -> SendWishUseCase {
        let handler = Arc::new(WishDispatchHandler::new(
            repo.clone(),
            provider.clone(),
            no_delay_config(),
        ));
        SendWishUseCase::new(repo, provider, handler)
    }

    #[tokio::test]
    async fn second_send_of_same_wish_conflicts() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let wish = repo.insert(sample_wish()).await.unwrap();
        let send = usecase(repo.clone(), provider.clone());

        let report = send.execute(wish.id).await.unwrap();
        assert_eq!(report.status, WishStatus::Sent);

        let err = send.execute(wish.id).await.unwrap_err();
        assert!(matches!(err, DispatchError::ClaimConflict(id) if id == wish.id));
        assert_eq!(provider.sent().len(), 1);
    }

    #[tokio::test]
    async fn unknown_wish_is_not_found() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let missing = Uuid::new_v4();

        let err = usecase(repo, provider).execute(missing).await.unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(id) if id == missing));
    }

    #[tokio::test]
    async fn future_wish_can_be_sent_early() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let provider = Arc::new(ScriptedProvider::new());
        let mut new = sample_wish();
        new.scheduled_at = Utc::now() + chrono::TimeDelta::days(3);
        let wish = repo.insert(new).await.unwrap();

        let report = usecase(repo, provider).execute(wish.id).await.unwrap();
        assert_eq!(report.messages_sent, 1);
    }
}
