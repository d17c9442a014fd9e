use std::sync::Arc;

use poem_openapi::Tags;

use crate::{
    application::{
        handlers::wish_dispatcher::{DispatchConfig, WishDispatchHandler},
        services::provider::MessagingProvider,
        usecases::{
            broadcast_marketing::BroadcastMarketingUseCase,
            dispatch_due_wishes::DispatchDueWishesUseCase, get_wish::GetWishUseCase,
            reclaim_stale::ReclaimStaleClaimsUseCase, reconcile_status::ReconcileStatusUseCase,
            schedule_wish::ScheduleWishUseCase, send_test_message::SendTestMessageUseCase,
            send_wish::SendWishUseCase, verify_webhook::VerifyWebhookUseCase,
        },
    },
    domain::repositories::WishRepository,
};

#[derive(Clone)]
pub struct ApiState {
    pub dispatch_due_usecase: Arc<DispatchDueWishesUseCase>,
    pub send_wish_usecase: Arc<SendWishUseCase>,
    pub reclaim_usecase: Arc<ReclaimStaleClaimsUseCase>,
    pub send_test_message_usecase: Arc<SendTestMessageUseCase>,
    pub broadcast_usecase: Arc<BroadcastMarketingUseCase>,
    pub schedule_wish_usecase: Arc<ScheduleWishUseCase>,
    pub get_wish_usecase: Arc<GetWishUseCase>,
    pub reconcile_usecase: Arc<ReconcileStatusUseCase>,
    pub verify_webhook_usecase: Arc<VerifyWebhookUseCase>,
    pub dispatch_key: Option<String>,
}

impl ApiState {
    pub fn new(
        repo: Arc<dyn WishRepository>,
        provider: Arc<dyn MessagingProvider>,
        dispatch: DispatchConfig,
        verify_token: Option<String>,
        dispatch_key: Option<String>,
    ) -> Self {
        let reclaim_usecase = Arc::new(ReclaimStaleClaimsUseCase::new(
            repo.clone(),
            dispatch.stale_claim_timeout,
        ));
        let handler = Arc::new(WishDispatchHandler::new(
            repo.clone(),
            provider.clone(),
            dispatch.clone(),
        ));

        Self {
            dispatch_due_usecase: Arc::new(DispatchDueWishesUseCase::new(
                repo.clone(),
                provider.clone(),
                handler.clone(),
                reclaim_usecase.clone(),
            )),
            send_wish_usecase: Arc::new(SendWishUseCase::new(
                repo.clone(),
                provider.clone(),
                handler,
            )),
            reclaim_usecase,
            send_test_message_usecase: Arc::new(SendTestMessageUseCase::new(
                provider.clone(),
                dispatch.clone(),
            )),
            broadcast_usecase: Arc::new(BroadcastMarketingUseCase::new(provider, dispatch)),
            schedule_wish_usecase: Arc::new(ScheduleWishUseCase::new(repo.clone())),
            get_wish_usecase: Arc::new(GetWishUseCase::new(repo.clone())),
            reconcile_usecase: Arc::new(ReconcileStatusUseCase::new(repo)),
            verify_webhook_usecase: Arc::new(VerifyWebhookUseCase::new(verify_token)),
            dispatch_key: dispatch_key.filter(|key| !key.is_empty()),
        }
    }
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Dispatch,
    Wishes,
    Broadcast,
    Webhook,
}
