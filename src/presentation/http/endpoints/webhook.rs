use std::sync::Arc;

use chrono::Utc;
use poem_openapi::{
    ApiResponse, OpenApi,
    param::Query,
    payload::{Json, PlainText},
};
use tracing::debug;

use crate::{
    application::usecases::verify_webhook::{VerifyOutcome, VerifyWebhookRequest},
    infrastructure::whatsapp::webhook::parse_webhook,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::map_reconcile_report,
        responses::WebhookResponseDto,
    },
};

#[derive(ApiResponse)]
pub enum VerifyResponse {
    /// The challenge, echoed verbatim.
    #[oai(status = 200)]
    Verified(PlainText<String>),
    #[oai(status = 403)]
    Forbidden(PlainText<String>),
}

#[derive(Clone)]
pub struct WebhookEndpoints {
    state: Arc<ApiState>,
}

impl WebhookEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl WebhookEndpoints {
    /// Subscription handshake.
    #[oai(path = "/webhook", method = "get", tag = EndpointsTags::Webhook)]
    pub async fn verify(
        &self,
        #[oai(name = "hub.mode")] mode: Query<Option<String>>,
        #[oai(name = "hub.verify_token")] verify_token: Query<Option<String>>,
        #[oai(name = "hub.challenge")] challenge: Query<Option<String>>,
    ) -> VerifyResponse {
        let outcome = self.state.verify_webhook_usecase.execute(VerifyWebhookRequest {
            mode: mode.0,
            verify_token: verify_token.0,
            challenge: challenge.0,
        });
        match outcome {
            VerifyOutcome::Verified(challenge) => VerifyResponse::Verified(PlainText(challenge)),
            VerifyOutcome::Rejected => {
                VerifyResponse::Forbidden(PlainText("Forbidden".to_string()))
            }
        }
    }

    /// Delivery status and inbound message callbacks. Always acknowledged so
    /// the provider does not redeliver a batch for one bad entry.
    #[oai(path = "/webhook", method = "post", tag = EndpointsTags::Webhook)]
    pub async fn receive(&self, body: Json<serde_json::Value>) -> Json<WebhookResponseDto> {
        let parsed = parse_webhook(&body.0, Utc::now());
        debug!(
            events = parsed.events.len(),
            skipped = parsed.skipped,
            "webhook received"
        );

        let report = self.state.reconcile_usecase.execute(parsed.events).await;
        Json(map_reconcile_report(&report, parsed.skipped))
    }
}
