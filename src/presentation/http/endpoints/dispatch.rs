use std::sync::Arc;

use poem::{Result as PoemResult, http::StatusCode};
use poem_openapi::{OpenApi, param::Header, payload::Json};

use crate::{
    application::usecases::send_test_message::SendTestMessageRequest,
    domain::models::WishStatus,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_dispatch_error, map_run_report, map_wish_report},
        requests::{DispatchRequestDto, TestMessageRequestDto},
        responses::{DispatchResponseDto, ReclaimResponseDto, TestMessageResponseDto},
        security::ensure_dispatch_key,
    },
};

#[derive(Clone)]
pub struct DispatchEndpoints {
    state: Arc<ApiState>,
}

impl DispatchEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    fn authorize(&self, key: &Header<Option<String>>) -> PoemResult<()> {
        ensure_dispatch_key(self.state.dispatch_key.as_deref(), key.0.as_deref())
    }
}

#[OpenApi]
impl DispatchEndpoints {
    /// Sends every due wish, or only `wish_id` when given.
    #[oai(path = "/dispatch", method = "post", tag = EndpointsTags::Dispatch)]
    pub async fn dispatch(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
        request: Json<DispatchRequestDto>,
    ) -> PoemResult<Json<DispatchResponseDto>> {
        self.authorize(&dispatch_key)?;

        let Some(wish_id) = request.wish_id else {
            let report = self
                .state
                .dispatch_due_usecase
                .execute()
                .await
                .map_err(map_dispatch_error)?;
            return Ok(Json(map_run_report(&report)));
        };

        let report = self
            .state
            .send_wish_usecase
            .execute(wish_id)
            .await
            .map_err(map_dispatch_error)?;
        let sent = report.status == WishStatus::Sent;

        Ok(Json(DispatchResponseDto {
            success: true,
            reclaimed: 0,
            claimed: 1,
            sent: u32::from(sent),
            failed: u32::from(!sent),
            skipped: 0,
            results: vec![map_wish_report(&report)],
            errors: Vec::new(),
        }))
    }

    /// Returns wishes stuck in `sending` past the claim timeout to `scheduled`.
    #[oai(path = "/dispatch/reclaim", method = "post", tag = EndpointsTags::Dispatch)]
    pub async fn reclaim(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
    ) -> PoemResult<Json<ReclaimResponseDto>> {
        self.authorize(&dispatch_key)?;

        let reclaimed = self
            .state
            .reclaim_usecase
            .execute()
            .await
            .map_err(map_dispatch_error)?;
        Ok(Json(ReclaimResponseDto { reclaimed }))
    }

    #[oai(path = "/dispatch/test", method = "post", tag = EndpointsTags::Dispatch)]
    pub async fn send_test_message(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
        request: Json<TestMessageRequestDto>,
    ) -> PoemResult<Json<TestMessageResponseDto>> {
        self.authorize(&dispatch_key)?;

        let request = request.0;
        let message_id = self
            .state
            .send_test_message_usecase
            .execute(SendTestMessageRequest {
                phone: request.phone,
                message: request.message,
            })
            .await
            .map_err(|err| {
                if err.is_fatal() {
                    map_dispatch_error(err)
                } else {
                    poem::Error::from_string(err.to_string(), StatusCode::BAD_REQUEST)
                }
            })?;

        Ok(Json(TestMessageResponseDto {
            success: true,
            message_id,
        }))
    }
}
