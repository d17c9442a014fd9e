use std::sync::Arc;
use std::time::Duration;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Header, payload::Json};

use crate::{
    application::usecases::broadcast_marketing::BroadcastRequest,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_broadcast_report, map_dispatch_error},
        requests::BroadcastRequestDto,
        responses::BroadcastResponseDto,
        security::ensure_dispatch_key,
    },
};

#[derive(Clone)]
pub struct BroadcastEndpoints {
    state: Arc<ApiState>,
}

impl BroadcastEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl BroadcastEndpoints {
    /// Sends the marketing template to every phone, one after another.
    #[oai(path = "/broadcast", method = "post", tag = EndpointsTags::Broadcast)]
    pub async fn broadcast(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
        request: Json<BroadcastRequestDto>,
    ) -> PoemResult<Json<BroadcastResponseDto>> {
        ensure_dispatch_key(self.state.dispatch_key.as_deref(), dispatch_key.0.as_deref())?;

        let request = request.0;
        let report = self
            .state
            .broadcast_usecase
            .execute(BroadcastRequest {
                phones: request.phones,
                media_id: request.media_id,
                delay: request.delay_ms.map(Duration::from_millis),
            })
            .await
            .map_err(map_dispatch_error)?;

        Ok(Json(map_broadcast_report(&report)))
    }
}
