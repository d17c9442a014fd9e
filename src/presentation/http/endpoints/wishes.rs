use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{
    OpenApi,
    param::{Header, Path},
    payload::Json,
};
use uuid::Uuid;

use crate::{
    application::usecases::schedule_wish::ScheduleWishRequest,
    domain::models::Attachments,
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags},
        mappers::{map_dispatch_error, map_wish},
        requests::ScheduleWishRequestDto,
        responses::WishDto,
        security::ensure_dispatch_key,
    },
};

#[derive(Clone)]
pub struct WishesEndpoints {
    state: Arc<ApiState>,
}

impl WishesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl WishesEndpoints {
    #[oai(path = "/wishes", method = "post", tag = EndpointsTags::Wishes)]
    pub async fn schedule_wish(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
        request: Json<ScheduleWishRequestDto>,
    ) -> PoemResult<Json<WishDto>> {
        ensure_dispatch_key(self.state.dispatch_key.as_deref(), dispatch_key.0.as_deref())?;

        let request = request.0;
        let wish = self
            .state
            .schedule_wish_usecase
            .execute(ScheduleWishRequest {
                sender_name: request.sender_name,
                recipient_name: request.recipient_name,
                recipient_phone: request.recipient_phone,
                occasion: request.occasion,
                message_text: request.message_text,
                language: request.language,
                attachments: Attachments {
                    image_url: request.image_url,
                    video_url: request.video_url,
                    document_url: request.document_url,
                },
                scheduled_at: request.scheduled_at,
            })
            .await
            .map_err(map_dispatch_error)?;

        Ok(Json(map_wish(&wish)))
    }

    #[oai(path = "/wishes/:wish_id", method = "get", tag = EndpointsTags::Wishes)]
    pub async fn get_wish(
        &self,
        #[oai(name = "x-dispatch-key")] dispatch_key: Header<Option<String>>,
        wish_id: Path<Uuid>,
    ) -> PoemResult<Json<WishDto>> {
        ensure_dispatch_key(self.state.dispatch_key.as_deref(), dispatch_key.0.as_deref())?;

        let wish = self
            .state
            .get_wish_usecase
            .execute(wish_id.0)
            .await
            .map_err(map_dispatch_error)?;

        Ok(Json(map_wish(&wish)))
    }
}
