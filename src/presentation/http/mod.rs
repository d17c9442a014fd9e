use std::sync::Arc;

use poem_openapi::OpenApiService;

use crate::presentation::http::endpoints::{
    broadcast::BroadcastEndpoints, dispatch::DispatchEndpoints, health::HealthEndpoints,
    root::ApiState, webhook::WebhookEndpoints, wishes::WishesEndpoints,
};

pub mod endpoints;
pub mod mappers;
pub mod requests;
pub mod responses;
pub mod security;

pub type Endpoints = (
    HealthEndpoints,
    DispatchEndpoints,
    WishesEndpoints,
    BroadcastEndpoints,
    WebhookEndpoints,
);

pub fn api_service(state: Arc<ApiState>) -> OpenApiService<Endpoints, ()> {
    OpenApiService::new(
        (
            HealthEndpoints,
            DispatchEndpoints::new(state.clone()),
            WishesEndpoints::new(state.clone()),
            BroadcastEndpoints::new(state.clone()),
            WebhookEndpoints::new(state),
        ),
        "Wish Dispatch API",
        env!("CARGO_PKG_VERSION"),
    )
}

#[cfg(test)]
mod tests {
    use poem::{Route, http::StatusCode, test::TestClient};
    use serde_json::json;

    use super::*;
    use crate::{
        application::testing::{ScriptedProvider, no_delay_config, sample_wish},
        domain::{models::ProviderStatus, repositories::WishRepository},
        infrastructure::repositories::in_memory::InMemoryWishRepository,
    };

    fn client(
        repo: Arc<InMemoryWishRepository>,
        dispatch_key: Option<&str>,
    ) -> TestClient<Route> {
        let state = ApiState::new(
            repo,
            Arc::new(ScriptedProvider::new()),
            no_delay_config(),
            Some("s3cret".to_string()),
            dispatch_key.map(str::to_string),
        );
        TestClient::new(Route::new().nest("/api", api_service(Arc::new(state))))
    }

    #[tokio::test]
    async fn webhook_handshake_echoes_or_forbids() {
        let cli = client(Arc::new(InMemoryWishRepository::new()), None);

        let resp = cli
            .get("/api/webhook")
            .query("hub.mode", &"subscribe")
            .query("hub.verify_token", &"s3cret")
            .query("hub.challenge", &"1158201444")
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_text("1158201444").await;

        let resp = cli
            .get("/api/webhook")
            .query("hub.mode", &"subscribe")
            .query("hub.verify_token", &"wrong")
            .query("hub.challenge", &"1158201444")
            .send()
            .await;
        resp.assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn webhook_post_applies_statuses_and_acknowledges() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let wish = repo.insert(sample_wish()).await.unwrap();
        let cli = client(repo.clone(), None);

        cli.post("/api/dispatch")
            .body_json(&json!({ "wish_id": wish.id }))
            .send()
            .await
            .assert_status_is_ok();

        let resp = cli
            .post("/api/webhook")
            .body_json(&json!({
                "object": "whatsapp_business_account",
                "entry": [{"changes": [{"value": {"statuses": [
                    {"id": "wamid.1", "status": "delivered", "timestamp": "4102444800"},
                    {"id": "wamid.404", "status": "read", "timestamp": "4102444800"},
                    {"status": "read"}
                ]}}]}]
            }))
            .send()
            .await;
        resp.assert_status_is_ok();
        let body = resp.json().await;
        let body = body.value().object();
        body.get("success").assert_bool(true);
        body.get("applied").assert_i64(1);
        body.get("unmatched").assert_i64(1);
        body.get("skipped").assert_i64(1);

        let stored = repo.get(wish.id).await.unwrap().unwrap();
        assert_eq!(stored.provider_status, Some(ProviderStatus::Delivered));
    }

    #[tokio::test]
    async fn second_targeted_dispatch_conflicts() {
        let repo = Arc::new(InMemoryWishRepository::new());
        let wish = repo.insert(sample_wish()).await.unwrap();
        let cli = client(repo, None);

        let resp = cli
            .post("/api/dispatch")
            .body_json(&json!({ "wish_id": wish.id }))
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.json().await.value().object().get("sent").assert_i64(1);

        cli.post("/api/dispatch")
            .body_json(&json!({ "wish_id": wish.id }))
            .send()
            .await
            .assert_status(StatusCode::CONFLICT);

        cli.get(format!("/api/wishes/{}", uuid::Uuid::new_v4()))
            .send()
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn dispatch_key_is_enforced_when_configured() {
        let cli = client(Arc::new(InMemoryWishRepository::new()), Some("k"));

        cli.post("/api/dispatch")
            .body_json(&json!({}))
            .send()
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        cli.post("/api/dispatch")
            .header("x-dispatch-key", "k")
            .body_json(&json!({}))
            .send()
            .await
            .assert_status_is_ok();
    }

    #[tokio::test]
    async fn invalid_wish_and_empty_broadcast_are_bad_requests() {
        let cli = client(Arc::new(InMemoryWishRepository::new()), None);

        cli.post("/api/wishes")
            .body_json(&json!({
                "sender_name": "Ravi",
                "recipient_name": "Asha",
                "recipient_phone": "12",
                "occasion": "birthday"
            }))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        cli.post("/api/broadcast")
            .body_json(&json!({ "phones": [] }))
            .send()
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
