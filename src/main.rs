use std::io::Error;
use std::sync::Arc;

use poem::{Route, Server, listener::TcpListener};
use sqlx::postgres::PgPoolOptions;
use tokio::main;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wish_dispatch::{
    application::services::provider::MessagingProvider,
    config::Config,
    domain::repositories::WishRepository,
    infrastructure::{
        repositories::{in_memory::InMemoryWishRepository, postgres::PostgresWishRepository},
        scheduler::worker::DispatchScheduler,
        whatsapp::client::WhatsAppClient,
    },
    presentation::http::{api_service, endpoints::root::ApiState},
};

#[main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::try_parse().map_err(Error::other)?;

    let repo: Arc<dyn WishRepository> = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(url)
                .await
                .map_err(Error::other)?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(Error::other)?;
            PostgresWishRepository::new(pool) as Arc<dyn WishRepository>
        }
        None => {
            warn!("DATABASE_URL is not set, wishes are kept in memory");
            Arc::new(InMemoryWishRepository::new()) as Arc<dyn WishRepository>
        }
    };

    let provider: Arc<dyn MessagingProvider> =
        WhatsAppClient::new(config.whatsapp.clone()).map_err(Error::other)?;
    if let Err(err) = provider.ensure_ready() {
        warn!(error = %err, "whatsapp credentials incomplete, dispatch runs will fail");
    }

    let state = Arc::new(ApiState::new(
        repo,
        provider,
        config.dispatch.clone(),
        config.verify_token.clone(),
        config.dispatch_key.clone(),
    ));

    if let Some(period) = config.dispatch_interval {
        DispatchScheduler::new(period).spawn(state.dispatch_due_usecase.clone());
    }

    let server_url = format!("{}://{}:{}", config.scheme, config.host, config.port);

    info!("Starting server at {}", server_url);

    let api_service = api_service(state).server(format!("{}/api", server_url));
    let ui = api_service.swagger_ui();
    let app = Route::new().nest("/api", api_service).nest("/", ui);

    Server::new(TcpListener::bind(format!("0.0.0.0:{}", config.port)))
        .run(app)
        .await
}
