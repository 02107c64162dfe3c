use sales_agent_ai::GeminiBackend;
use sales_agent_messaging::WhatsAppClient;
use sales_agent_server::{config::ServerConfig, routes, state::AppState};
use sales_agent_store::{DocumentStore, MemoryStore, PgDocumentStore, TimeoutStore};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let store_timeout = config.agent.store_timeout();
    let (store, store_kind): (Arc<dyn DocumentStore>, &'static str) = match &config.database_url {
        Some(url) => {
            let store = PgDocumentStore::connect(url, config.database_max_connections)
                .await
                .expect("failed to connect to database");

            tracing::info!("Running database migrations...");
            store.migrate().await.expect("failed to run migrations");

            (Arc::new(TimeoutStore::new(store, store_timeout)), "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, documents are kept in memory");
            (
                Arc::new(TimeoutStore::new(MemoryStore::new(), store_timeout)),
                "memory",
            )
        }
    };

    let backend = GeminiBackend::new(config.gemini).expect("failed to build Gemini client");
    let messenger =
        WhatsAppClient::new(config.whatsapp.clone()).expect("failed to build WhatsApp client");

    let state = AppState::new(
        store,
        store_kind,
        Arc::new(backend),
        Arc::new(messenger),
        &config.agent,
    )
    .with_whatsapp(
        config.whatsapp.verify_token.clone(),
        config.whatsapp.phone_number_id.clone(),
    );

    let app = routes::router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
