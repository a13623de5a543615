//! HTTP surface: webhook ingestion, retrieval API, and the governance API.
//! Config-driven via `EngineConfig`, the same load-then-serve shape as the
//! rest of this engine's binaries.
//!
//! NOTE: sled is single-writer. The gateway and worker must each be given
//! their own `store_path`; they do not share one sled database.

mod handlers;
mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use shard_adapters::{AdapterRegistry, AdapterRuntime, GoogleDriveAdapter, SalesforceAdapter, SlackAdapter};
use shard_credentials::{CredentialManager, SecretVault};
use shard_governance::{GovernancePolicy, RedactionRegistry};
use shard_queue::{QueueBus, WebhookHandler};
use shard_retrieval::{AutoAttachWorker, HashEmbeddingProvider, InsightEngine, ProjectResolver, VectorSearchEngine};
use shard_store::{ChangeFeed, SledStore};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use state::AppState;

const EMBEDDING_DIMENSIONS: usize = 256;

fn install_master_key(vault: &SecretVault) {
    match std::env::var("SHARD_CREDENTIAL_MASTER_KEY") {
        Ok(hex_key) => match hex::decode(hex_key.trim()) {
            Ok(bytes) if bytes.len() == 32 => {
                let mut key = [0u8; 32];
                key.copy_from_slice(&bytes);
                vault.install_key("default", key);
            }
            _ => {
                tracing::error!("SHARD_CREDENTIAL_MASTER_KEY must decode to 32 bytes of hex; refusing to start with a weak key");
                std::process::exit(1);
            }
        },
        Err(_) => {
            tracing::warn!("SHARD_CREDENTIAL_MASTER_KEY not set; generating an ephemeral key for this process only (credentials will not survive a restart)");
            vault.install_key("default", rand::random());
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[shard-gateway] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = shard_core::EngineConfig::load().expect("load EngineConfig");

    let gateway_store_path = std::env::var("SHARD_GATEWAY_STORE_PATH")
        .unwrap_or_else(|_| format!("{}/gateway", config.store_path));
    let change_feed = Arc::new(ChangeFeed::new());
    let store: Arc<dyn shard_store::Backend> =
        Arc::new(SledStore::open(&gateway_store_path, change_feed.clone()).expect("open sled store"));

    let vault = Arc::new(SecretVault::empty());
    install_master_key(&vault);
    let credentials = Arc::new(CredentialManager::new(
        vault,
        config.credential_refresh_buffer_seconds as i64,
    ));

    let runtime = Arc::new(AdapterRuntime::new());
    let mut registry = AdapterRegistry::new();
    let slack_signing_secret = std::env::var("SHARD_SLACK_SIGNING_SECRET").unwrap_or_default();
    registry.register(Arc::new(SalesforceAdapter::new(runtime.clone())));
    registry.register(Arc::new(SlackAdapter::new(runtime.clone(), slack_signing_secret)));
    registry.register(Arc::new(GoogleDriveAdapter::new(runtime.clone())));
    let adapters = Arc::new(registry);

    let embedder = Arc::new(HashEmbeddingProvider::new(EMBEDDING_DIMENSIONS));
    let search = Arc::new(VectorSearchEngine::new(store.clone(), embedder, GovernancePolicy::default()));
    let resolver = Arc::new(ProjectResolver::new(store.clone()));
    let insights = Arc::new(InsightEngine::new(store.clone()));
    let auto_attach = Arc::new(AutoAttachWorker::new(store.clone()));

    let bus = Arc::new(QueueBus::new());
    let webhooks = Arc::new(WebhookHandler::new(adapters.clone()));

    let state = Arc::new(AppState {
        store,
        change_feed: change_feed.clone(),
        search,
        resolver: resolver.clone(),
        insights: insights.clone(),
        redactions: Arc::new(RwLock::new(RedactionRegistry::default())),
        adapters,
        webhooks,
        credentials,
        bus,
    });

    // Keep the project cache and the KPI shards current as shards change,
    // without either the resolver or the insight engine depending on the
    // gateway's routing layer.
    tokio::spawn({
        let resolver = resolver.clone();
        let mut events = change_feed.subscribe();
        async move {
            while let Ok(event) = events.recv().await {
                resolver.invalidate_on_change(&event);
            }
        }
    });
    tokio::spawn(insights.run_on_change_feed(change_feed.subscribe()));
    tokio::spawn(auto_attach.run_on_change_feed(change_feed.subscribe()));

    let app = Router::new()
        .route("/health", get(handlers::health))
        .route("/webhooks/:provider", post(handlers::webhook_handler))
        .route("/search/semantic", post(handlers::semantic_search_handler))
        .route("/search/hybrid", post(handlers::hybrid_search_handler))
        .route("/projects/:id/context", get(handlers::project_context_handler))
        .route(
            "/projects/:id/internal-relationships",
            get(handlers::internal_relationships_handler),
        )
        .route(
            "/projects/:id/external-relationships",
            get(handlers::external_relationships_handler),
        )
        .route("/projects/:id/insights", get(handlers::project_insights_handler))
        .route(
            "/redaction/config",
            get(handlers::get_redaction_config_handler).post(handlers::set_redaction_config_handler),
        )
        .route(
            "/audit-trail",
            get(handlers::audit_trail_handler).post(handlers::write_audit_entry_handler),
        )
        .route("/metrics", get(handlers::metrics_handler))
        .route("/metrics/aggregated", get(handlers::aggregated_metrics_handler))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.gateway_port);
    tracing::info!(%addr, "shard-gateway listening");
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("bind gateway port");
    axum::serve(listener, app).await.expect("gateway server error");
}
