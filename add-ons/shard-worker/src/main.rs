//! Long-running worker process: sync scheduler, queue consumers, and the
//! hourly credential refresh loop, all on the same `tokio::select!` shutdown
//! as the rest of this engine's background processes.
//!
//! NOTE: sled is single-writer. The worker and the gateway must each be given
//! their own `store_path` (see `SHARD__STORE_PATH` / `config/engine.toml`);
//! they do not share one sled database.

mod schemas;

use std::collections::HashMap;
use std::sync::Arc;

use shard_adapters::{provider_catalog, AdapterRegistry, AdapterRuntime, GoogleDriveAdapter, SalesforceAdapter, SlackAdapter};
use shard_credentials::{CredentialManager, SecretVault, TokenRefresherLoop};
use shard_governance::RedactionRegistry;
use shard_queue::{EnrichmentWorker, HeuristicEntityExtractor, NormalizationWorker, QueueBus, WriteBackWorker};
use shard_retrieval::AutoAttachWorker;
use shard_scheduler::{Dispatcher, InstanceLookup, JobStore};
use shard_store::{ChangeFeed, SledStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Stub instance directory: in this workspace, integration instances live
/// wherever the gateway's control-plane API writes them. The worker process
/// only needs read access to schedule and dispatch against them, so this is
/// the seam a real deployment backs with a shared store or an RPC call to
/// the gateway.
struct StaticInstances {
    instances: HashMap<(String, String), shard_core::IntegrationInstance>,
    tenant_timezones: HashMap<String, String>,
}

impl InstanceLookup for StaticInstances {
    fn get(&self, tenant_id: &str, integration_id: &str) -> Option<shard_core::IntegrationInstance> {
        self.instances
            .get(&(tenant_id.to_string(), integration_id.to_string()))
            .cloned()
    }

    fn tenant_timezone(&self, tenant_id: &str) -> String {
        self.tenant_timezones
            .get(tenant_id)
            .cloned()
            .unwrap_or_else(|| "UTC".to_string())
    }

    fn persist_cursor(&self, _tenant_id: &str, _integration_id: &str, _cursor: Option<serde_json::Value>) {
        // No-op: this in-memory stand-in does not survive restarts. A real
        // deployment wires this to the same store that owns IntegrationInstance.
    }
}

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
        eprintln!("[shard-worker] .env not loaded: {e} (using system environment)");
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = shard_core::EngineConfig::load().expect("load EngineConfig");

    let worker_store_path = std::env::var("SHARD_WORKER_STORE_PATH")
        .unwrap_or_else(|_| format!("{}/worker", config.store_path));
    let change_feed = Arc::new(ChangeFeed::new());
    let store: Arc<dyn shard_store::Backend> = Arc::new(
        SledStore::open(&worker_store_path, change_feed.clone()).expect("open sled store"),
    );

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
    let registry = Arc::new(registry);

    tracing::info!(
        providers = registry.provider_ids().len(),
        catalog_size = provider_catalog().len(),
        "adapter registry initialized"
    );

    let bus = Arc::new(QueueBus::new());
    let redactions = RedactionRegistry::default();

    let normalization = Arc::new(NormalizationWorker::new(
        store.clone(),
        schemas::default_schemas(),
        redactions,
    ));
    let enrichment = Arc::new(EnrichmentWorker::new(store.clone(), Arc::new(HeuristicEntityExtractor::new())));
    let writeback = Arc::new(WriteBackWorker::new(
        registry.clone(),
        Arc::new({
            let instances: HashMap<(String, String), shard_core::IntegrationInstance> = HashMap::new();
            move |tenant_id: &str, integration_id: &str| {
                instances.get(&(tenant_id.to_string(), integration_id.to_string())).cloned()
            }
        }),
    ));

    let jobs = Arc::new(JobStore::new());
    let instances = Arc::new(StaticInstances {
        instances: HashMap::new(),
        tenant_timezones: HashMap::new(),
    });
    let pull_worker = Arc::new(shard_queue::PullWorker::new(registry.clone()));
    let dispatcher = Arc::new(Dispatcher::new(
        jobs,
        pull_worker,
        bus.clone(),
        instances,
        format!("worker-{}", uuid::Uuid::new_v4()),
    ));

    let refresher = Arc::new(TokenRefresherLoop::new(credentials.clone()));
    let auto_attach = Arc::new(AutoAttachWorker::new(store.clone()));

    tokio::spawn(normalization.run(bus.clone()));
    tokio::spawn(enrichment.run(bus.clone()));
    tokio::spawn(writeback.run(bus.clone()));
    tokio::spawn(refresher.run());
    tokio::spawn(auto_attach.run_on_change_feed(change_feed.subscribe()));

    tracing::info!(tick_seconds = config.scheduler_tick_seconds, "shard-worker started");
    dispatcher
        .run(std::time::Duration::from_secs(config.scheduler_tick_seconds))
        .await;
}
