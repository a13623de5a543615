use std::sync::Arc;

use shard_adapters::AdapterRegistry;
use shard_credentials::CredentialManager;
use shard_governance::RedactionRegistry;
use shard_queue::{QueueBus, WebhookHandler};
use shard_retrieval::{InsightEngine, ProjectResolver, VectorSearchEngine};
use shard_store::{Backend, ChangeFeed};
use tokio::sync::RwLock;

/// Shared application state handed to every route, the same `Arc<AppState>`
/// pattern the rest of this engine's long-running processes use.
pub struct AppState {
    pub store: Arc<dyn Backend>,
    pub change_feed: Arc<ChangeFeed>,
    pub search: Arc<VectorSearchEngine>,
    pub resolver: Arc<ProjectResolver>,
    pub insights: Arc<InsightEngine>,
    pub redactions: Arc<RwLock<RedactionRegistry>>,
    pub adapters: Arc<AdapterRegistry>,
    pub webhooks: Arc<WebhookHandler>,
    pub credentials: Arc<CredentialManager>,
    pub bus: Arc<QueueBus>,
}
