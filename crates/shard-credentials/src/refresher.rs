use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::manager::{CredentialManager, Refresher};

/// Hourly wake loop that scans for credentials inside the refresh buffer and
/// refreshes each, dispatching to the per-provider `Refresher` registered for
/// that credential's provider id.
pub struct TokenRefresherLoop {
    manager: Arc<CredentialManager>,
    refreshers: HashMap<String, Arc<dyn Refresher>>,
}

impl TokenRefresherLoop {
    pub fn new(manager: Arc<CredentialManager>) -> Self {
        Self {
            manager,
            refreshers: HashMap::new(),
        }
    }

    pub fn register(&mut self, provider_id: impl Into<String>, refresher: Arc<dyn Refresher>) {
        self.refreshers.insert(provider_id.into(), refresher);
    }

    pub async fn run_once(&self) {
        for handle in self.manager.list_expiring() {
            let provider_id = handle.split(':').nth(1).unwrap_or_default();
            let Some(refresher) = self.refreshers.get(provider_id) else {
                warn!(handle, provider_id, "no refresher registered for provider");
                continue;
            };
            if let Err(e) = self.manager.refresh_one(&handle, refresher.as_ref()).await {
                warn!(handle, error = %e, "scheduled refresh failed");
            }
        }
    }

    pub async fn run(self: Arc<Self>) {
        let mut tick = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tokio::select! {
                _ = tick.tick() => {
                    info!("token refresher wake");
                    self.run_once().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("token refresher shutting down");
                    break;
                }
            }
        }
    }
}
