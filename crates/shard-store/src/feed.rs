use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum ChangeEvent {
    ShardCreated { tenant_id: String, shard_id: Uuid },
    ShardUpdated { tenant_id: String, shard_id: Uuid },
    ShardSoftDeleted { tenant_id: String, shard_id: Uuid },
}

/// Change feed broadcast: every write fans out here so the project-
/// auto-attachment worker, the insight engine, and the cache-invalidation
/// path can all subscribe independently without the store knowing about any
/// of them.
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1024);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ChangeEvent) {
        // No receivers is a normal state (e.g. during startup); ignore the error.
        let _ = self.sender.send(event);
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
