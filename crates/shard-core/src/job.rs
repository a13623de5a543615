use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncJobStatus {
    Queued,
    Leased,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobRecord {
    pub job_id: Uuid,
    pub tenant_id: String,
    pub integration_id: String,
    pub provider_id: String,
    pub status: SyncJobStatus,
    pub lease_owner: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub attempt: u32,
    pub next_run_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub records_ingested: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub tenant_id: String,
    pub actor: String,
    pub action: String,
    pub target_shard_id: Option<Uuid>,
    pub before: Option<serde_json::Value>,
    pub after: Option<serde_json::Value>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    pub metric_id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub value: f64,
    pub dimensions: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}
