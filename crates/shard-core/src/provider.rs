use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCategory {
    Crm,
    Messaging,
    Storage,
    Meetings,
    Documents,
    News,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SyncDirection {
    PullOnly,
    PushOnly,
    Bidirectional,
}

/// Static catalog entry for a provider. One per supported vendor; does not vary
/// per tenant (per-tenant variation lives on `IntegrationInstance`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: String,
    pub display_name: String,
    pub category: ProviderCategory,
    pub direction: SyncDirection,
    /// Sustained requests/second budget, per spec's external rate-limit table.
    pub rate_limit_per_second: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Active,
    Paused,
    Failed,
    Disconnected,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleKind {
    Interval,
    Cron,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub kind: ScheduleKind,
    /// Seconds, when `kind == Interval`.
    pub interval_seconds: Option<u64>,
    /// Cron expression, when `kind == Cron`; evaluated in the tenant's timezone.
    pub cron_expression: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationInstance {
    pub integration_id: String,
    pub tenant_id: String,
    pub provider_id: String,
    pub status: IntegrationStatus,
    pub credential_handle: String,
    pub schedule: Schedule,
    /// Opaque provider-specific cursor (OAuth watermark, page token, etc).
    pub cursor: Option<serde_json::Value>,
    pub project_id: Option<String>,
}
