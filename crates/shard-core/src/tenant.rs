use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tenant-scoped request context. Carried through the pipeline so every
/// log line, metric, and store call can be attributed to a tenant without
/// threading an extra parameter through every function signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: String,
    pub correlation_id: Option<String>,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            correlation_id: None,
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TenantStatus {
    Active,
    Suspended,
    Deprovisioned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: String,
    pub display_name: String,
    pub status: TenantStatus,
    /// IANA timezone name (e.g. "America/Chicago"); governs cron schedule evaluation.
    pub timezone: String,
    pub created_at: DateTime<Utc>,
}
