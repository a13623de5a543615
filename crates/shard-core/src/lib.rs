pub mod config;
pub mod error;
pub mod job;
pub mod provider;
pub mod secure_memory;
pub mod shard;
pub mod tenant;

pub use config::{EngineConfig, TenantOverrides};
pub use error::{ErrorClass, SyncError, SyncResult};
pub use job::{AuditRecord, MetricRecord, SyncJobRecord, SyncJobStatus};
pub use provider::{
    IntegrationInstance, IntegrationStatus, Provider, ProviderCategory, Schedule, ScheduleKind,
    SyncDirection,
};
pub use secure_memory::LockedVec;
pub use shard::{
    ExternalRelationship, InternalRelationship, RedactionMark, RelationshipSource, Shard,
    ShardMetadata, ShardStatus,
};
pub use tenant::{Tenant, TenantContext, TenantStatus};
