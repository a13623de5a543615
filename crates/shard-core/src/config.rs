use serde::{Deserialize, Serialize};

use crate::error::SyncError;

fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

/// Engine-wide configuration shared by the gateway and worker binaries.
/// Precedence, matching the teacher's `CoreConfig::load`: explicit file path >
/// `config/engine.toml` in the cwd > built-in defaults > env overlay
/// (`SHARD__` prefix, `__` separator) applied last so operators can always
/// override without touching the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub store_path: String,
    pub scheduler_tick_seconds: u64,
    pub max_total_concurrent_syncs: u32,
    pub max_concurrent_syncs_per_tenant: u32,
    pub min_sync_interval_seconds: u64,
    pub sync_timeout_seconds: u64,
    pub credential_refresh_buffer_seconds: u64,
    pub gateway_port: u16,
    pub enable_vector_search: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_path: "./data/shards".to_string(),
            scheduler_tick_seconds: 60,
            max_total_concurrent_syncs: 50,
            max_concurrent_syncs_per_tenant: 3,
            min_sync_interval_seconds: 300,
            sync_timeout_seconds: 600,
            credential_refresh_buffer_seconds: 2 * 3600,
            gateway_port: 8080,
            enable_vector_search: env_bool("SHARD_ENABLE_VECTOR_SEARCH", true),
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, SyncError> {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();

        let builder = config::Config::builder()
            .set_default("store_path", defaults.store_path.clone())?
            .set_default("scheduler_tick_seconds", defaults.scheduler_tick_seconds)?
            .set_default(
                "max_total_concurrent_syncs",
                defaults.max_total_concurrent_syncs,
            )?
            .set_default(
                "max_concurrent_syncs_per_tenant",
                defaults.max_concurrent_syncs_per_tenant,
            )?
            .set_default(
                "min_sync_interval_seconds",
                defaults.min_sync_interval_seconds,
            )?
            .set_default("sync_timeout_seconds", defaults.sync_timeout_seconds)?
            .set_default(
                "credential_refresh_buffer_seconds",
                defaults.credential_refresh_buffer_seconds,
            )?
            .set_default("gateway_port", defaults.gateway_port)?
            .set_default("enable_vector_search", defaults.enable_vector_search)?
            .add_source(config::File::with_name("config/engine").required(false))
            .add_source(
                config::Environment::with_prefix("SHARD")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}

/// Arbitrary per-tenant override layered on top of `EngineConfig` at runtime
/// (sync interval floor, feature toggles); distinct from the global file so a
/// single tenant's change never requires a restart.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TenantOverrides {
    pub min_sync_interval_seconds: Option<u64>,
    pub max_concurrent_syncs: Option<u32>,
}

impl TenantOverrides {
    pub fn effective_min_interval(&self, engine: &EngineConfig) -> u64 {
        self.min_sync_interval_seconds
            .unwrap_or(engine.min_sync_interval_seconds)
            .max(env_u64("SHARD_MIN_SYNC_INTERVAL_FLOOR", 0))
    }
}
