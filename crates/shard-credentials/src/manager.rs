use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shard_core::LockedVec;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::CredentialError;
use crate::vault::{CredentialPayload, SecretVault};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub handle: String,
    pub tenant_id: String,
    pub provider_id: String,
    pub key_id: String,
    pub ciphertext: Vec<u8>,
    pub expires_at: Option<DateTime<Utc>>,
    pub rotated_at: DateTime<Utc>,
}

/// Something that knows how to turn an expiring credential into a fresh one
/// (an OAuth refresh-token exchange, typically). Implemented per adapter so
/// the manager stays provider-agnostic.
#[async_trait::async_trait]
pub trait Refresher: Send + Sync {
    async fn refresh(&self, current: &CredentialPayload) -> Result<CredentialPayload, CredentialError>;
}

/// Credential manager: encrypted storage plus a refresh loop with single-flight
/// coalescing so concurrent callers racing on an expiring credential trigger
/// exactly one upstream refresh call, keyed by credential handle the same way
/// the adapter layer keys rate limiters by (tenant, provider).
pub struct CredentialManager {
    vault: Arc<SecretVault>,
    records: DashMap<String, CredentialRecord>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    refresh_buffer: Duration,
}

impl CredentialManager {
    pub fn new(vault: Arc<SecretVault>, refresh_buffer_seconds: i64) -> Self {
        Self {
            vault,
            records: DashMap::new(),
            refresh_locks: DashMap::new(),
            refresh_buffer: Duration::seconds(refresh_buffer_seconds),
        }
    }

    pub fn store(
        &self,
        tenant_id: &str,
        provider_id: &str,
        key_id: &str,
        payload: &CredentialPayload,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<String, CredentialError> {
        let handle = format!("{tenant_id}:{provider_id}:{}", uuid::Uuid::new_v4());
        let plaintext = LockedVec::new(serde_json::to_vec(payload).unwrap_or_default());
        let ciphertext = self.vault.encrypt(key_id, &plaintext)?;
        self.records.insert(
            handle.clone(),
            CredentialRecord {
                handle: handle.clone(),
                tenant_id: tenant_id.to_string(),
                provider_id: provider_id.to_string(),
                key_id: key_id.to_string(),
                ciphertext,
                expires_at,
                rotated_at: Utc::now(),
            },
        );
        Ok(handle)
    }

    pub fn fetch(&self, handle: &str) -> Result<CredentialPayload, CredentialError> {
        let record = self
            .records
            .get(handle)
            .ok_or_else(|| CredentialError::NotFound(handle.to_string()))?;
        let plaintext = self.vault.decrypt(&record.key_id, &record.ciphertext)?;
        serde_json::from_slice(plaintext.as_slice()).map_err(|_| CredentialError::DecryptionFailed)
    }

    pub fn rotate(
        &self,
        handle: &str,
        payload: &CredentialPayload,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), CredentialError> {
        let mut record = self
            .records
            .get_mut(handle)
            .ok_or_else(|| CredentialError::NotFound(handle.to_string()))?;
        let plaintext = LockedVec::new(serde_json::to_vec(payload).unwrap_or_default());
        record.ciphertext = self.vault.encrypt(&record.key_id, &plaintext)?;
        record.expires_at = expires_at;
        record.rotated_at = Utc::now();
        Ok(())
    }

    /// Credentials due to expire within the refresh buffer window.
    pub fn list_expiring(&self) -> Vec<String> {
        let cutoff = Utc::now() + self.refresh_buffer;
        self.records
            .iter()
            .filter(|r| r.expires_at.map(|e| e <= cutoff).unwrap_or(false))
            .map(|r| r.handle.clone())
            .collect()
    }

    /// Refreshes a single credential, coalescing concurrent callers on the
    /// same handle into one upstream refresh call.
    pub async fn refresh_one(
        &self,
        handle: &str,
        refresher: &dyn Refresher,
    ) -> Result<(), CredentialError> {
        let lock = self
            .refresh_locks
            .entry(handle.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Re-check after acquiring the lock: another caller may have just refreshed this.
        let still_expiring = self
            .records
            .get(handle)
            .and_then(|r| r.expires_at)
            .map(|e| e <= Utc::now() + self.refresh_buffer)
            .unwrap_or(false);
        if !still_expiring {
            return Ok(());
        }

        let current = self.fetch(handle)?;
        match refresher.refresh(&current).await {
            Ok(fresh) => {
                self.rotate(handle, &fresh, None)?;
                info!(handle, "credential refreshed");
                Ok(())
            }
            Err(e) => {
                warn!(handle, error = %e, "credential refresh failed");
                Err(e)
            }
        }
    }
}
