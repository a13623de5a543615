use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shard_core::LockedVec;

use crate::error::CredentialError;

const NONCE_LEN: usize = 12;

/// AES-256-GCM encryption at rest, same wire format as a single-tenant secret
/// vault: `[12-byte nonce][ciphertext+tag]`, generalized here to hold one
/// master key per `keyId` instead of a single global key so tenants can be
/// rotated/revoked independently.
pub struct SecretVault {
    keys: DashMap<String, Key<Aes256Gcm>>,
}

impl SecretVault {
    pub fn empty() -> Self {
        Self {
            keys: DashMap::new(),
        }
    }

    pub fn install_key(&self, key_id: impl Into<String>, key_bytes: [u8; 32]) {
        self.keys
            .insert(key_id.into(), Key::<Aes256Gcm>::from_slice(&key_bytes).to_owned());
    }

    pub fn encrypt(&self, key_id: &str, plaintext: &LockedVec) -> Result<Vec<u8>, CredentialError> {
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CredentialError::Locked(key_id.to_string()))?;
        let cipher = Aes256Gcm::new(&key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| CredentialError::EncryptionFailed(e.to_string()))?;
        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(nonce.as_slice());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, key_id: &str, blob: &[u8]) -> Result<LockedVec, CredentialError> {
        if blob.len() < NONCE_LEN {
            return Err(CredentialError::DecryptionFailed);
        }
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CredentialError::Locked(key_id.to_string()))?;
        let cipher = Aes256Gcm::new(&key);
        let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CredentialError::DecryptionFailed)?;
        Ok(LockedVec::new(plaintext))
    }
}

/// The decrypted, in-memory form of a credential. Never serialized, never
/// logged; adapters receive a reference to this and must not copy it out.
#[derive(Serialize, Deserialize)]
pub struct CredentialPayload {
    pub fields: serde_json::Value,
}
