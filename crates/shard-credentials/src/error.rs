use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("vault locked: no master key configured for key id {0}")]
    Locked(String),
    #[error("credential not found: {0}")]
    NotFound(String),
    #[error("credential expired: {0}")]
    Expired(String),
    #[error("refresh failed: {0}")]
    RefreshFailed(String),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("decryption failed: corrupt or tampered payload")]
    DecryptionFailed,
}
