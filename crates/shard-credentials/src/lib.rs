pub mod error;
pub mod manager;
pub mod refresher;
pub mod vault;

pub use error::CredentialError;
pub use manager::{CredentialManager, CredentialRecord, Refresher};
pub use refresher::TokenRefresherLoop;
pub use vault::{CredentialPayload, SecretVault};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn vault_with_key() -> Arc<SecretVault> {
        let vault = SecretVault::empty();
        vault.install_key("k1", [7u8; 32]);
        Arc::new(vault)
    }

    #[test]
    fn store_and_fetch_round_trips() {
        let manager = CredentialManager::new(vault_with_key(), 7200);
        let payload = CredentialPayload {
            fields: serde_json::json!({"access_token": "abc"}),
        };
        let handle = manager
            .store("tenant-a", "salesforce", "k1", &payload, None)
            .unwrap();
        let fetched = manager.fetch(&handle).unwrap();
        assert_eq!(fetched.fields["access_token"], "abc");
    }

    #[test]
    fn list_expiring_respects_buffer() {
        let manager = CredentialManager::new(vault_with_key(), 7200);
        let payload = CredentialPayload {
            fields: serde_json::json!({}),
        };
        let soon = Utc::now() + Duration::minutes(30);
        let handle = manager
            .store("tenant-a", "slack", "k1", &payload, Some(soon))
            .unwrap();
        assert_eq!(manager.list_expiring(), vec![handle]);
    }

    struct NoopRefresher;

    #[async_trait::async_trait]
    impl Refresher for NoopRefresher {
        async fn refresh(
            &self,
            current: &CredentialPayload,
        ) -> Result<CredentialPayload, CredentialError> {
            Ok(CredentialPayload {
                fields: current.fields.clone(),
            })
        }
    }

    #[tokio::test]
    async fn refresh_one_clears_expiry() {
        let manager = Arc::new(CredentialManager::new(vault_with_key(), 7200));
        let payload = CredentialPayload {
            fields: serde_json::json!({"access_token": "abc"}),
        };
        let soon = Utc::now() + Duration::minutes(10);
        let handle = manager
            .store("tenant-a", "salesforce", "k1", &payload, Some(soon))
            .unwrap();
        manager.refresh_one(&handle, &NoopRefresher).await.unwrap();
        assert!(manager.list_expiring().is_empty());
    }
}
