use async_trait::async_trait;
use serde_json::Value;
use shard_core::IntegrationInstance;

use crate::error::AdapterError;

/// One page of externally-sourced records plus the cursor to resume from.
pub struct FetchPage {
    pub records: Vec<Value>,
    pub next_cursor: Option<Value>,
    pub has_more: bool,
}

pub struct WebhookEvent {
    pub raw_body: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

/// Behavior every provider integration exposes. Providers are modeled as
/// trait objects registered under a provider id (see `AdapterRegistry`), not
/// as a type hierarchy -- a new vendor is a new impl, never a new base class.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn provider_id(&self) -> &str;

    async fn connect(&self, instance: &IntegrationInstance) -> Result<(), AdapterError>;
    async fn disconnect(&self, instance: &IntegrationInstance) -> Result<(), AdapterError>;
    async fn test_connection(&self, instance: &IntegrationInstance) -> Result<(), AdapterError>;

    async fn fetch_records(
        &self,
        instance: &IntegrationInstance,
        cursor: Option<Value>,
    ) -> Result<FetchPage, AdapterError>;

    async fn create_record(
        &self,
        instance: &IntegrationInstance,
        payload: Value,
    ) -> Result<Value, AdapterError>;

    async fn update_record(
        &self,
        instance: &IntegrationInstance,
        external_id: &str,
        payload: Value,
    ) -> Result<Value, AdapterError>;

    async fn delete_record(
        &self,
        instance: &IntegrationInstance,
        external_id: &str,
    ) -> Result<(), AdapterError>;

    async fn register_webhook(&self, instance: &IntegrationInstance) -> Result<(), AdapterError>;

    fn verify_webhook(&self, event: &WebhookEvent) -> Result<(), AdapterError>;

    async fn refresh(&self, instance: &IntegrationInstance) -> Result<(), AdapterError>;
}
