use async_trait::async_trait;
use serde_json::{json, Value};
use shard_core::IntegrationInstance;
use std::sync::Arc;

use crate::adapter::{Adapter, FetchPage, WebhookEvent};
use crate::error::AdapterError;
use crate::runtime::AdapterRuntime;

const RATE_PER_SECOND: u32 = 25;

/// OAuth2 CRM adapter. Cursor is the SOQL `LastModifiedDate` watermark from
/// the previous page; `fetch_records` issues one SOQL query per call.
pub struct SalesforceAdapter {
    runtime: Arc<AdapterRuntime>,
}

impl SalesforceAdapter {
    pub fn new(runtime: Arc<AdapterRuntime>) -> Self {
        Self { runtime }
    }

    fn instance_base_url(instance: &IntegrationInstance) -> String {
        instance
            .cursor
            .as_ref()
            .and_then(|c| c.get("instance_url"))
            .and_then(|v| v.as_str())
            .unwrap_or("https://login.salesforce.com")
            .to_string()
    }
}

#[async_trait]
impl Adapter for SalesforceAdapter {
    fn provider_id(&self) -> &str {
        "salesforce"
    }

    async fn connect(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        self.test_connection(instance).await
    }

    async fn disconnect(&self, _instance: &IntegrationInstance) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn test_connection(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        let base = Self::instance_base_url(instance);
        let url = format!("{base}/services/data/v59.0/limits");
        self.runtime
            .execute(&instance.tenant_id, "salesforce", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?;
                Ok(())
            })
            .await
    }

    async fn fetch_records(
        &self,
        instance: &IntegrationInstance,
        cursor: Option<Value>,
    ) -> Result<FetchPage, AdapterError> {
        let watermark = cursor
            .as_ref()
            .and_then(|c| c.get("last_modified_date"))
            .and_then(|v| v.as_str())
            .unwrap_or("1970-01-01T00:00:00Z")
            .to_string();
        let base = Self::instance_base_url(instance);
        let soql = format!(
            "SELECT Id,Name,LastModifiedDate FROM Contact WHERE LastModifiedDate > {watermark} ORDER BY LastModifiedDate LIMIT 200"
        );
        let url = format!("{base}/services/data/v59.0/query");

        self.runtime
            .execute(&instance.tenant_id, "salesforce", RATE_PER_SECOND, || async {
                let resp: Value = self
                    .runtime
                    .http
                    .get(&url)
                    .query(&[("q", soql.as_str())])
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?
                    .json()
                    .await
                    .map_err(AdapterError::from)?;

                let records = resp
                    .get("records")
                    .and_then(|r| r.as_array())
                    .cloned()
                    .unwrap_or_default();
                let next_watermark = records
                    .last()
                    .and_then(|r| r.get("LastModifiedDate"))
                    .cloned()
                    .unwrap_or(json!(watermark));
                let done = resp.get("done").and_then(|v| v.as_bool()).unwrap_or(true);

                Ok(FetchPage {
                    records,
                    next_cursor: Some(json!({ "last_modified_date": next_watermark })),
                    has_more: !done,
                })
            })
            .await
    }

    async fn create_record(
        &self,
        instance: &IntegrationInstance,
        payload: Value,
    ) -> Result<Value, AdapterError> {
        let base = Self::instance_base_url(instance);
        let url = format!("{base}/services/data/v59.0/sobjects/Contact");
        self.runtime
            .execute(&instance.tenant_id, "salesforce", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .post(&url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?
                    .json()
                    .await
                    .map_err(AdapterError::from)
            })
            .await
    }

    async fn update_record(
        &self,
        instance: &IntegrationInstance,
        external_id: &str,
        payload: Value,
    ) -> Result<Value, AdapterError> {
        let base = Self::instance_base_url(instance);
        let url = format!("{base}/services/data/v59.0/sobjects/Contact/{external_id}");
        self.runtime
            .execute(&instance.tenant_id, "salesforce", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .patch(&url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?;
                Ok(payload.clone())
            })
            .await
    }

    async fn delete_record(
        &self,
        instance: &IntegrationInstance,
        external_id: &str,
    ) -> Result<(), AdapterError> {
        let base = Self::instance_base_url(instance);
        let url = format!("{base}/services/data/v59.0/sobjects/Contact/{external_id}");
        self.runtime
            .execute(&instance.tenant_id, "salesforce", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .delete(&url)
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?;
                Ok(())
            })
            .await
    }

    async fn register_webhook(&self, _instance: &IntegrationInstance) -> Result<(), AdapterError> {
        // Salesforce uses Platform Events / CDC subscriptions rather than a
        // single registered callback URL; out of scope for this adapter.
        Ok(())
    }

    fn verify_webhook(&self, _event: &WebhookEvent) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn refresh(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        self.test_connection(instance).await
    }
}
