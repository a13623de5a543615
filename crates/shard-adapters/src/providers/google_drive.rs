use async_trait::async_trait;
use serde_json::{json, Value};
use shard_core::IntegrationInstance;
use std::sync::Arc;

use crate::adapter::{Adapter, FetchPage, WebhookEvent};
use crate::error::AdapterError;
use crate::runtime::AdapterRuntime;

const RATE_PER_SECOND: u32 = 100;

/// OAuth2 storage adapter, pull-only. Cursor is Drive's `startPageToken`
/// change-token; `fetch_records` walks `changes.list` rather than re-listing
/// the whole drive every tick.
pub struct GoogleDriveAdapter {
    runtime: Arc<AdapterRuntime>,
}

impl GoogleDriveAdapter {
    pub fn new(runtime: Arc<AdapterRuntime>) -> Self {
        Self { runtime }
    }

    fn access_token(instance: &IntegrationInstance) -> String {
        instance
            .cursor
            .as_ref()
            .and_then(|c| c.get("access_token"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl Adapter for GoogleDriveAdapter {
    fn provider_id(&self) -> &str {
        "google_drive"
    }

    async fn connect(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        self.test_connection(instance).await
    }

    async fn disconnect(&self, _instance: &IntegrationInstance) -> Result<(), AdapterError> {
        Ok(())
    }

    async fn test_connection(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        let token = Self::access_token(instance);
        self.runtime
            .execute(&instance.tenant_id, "google_drive", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .get("https://www.googleapis.com/drive/v3/about")
                    .bearer_auth(&token)
                    .query(&[("fields", "user")])
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
        let token = Self::access_token(instance);
        let page_token = cursor
            .as_ref()
            .and_then(|c| c.get("page_token"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        if page_token.is_empty() {
            // Bootstrap: obtain a starting page token before the first `changes.list` call.
            return self
                .runtime
                .execute(&instance.tenant_id, "google_drive", RATE_PER_SECOND, || async {
                    let resp: Value = self
                        .runtime
                        .http
                        .get("https://www.googleapis.com/drive/v3/changes/startPageToken")
                        .bearer_auth(&token)
                        .send()
                        .await
                        .map_err(AdapterError::from)?
                        .json()
                        .await
                        .map_err(AdapterError::from)?;
                    let start = resp
                        .get("startPageToken")
                        .cloned()
                        .unwrap_or(json!(""));
                    Ok(FetchPage {
                        records: vec![],
                        next_cursor: Some(json!({ "page_token": start })),
                        has_more: true,
                    })
                })
                .await;
        }

        self.runtime
            .execute(&instance.tenant_id, "google_drive", RATE_PER_SECOND, || async {
                let resp: Value = self
                    .runtime
                    .http
                    .get("https://www.googleapis.com/drive/v3/changes")
                    .bearer_auth(&token)
                    .query(&[("pageToken", page_token.as_str())])
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .json()
                    .await
                    .map_err(AdapterError::from)?;

                let records = resp
                    .get("changes")
                    .and_then(|r| r.as_array())
                    .cloned()
                    .unwrap_or_default();
                let next_page_token = resp
                    .get("nextPageToken")
                    .or_else(|| resp.get("newStartPageToken"))
                    .cloned()
                    .unwrap_or(json!(page_token));
                let has_more = resp.get("nextPageToken").is_some();

                Ok(FetchPage {
                    records,
                    next_cursor: Some(json!({ "page_token": next_page_token })),
                    has_more,
                })
            })
            .await
    }

    async fn create_record(
        &self,
        _instance: &IntegrationInstance,
        _payload: Value,
    ) -> Result<Value, AdapterError> {
        Err(AdapterError::Fatal("google_drive adapter is pull-only".into()))
    }

    async fn update_record(
        &self,
        _instance: &IntegrationInstance,
        _external_id: &str,
        _payload: Value,
    ) -> Result<Value, AdapterError> {
        Err(AdapterError::Fatal("google_drive adapter is pull-only".into()))
    }

    async fn delete_record(
        &self,
        _instance: &IntegrationInstance,
        _external_id: &str,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::Fatal("google_drive adapter is pull-only".into()))
    }

    async fn register_webhook(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        let token = Self::access_token(instance);
        self.runtime
            .execute(&instance.tenant_id, "google_drive", RATE_PER_SECOND, || async {
                self.runtime
                    .http
                    .post("https://www.googleapis.com/drive/v3/changes/watch")
                    .bearer_auth(&token)
                    .json(&json!({ "id": uuid::Uuid::new_v4().to_string(), "type": "web_hook" }))
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .error_for_status()
                    .map_err(AdapterError::from)?;
                Ok(())
            })
            .await
    }

    fn verify_webhook(&self, event: &WebhookEvent) -> Result<(), AdapterError> {
        let has_channel_id = event
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case("X-Goog-Channel-Id"));
        if has_channel_id {
            Ok(())
        } else {
            Err(AdapterError::Auth("missing google drive channel header".into()))
        }
    }

    async fn refresh(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        self.test_connection(instance).await
    }
}
