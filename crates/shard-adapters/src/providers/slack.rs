use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use shard_core::IntegrationInstance;
use std::sync::Arc;

use crate::adapter::{Adapter, FetchPage, WebhookEvent};
use crate::error::AdapterError;
use crate::runtime::AdapterRuntime;

const RATE_PER_SECOND: u32 = 20;

type HmacSha256 = Hmac<Sha256>;

/// OAuth2 messaging adapter, pull-only. Cursor is Slack's `next_cursor`
/// pagination token. Webhook verification follows Slack's signed-secret
/// scheme: HMAC-SHA256 over `v0:{timestamp}:{body}`.
pub struct SlackAdapter {
    runtime: Arc<AdapterRuntime>,
    signing_secret: String,
}

impl SlackAdapter {
    pub fn new(runtime: Arc<AdapterRuntime>, signing_secret: String) -> Self {
        Self {
            runtime,
            signing_secret,
        }
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
impl Adapter for SlackAdapter {
    fn provider_id(&self) -> &str {
        "slack"
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
            .execute(&instance.tenant_id, "slack", RATE_PER_SECOND, || async {
                let resp: Value = self
                    .runtime
                    .http
                    .get("https://slack.com/api/auth.test")
                    .bearer_auth(&token)
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .json()
                    .await
                    .map_err(AdapterError::from)?;
                if resp.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
                    Ok(())
                } else {
                    Err(AdapterError::Auth("slack auth.test failed".into()))
                }
            })
            .await
    }

    async fn fetch_records(
        &self,
        instance: &IntegrationInstance,
        cursor: Option<Value>,
    ) -> Result<FetchPage, AdapterError> {
        let token = Self::access_token(instance);
        let channel = instance
            .cursor
            .as_ref()
            .and_then(|c| c.get("channel_id"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let next_cursor_token = cursor
            .as_ref()
            .and_then(|c| c.get("cursor"))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        self.runtime
            .execute(&instance.tenant_id, "slack", RATE_PER_SECOND, || async {
                let mut req = self
                    .runtime
                    .http
                    .get("https://slack.com/api/conversations.history")
                    .bearer_auth(&token)
                    .query(&[("channel", channel.as_str()), ("limit", "200")]);
                if !next_cursor_token.is_empty() {
                    req = req.query(&[("cursor", next_cursor_token.as_str())]);
                }
                let resp: Value = req
                    .send()
                    .await
                    .map_err(AdapterError::from)?
                    .json()
                    .await
                    .map_err(AdapterError::from)?;

                if !resp.get("ok").and_then(|v| v.as_bool()).unwrap_or(false) {
                    return Err(AdapterError::Retryable("slack conversations.history failed".into()));
                }

                let records = resp
                    .get("messages")
                    .and_then(|r| r.as_array())
                    .cloned()
                    .unwrap_or_default();
                let next = resp
                    .get("response_metadata")
                    .and_then(|m| m.get("next_cursor"))
                    .and_then(|v| v.as_str())
                    .unwrap_or_default()
                    .to_string();
                let has_more = !next.is_empty();

                Ok(FetchPage {
                    records,
                    next_cursor: Some(json!({ "cursor": next })),
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
        Err(AdapterError::Fatal("slack adapter is pull-only".into()))
    }

    async fn update_record(
        &self,
        _instance: &IntegrationInstance,
        _external_id: &str,
        _payload: Value,
    ) -> Result<Value, AdapterError> {
        Err(AdapterError::Fatal("slack adapter is pull-only".into()))
    }

    async fn delete_record(
        &self,
        _instance: &IntegrationInstance,
        _external_id: &str,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::Fatal("slack adapter is pull-only".into()))
    }

    async fn register_webhook(&self, _instance: &IntegrationInstance) -> Result<(), AdapterError> {
        // Slack events subscriptions are configured app-wide in the Slack admin
        // console, not per integration instance.
        Ok(())
    }

    fn verify_webhook(&self, event: &WebhookEvent) -> Result<(), AdapterError> {
        let timestamp = event
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("X-Slack-Request-Timestamp"))
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| AdapterError::Auth("missing slack timestamp header".into()))?;
        let signature = event
            .headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("X-Slack-Signature"))
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| AdapterError::Auth("missing slack signature header".into()))?;

        let body = String::from_utf8_lossy(&event.raw_body);
        let base_string = format!("v0:{timestamp}:{body}");

        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .map_err(|_| AdapterError::Auth("invalid slack signing secret".into()))?;
        mac.update(base_string.as_bytes());
        let expected = format!("v0={}", hex::encode(mac.finalize().into_bytes()));

        if expected == signature {
            Ok(())
        } else {
            Err(AdapterError::Auth("slack signature mismatch".into()))
        }
    }

    async fn refresh(&self, instance: &IntegrationInstance) -> Result<(), AdapterError> {
        self.test_connection(instance).await
    }
}
