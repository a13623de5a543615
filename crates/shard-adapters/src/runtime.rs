use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::warn;

use crate::backoff;
use crate::circuit_breaker::CircuitBreaker;
use crate::error::AdapterError;
use crate::rate_limit::TokenBucket;

/// Shared infrastructure every concrete adapter wraps its HTTP calls with:
/// per-(tenant, provider) rate limiting, retry-with-backoff, and a circuit
/// breaker. Adapters call `execute`; they never touch the bucket/breaker maps
/// directly, so the policy can change in one place.
pub struct AdapterRuntime {
    pub http: reqwest::Client,
    buckets: DashMap<(String, String), Mutex<TokenBucket>>,
    breakers: DashMap<(String, String), Mutex<CircuitBreaker>>,
}

impl AdapterRuntime {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("reqwest client"),
            buckets: DashMap::new(),
            breakers: DashMap::new(),
        }
    }

    fn bucket_key(tenant_id: &str, provider_id: &str) -> (String, String) {
        (tenant_id.to_string(), provider_id.to_string())
    }

    async fn acquire(&self, tenant_id: &str, provider_id: &str, rate_per_second: u32) {
        let key = Self::bucket_key(tenant_id, provider_id);
        loop {
            let wait = {
                let entry = self
                    .buckets
                    .entry(key.clone())
                    .or_insert_with(|| Mutex::new(TokenBucket::new(rate_per_second)));
                let mut bucket = entry.lock().await;
                bucket.try_acquire().err()
            };
            match wait {
                None => return,
                Some(delay) => tokio::time::sleep(delay).await,
            }
        }
    }

    /// Runs `call` under rate limiting, circuit breaking, and retry-with-
    /// backoff. `call` should issue exactly one upstream attempt per invocation.
    pub async fn execute<F, Fut, T>(
        &self,
        tenant_id: &str,
        provider_id: &str,
        rate_per_second: u32,
        mut call: F,
    ) -> Result<T, AdapterError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, AdapterError>>,
    {
        let key = Self::bucket_key(tenant_id, provider_id);
        let mut attempt = 0u32;
        loop {
            {
                let breaker_entry = self
                    .breakers
                    .entry(key.clone())
                    .or_insert_with(|| Mutex::new(CircuitBreaker::new()));
                let mut breaker = breaker_entry.lock().await;
                if !breaker.allow_request() {
                    return Err(AdapterError::CircuitOpen(provider_id.to_string()));
                }
            }

            self.acquire(tenant_id, provider_id, rate_per_second).await;
            let result = call().await;

            {
                let breaker_entry = self
                    .breakers
                    .entry(key.clone())
                    .or_insert_with(|| Mutex::new(CircuitBreaker::new()));
                let mut breaker = breaker_entry.lock().await;
                breaker.record(result.is_ok());
            }

            match result {
                Ok(v) => return Ok(v),
                Err(e) if e.class() == shard_core::ErrorClass::Retryable => {
                    if backoff::exhausted(attempt) {
                        return Err(e);
                    }
                    warn!(provider_id, attempt, error = %e, "adapter call failed, retrying");
                    tokio::time::sleep(backoff::next_delay(attempt)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for AdapterRuntime {
    fn default() -> Self {
        Self::new()
    }
}
