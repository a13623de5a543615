use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shard_adapters::WebhookEvent;
use shard_core::ExternalRelationship;
use shard_governance::{audit_record_to_shard, new_audit_record, RedactionPolicy};
use shard_retrieval::{ResolveParams, SearchParams};
use shard_store::ShardQuery;
use uuid::Uuid;

use crate::state::AppState;

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
pub struct WebhookQuery {
    tenant_id: String,
    integration_id: String,
}

pub async fn webhook_handler(
    Path(provider_id): Path<String>,
    Query(query): Query<WebhookQuery>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> StatusCode {
    let event = WebhookEvent {
        raw_body: body.to_vec(),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
    };

    let records: Vec<serde_json::Value> = serde_json::from_slice(&event.raw_body).unwrap_or_default();

    match state
        .webhooks
        .handle(&provider_id, &query.tenant_id, &query.integration_id, event, records, &state.bus)
        .await
    {
        Ok(()) => StatusCode::ACCEPTED,
        Err(e) => {
            tracing::warn!(provider_id, error = %e, "webhook handling failed");
            StatusCode::BAD_REQUEST
        }
    }
}

#[derive(Deserialize)]
pub struct SearchRequest {
    tenant_id: String,
    project_id: Option<String>,
    query: String,
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    grants: Vec<String>,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
pub struct SearchResultItem {
    shard_id: Uuid,
    shard_type: String,
    score: f32,
    structured_data: serde_json::Value,
}

pub async fn semantic_search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResultItem>>, StatusCode> {
    let results = state
        .search
        .semantic_search(SearchParams {
            tenant_id: &req.tenant_id,
            project_id: req.project_id.as_deref(),
            query: &req.query,
            limit: req.limit,
            grants: &req.grants,
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "semantic search failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| SearchResultItem {
                shard_id: r.shard.shard_id,
                shard_type: r.shard.shard_type,
                score: r.score,
                structured_data: r.shard.structured_data,
            })
            .collect(),
    ))
}

pub async fn hybrid_search_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<Vec<SearchResultItem>>, StatusCode> {
    let results = state
        .search
        .hybrid_search(SearchParams {
            tenant_id: &req.tenant_id,
            project_id: req.project_id.as_deref(),
            query: &req.query,
            limit: req.limit,
            grants: &req.grants,
        })
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "hybrid search failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| SearchResultItem {
                shard_id: r.shard.shard_id,
                shard_type: r.shard.shard_type,
                score: r.score,
                structured_data: r.shard.structured_data,
            })
            .collect(),
    ))
}

#[derive(Deserialize)]
pub struct ProjectQuery {
    tenant_id: String,
    #[serde(default)]
    seed_shard_ids: Vec<Uuid>,
}

pub async fn project_context_handler(
    Path(project_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<shard_core::Shard>>, StatusCode> {
    let shards = state
        .resolver
        .resolve(&query.tenant_id, &query.seed_shard_ids, &project_id, ResolveParams::default())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "project context resolution failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    Ok(Json(shards))
}

pub async fn internal_relationships_handler(
    Path(project_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<shard_core::InternalRelationship>>, StatusCode> {
    let shards = state
        .resolver
        .resolve(&query.tenant_id, &query.seed_shard_ids, &project_id, ResolveParams::default())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let mut edges = Vec::new();
    for shard in &shards {
        if let Ok(from_edges) = state.store.relationships_from(&query.tenant_id, shard.shard_id).await {
            edges.extend(from_edges);
        }
    }
    Ok(Json(edges))
}

pub async fn external_relationships_handler(
    Path(project_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ExternalRelationship>>, StatusCode> {
    let shards = state
        .resolver
        .resolve(&query.tenant_id, &query.seed_shard_ids, &project_id, ResolveParams::default())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let external = shards
        .into_iter()
        .filter_map(|shard| {
            let provider_id = shard.source_provider_id.clone()?;
            let external_id = shard.source_external_id.clone()?;
            Some(ExternalRelationship {
                relationship_id: Uuid::new_v4(),
                tenant_id: shard.tenant_id.clone(),
                shard_id: shard.shard_id,
                provider_id,
                external_id,
                relationship_type: "source_of_record".to_string(),
                created_at: shard.created_at,
            })
        })
        .collect();
    Ok(Json(external))
}

pub async fn project_insights_handler(
    Path(project_id): Path<String>,
    Query(query): Query<ProjectQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<shard_core::Shard>>, StatusCode> {
    let shards = state
        .store
        .query_shards(ShardQuery {
            tenant_id: query.tenant_id.clone(),
            project_id: Some(project_id),
            ..Default::default()
        })
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .into_iter()
        .filter(|s| s.shard_type == "c_insight_kpi")
        .collect();
    Ok(Json(shards))
}

#[derive(Deserialize)]
pub struct RedactionConfigRequest {
    tenant_id: String,
    version: u32,
    redacted_paths: Vec<String>,
}

pub async fn set_redaction_config_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RedactionConfigRequest>,
) -> StatusCode {
    let mut registry = state.redactions.write().await;
    registry.set_policy(
        req.tenant_id,
        RedactionPolicy {
            version: req.version,
            redacted_paths: req.redacted_paths,
        },
    );
    StatusCode::NO_CONTENT
}

#[derive(Deserialize)]
pub struct TenantQuery {
    tenant_id: String,
}

pub async fn get_redaction_config_handler(
    Query(query): Query<TenantQuery>,
    State(state): State<Arc<AppState>>,
) -> Json<RedactionPolicy> {
    let registry = state.redactions.read().await;
    Json(registry.policy_for(&query.tenant_id))
}

#[derive(Deserialize)]
pub struct AuditQuery {
    tenant_id: String,
    #[serde(default)]
    actor: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    target_shard_id: Option<Uuid>,
    #[serde(default)]
    before: Option<serde_json::Value>,
    #[serde(default)]
    after: Option<serde_json::Value>,
}

/// Writes one audit log entry as a `system.audit_log` shard, redacted per the
/// tenant's current policy, the same pipeline every other shard goes through.
pub async fn write_audit_entry_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AuditQuery>,
) -> Result<StatusCode, StatusCode> {
    let record = new_audit_record(
        req.tenant_id.clone(),
        req.actor.unwrap_or_else(|| "system".to_string()),
        req.action.unwrap_or_else(|| "shard.update".to_string()),
        req.target_shard_id,
        req.before,
        req.after,
    );
    let policy = { state.redactions.read().await.policy_for(&req.tenant_id) };
    let shard = audit_record_to_shard(record, &policy);
    state.store.put_shard(shard).await.map_err(|e| {
        tracing::warn!(error = %e, "failed to persist audit shard");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(StatusCode::CREATED)
}

pub async fn audit_trail_handler(
    Query(query): Query<TenantQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<shard_core::Shard>>, StatusCode> {
    let shards = state
        .store
        .query_shards(ShardQuery {
            tenant_id: query.tenant_id,
            shard_type: Some("system.audit_log".to_string()),
            ..Default::default()
        })
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(shards))
}

#[derive(Serialize)]
pub struct MetricsResponse {
    providers_registered: usize,
    timestamp: chrono::DateTime<Utc>,
}

pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        providers_registered: state.adapters.provider_ids().len(),
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
pub struct AggregatedMetricsResponse {
    providers: Vec<String>,
    timestamp: chrono::DateTime<Utc>,
}

pub async fn aggregated_metrics_handler(State(state): State<Arc<AppState>>) -> Json<AggregatedMetricsResponse> {
    Json(AggregatedMetricsResponse {
        providers: state.adapters.provider_ids(),
        timestamp: Utc::now(),
    })
}
