use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::ApiState;
use crate::monitor::types::{Observation, Target, TargetId};
use crate::store::{NewTarget, TargetStatus, ThresholdUpdate};

const DEFAULT_EXPECTED_STATUS: u16 = 200;
const DEFAULT_CHECKS_LIMIT: usize = 50;
const MAX_CHECKS_LIMIT: usize = 1000;

#[derive(Serialize)]
pub struct Health {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateTarget {
    pub url: String,
    #[serde(default)]
    pub expected_status: Option<u16>,
    #[serde(default)]
    pub slow_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: TargetId,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTarget {
    #[serde(default)]
    pub expected_status: Option<u16>,
    #[serde(default)]
    pub slow_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ChecksQuery {
    #[serde(rename = "url_id", alias = "target_id")]
    pub target_id: Option<TargetId>,
    pub limit: Option<usize>,
}

pub async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

pub async fn create_target(
    State(state): State<ApiState>,
    Json(body): Json<CreateTarget>,
) -> Result<Json<Created>, ApiError> {
    // Zero means "not given".
    let expected_status = body
        .expected_status
        .filter(|s| *s != 0)
        .unwrap_or(DEFAULT_EXPECTED_STATUS);
    let slow_threshold_ms = body
        .slow_ms
        .filter(|ms| *ms != 0)
        .unwrap_or(state.default_slow_ms);

    let target = state
        .store
        .upsert_target(NewTarget {
            url: body.url.trim().to_string(),
            expected_status,
            slow_threshold_ms,
        })
        .await?;

    tracing::info!(target_id = target.id, url = %target.url, "Target registered");
    Ok(Json(Created { id: target.id }))
}

pub async fn list_targets(State(state): State<ApiState>) -> Result<Json<Vec<Target>>, ApiError> {
    Ok(Json(state.store.list_targets().await?))
}

pub async fn update_target(
    State(state): State<ApiState>,
    Path(id): Path<TargetId>,
    Json(body): Json<UpdateTarget>,
) -> Result<Json<Target>, ApiError> {
    if body.expected_status.is_none() && body.slow_ms.is_none() {
        return Err(ApiError::BadRequest(
            "nothing to update: give expected_status or slow_ms".to_string(),
        ));
    }

    let target = state
        .store
        .update_thresholds(
            id,
            ThresholdUpdate {
                expected_status: body.expected_status,
                slow_threshold_ms: body.slow_ms,
            },
        )
        .await?;

    tracing::info!(
        target_id = target.id,
        expected_status = target.expected_status,
        slow_threshold_ms = target.slow_threshold_ms,
        "Target thresholds updated"
    );
    Ok(Json(target))
}

pub async fn recent_checks(
    State(state): State<ApiState>,
    Query(query): Query<ChecksQuery>,
) -> Result<Json<Vec<Observation>>, ApiError> {
    let target_id = query
        .target_id
        .ok_or_else(|| ApiError::BadRequest("url_id is required".to_string()))?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CHECKS_LIMIT)
        .min(MAX_CHECKS_LIMIT);

    Ok(Json(state.store.recent_observations(target_id, limit).await?))
}

pub async fn latest_status(State(state): State<ApiState>) -> Result<Json<Vec<TargetStatus>>, ApiError> {
    Ok(Json(state.store.latest_status().await?))
}
