//! # Mission Routes
//!
//! CRUD, telemetry ingestion, aggregated analytics and threat
//! transitions, all scoped to the authenticated operator. Response
//! bodies keep the shapes the frontend already consumes: wrapped
//! `{success, mission}` style objects with camelCase keys.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use hoverfly_analytics::{DEFAULT_WINDOW, flight_path, recent_averages, threats_by_type};
use hoverfly_domain::{
    FieldError, MissionDraft, MissionFilter, MissionPatch, MissionStatus, MissionType, PageInfo,
    PageRequest, TelemetryDraft, ThreatStatus,
};

use crate::auth::{PERM_CREATE_MISSIONS, PERM_DELETE_MISSIONS, Principal};
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};
use crate::ingest::IngestPipeline;

fn bad_body(rejection: &JsonRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::invalid("body", &rejection.body_text())])
}

fn bad_query(rejection: &QueryRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::invalid("query", &rejection.body_text())])
}

fn bad_path(rejection: &PathRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::invalid("id", &rejection.body_text())])
}

// =============================================================================
// CRUD
// =============================================================================

pub async fn create_mission(
    State(ctx): State<ApiContext>,
    principal: Principal,
    draft: Result<Json<MissionDraft>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    principal.require_permission(PERM_CREATE_MISSIONS)?;
    let Json(draft) = draft.map_err(|e| bad_body(&e))?;

    let mission = ctx.store.create(draft, principal.user_id).await?;
    tracing::info!(mission_id = %mission.id, name = %mission.name, "mission created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "mission": mission })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<MissionStatus>,
    #[serde(rename = "type", default)]
    pub mission_type: Option<MissionType>,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

pub async fn list_missions(
    State(ctx): State<ApiContext>,
    principal: Principal,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Query(query) = query.map_err(|e| bad_query(&e))?;

    let filter = MissionFilter {
        status: query.status,
        mission_type: query.mission_type,
    };
    let page = PageRequest::new(query.page.unwrap_or(1), query.limit.unwrap_or(10));

    let (missions, total) = ctx
        .store
        .list_by_owner(principal.user_id, filter, page)
        .await?;

    Ok(Json(json!({
        "missions": missions,
        "pagination": PageInfo::new(page, total),
    })))
}

pub async fn get_mission(
    State(ctx): State<ApiContext>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id.map_err(|e| bad_path(&e))?;

    let mission = ctx
        .store
        .get_by_id(id, principal.user_id)
        .await?
        .ok_or_else(ApiError::mission_not_found)?;

    Ok(Json(json!({ "mission": mission })))
}

pub async fn update_mission(
    State(ctx): State<ApiContext>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
    patch: Result<Json<MissionPatch>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id.map_err(|e| bad_path(&e))?;
    let Json(patch) = patch.map_err(|e| bad_body(&e))?;
    patch.validate()?;

    let mission = ctx
        .store
        .update(id, principal.user_id, patch)
        .await?
        .ok_or_else(ApiError::mission_not_found)?;

    tracing::info!(mission_id = %mission.id, name = %mission.name, "mission updated");
    Ok(Json(json!({ "success": true, "mission": mission })))
}

pub async fn delete_mission(
    State(ctx): State<ApiContext>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    principal.require_permission(PERM_DELETE_MISSIONS)?;
    let Path(id) = id.map_err(|e| bad_path(&e))?;

    if !ctx.store.delete(id, principal.user_id).await? {
        return Err(ApiError::mission_not_found());
    }

    tracing::info!(mission_id = %id, "mission deleted");
    Ok(Json(json!({
        "success": true,
        "message": "Mission deleted successfully",
    })))
}

// =============================================================================
// TELEMETRY & ANALYTICS
// =============================================================================

pub async fn ingest_telemetry(
    State(ctx): State<ApiContext>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
    draft: Result<Json<TelemetryDraft>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id.map_err(|e| bad_path(&e))?;
    let Json(draft) = draft.map_err(|e| bad_body(&e))?;

    let pipeline = IngestPipeline::new(
        ctx.store.clone(),
        ctx.analyzer.clone(),
        ctx.broadcaster.clone(),
        ctx.config.analysis.timeout,
    );
    let stored = pipeline.ingest(id, principal.user_id, draft).await?;

    Ok(Json(json!({ "success": true, "data": stored })))
}

pub async fn mission_analytics(
    State(ctx): State<ApiContext>,
    principal: Principal,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path(id) = id.map_err(|e| bad_path(&e))?;
    let owner = principal.user_id;

    let mission = ctx
        .store
        .get_by_id(id, owner)
        .await?
        .ok_or_else(ApiError::mission_not_found)?;

    let log = ctx
        .store
        .telemetry_log(id, owner)
        .await?
        .unwrap_or_default();
    let recent = ctx
        .store
        .recent_telemetry(id, owner, DEFAULT_WINDOW)
        .await?
        .unwrap_or_default();
    let threats = ctx.store.threat_log(id, owner).await?.unwrap_or_default();

    let mut analytics = serde_json::to_value(&mission.analytics)?;
    analytics["recentAverages"] = serde_json::to_value(recent_averages(&recent))?;
    analytics["threatsByType"] = serde_json::to_value(threats_by_type(&threats))?;
    analytics["flightPath"] = serde_json::to_value(flight_path(&log))?;

    Ok(Json(json!({ "analytics": analytics })))
}

// =============================================================================
// THREATS
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatStatusUpdate {
    pub status: ThreatStatus,
    #[serde(default)]
    pub action_taken: Option<String>,
}

pub async fn update_threat(
    State(ctx): State<ApiContext>,
    principal: Principal,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
    update: Result<Json<ThreatStatusUpdate>, JsonRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let Path((mission_id, threat_id)) = ids.map_err(|e| bad_path(&e))?;
    let Json(update) = update.map_err(|e| bad_body(&e))?;

    ctx.store
        .get_by_id(mission_id, principal.user_id)
        .await?
        .ok_or_else(ApiError::mission_not_found)?;

    let threat = ctx
        .store
        .update_threat_status(
            mission_id,
            principal.user_id,
            threat_id,
            update.status,
            update.action_taken,
        )
        .await?
        .ok_or_else(ApiError::threat_not_found)?;

    Ok(Json(json!({ "success": true, "threat": threat })))
}
