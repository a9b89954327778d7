use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{
            BlockRequest, BlockResponse, ProfileResponse, ReportRequest, ReportResponse,
            StarRequest, StarResponse,
        },
        AppState,
    },
    service::NewReport,
    storage::Storage,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarQuery {
    giver_id: Uuid,
    receiver_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockQuery {
    blocker_id: Uuid,
    blocked_id: Uuid,
}

pub async fn give_star<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<StarRequest>,
) -> ApiResult<impl IntoResponse> {
    let star = state
        .campus
        .give_star(req.giver_id, req.receiver_id, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(StarResponse {
            giver_id: star.giver_id,
            receiver_id: star.receiver_id,
            created_at: star.created_at,
        }),
    ))
}

pub async fn remove_star<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(q): ApiQuery<StarQuery>,
) -> ApiResult<StatusCode> {
    state.campus.remove_star(q.giver_id, q.receiver_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn block<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<BlockRequest>,
) -> ApiResult<impl IntoResponse> {
    let block = state
        .campus
        .block(req.blocker_id, req.blocked_id, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(BlockResponse {
            blocker_id: block.blocker_id,
            blocked_id: block.blocked_id,
            created_at: block.created_at,
        }),
    ))
}

pub async fn unblock<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(q): ApiQuery<BlockQuery>,
) -> ApiResult<StatusCode> {
    state.campus.unblock(q.blocker_id, q.blocked_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn blocked<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let profiles = state.campus.blocked_profiles(user)?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

pub async fn report<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<ReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let report = state.campus.report(
        NewReport {
            reporter_id: req.reporter_id,
            reported_id: req.reported_id,
            reason: req.reason,
            details: req.details,
        },
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}
