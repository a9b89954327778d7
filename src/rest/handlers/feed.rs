use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{
            ActivityResponse, CountsResponse, LimitQuery, NotificationResponse,
            NotificationsQuery, ReputationResponse, UpdatedResponse, UserBody,
        },
        AppState,
    },
    storage::Storage,
};

pub async fn notifications<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<NotificationsQuery>,
) -> ApiResult<Json<Vec<NotificationResponse>>> {
    let list = state.campus.notifications(user, q.unread_only, q.limit)?;
    Ok(Json(list.into_iter().map(Into::into).collect()))
}

pub async fn mark_notification_read<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UserBody>,
) -> ApiResult<Json<UpdatedResponse>> {
    state.campus.mark_notification_read(id, req.user_id)?;
    Ok(Json(UpdatedResponse { updated: 1 }))
}

pub async fn mark_all_read<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
) -> ApiResult<Json<UpdatedResponse>> {
    let updated = state.campus.mark_all_notifications_read(user)?;
    Ok(Json(UpdatedResponse { updated }))
}

pub async fn counts<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
) -> ApiResult<Json<CountsResponse>> {
    Ok(Json(state.campus.counts(user)?.into()))
}

pub async fn activity<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let items = state.campus.activity(user, q.limit)?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

pub async fn reputation<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
) -> ApiResult<Json<ReputationResponse>> {
    Ok(Json(state.campus.reputation_summary(user, Utc::now())?.into()))
}
