use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{MatchResponse, SwipeRequest, SwipeResponse, UserQuery},
        AppState,
    },
    storage::Storage,
};

pub async fn swipe<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<SwipeRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .campus
        .swipe(req.swiper_id, req.target_id, req.direction, Utc::now())?;
    Ok((StatusCode::CREATED, Json(SwipeResponse::from(outcome))))
}

pub async fn list_matches<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(user): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<MatchResponse>>> {
    let matches = state.campus.list_matches(user)?;
    Ok(Json(matches.into_iter().map(Into::into).collect()))
}

pub async fn unmatch<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(match_id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<UserQuery>,
) -> ApiResult<StatusCode> {
    state.campus.unmatch(match_id, q.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::rest::handlers::test_support::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn swipe_errors_map_to_statuses() {
        let app = test_app();
        let a = app.profile("alice", &[]).await;
        let b = app.profile("bob", &[]).await;

        let (status, _) = app
            .call(
                "POST",
                "/api/swipes",
                Some(json!({"swiperId": a, "targetId": a, "direction": "like"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .call(
                "POST",
                "/api/swipes",
                Some(json!({"swiperId": a, "targetId": b, "direction": "superlike"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

        let (status, body) = app
            .call(
                "POST",
                "/api/swipes",
                Some(json!({"swiperId": a, "targetId": b, "direction": "pass"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["matched"], false);
        assert!(body.get("matchId").is_none());

        let (status, _) = app
            .call(
                "POST",
                "/api/swipes",
                Some(json!({"swiperId": a, "targetId": b, "direction": "like"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn mutual_like_lists_and_unmatches() {
        let app = test_app();
        let (a, b, match_id) = app.matched_pair().await;

        let (status, body) = app.call("GET", &format!("/api/users/{a}/matches"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["matchId"], match_id.as_str());
        assert_eq!(body[0]["other"]["id"], b.as_str());
        assert_eq!(body[0]["unreadCount"], 0);
        assert!(body[0]["lastMessage"].is_null());

        let (status, _) = app
            .call(
                "DELETE",
                &format!("/api/matches/{match_id}?userId={}", uuid::Uuid::new_v4()),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call("DELETE", &format!("/api/matches/{match_id}?userId={a}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = app.call("GET", &format!("/api/users/{b}/matches"), None).await;
        assert_eq!(body, json!([]));
    }
}
