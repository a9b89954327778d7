use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{
            MessagePageResponse, MessageResponse, MessagesQuery, SendMessageRequest,
            UpdatedResponse, UserBody,
        },
        AppState,
    },
    storage::Storage,
};

pub async fn send_message<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(match_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .campus
        .send_message(match_id, req.sender_id, &req.content, Utc::now())?;
    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

pub async fn list_messages<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(match_id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<MessagesQuery>,
) -> ApiResult<Json<MessagePageResponse>> {
    let page = state
        .campus
        .messages(match_id, q.user_id, q.cursor(), q.limit)?;
    Ok(Json(page.into()))
}

pub async fn mark_read<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(match_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UserBody>,
) -> ApiResult<Json<UpdatedResponse>> {
    let updated = state.campus.mark_read(match_id, req.user_id, Utc::now())?;
    Ok(Json(UpdatedResponse { updated }))
}

#[cfg(test)]
mod tests {
    use crate::rest::handlers::test_support::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn conversation_roundtrip() {
        let app = test_app();
        let (a, b, match_id) = app.matched_pair().await;
        let uri = format!("/api/matches/{match_id}/messages");

        for text in ["first", "second", "third"] {
            let (status, body) = app
                .call("POST", &uri, Some(json!({"senderId": a, "content": text})))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            assert_eq!(body["content"], text);
        }

        let (status, page) = app
            .call("GET", &format!("{uri}?userId={b}&limit=2"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["messages"][0]["content"], "third");
        assert_eq!(page["messages"].as_array().unwrap().len(), 2);
        let cursor = page["nextBefore"].as_str().unwrap().to_string();
        let cursor_id = page["nextBeforeId"].as_str().unwrap().to_string();
        assert_eq!(cursor_id, page["messages"][1]["id"].as_str().unwrap());

        let (status, older) = app
            .call(
                "GET",
                &format!(
                    "{uri}?userId={b}&limit=2&before={}&beforeId={cursor_id}",
                    cursor.replace('+', "%2B")
                ),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(older["messages"][0]["content"], "first");
        assert!(older["nextBefore"].is_null());

        let (_, body) = app
            .call(
                "POST",
                &format!("/api/matches/{match_id}/read"),
                Some(json!({"userId": b})),
            )
            .await;
        assert_eq!(body["updated"], 3);
    }

    #[tokio::test]
    async fn message_rules() {
        let app = test_app();
        let (a, _b, match_id) = app.matched_pair().await;
        let outsider = app.profile("eve", &[]).await;
        let uri = format!("/api/matches/{match_id}/messages");

        let (status, _) = app
            .call("POST", &uri, Some(json!({"senderId": a, "content": "   "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call("POST", &uri, Some(json!({"senderId": outsider, "content": "hi"})))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app
            .call("GET", &format!("{uri}?userId={outsider}"), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = app.call("GET", &uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
