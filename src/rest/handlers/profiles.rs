use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{
            CreateProfileRequest, DiscoverResponse, LeaderboardEntryResponse, LeaderboardQuery,
            LimitQuery, ProfileResponse, SearchQuery, UpdateProfileRequest,
        },
        AppState,
    },
    service::{NewProfile, ProfilePatch},
    storage::{models::ProfileQuery, Storage},
};

pub async fn create_profile<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<CreateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = NewProfile {
        username: req.username,
        full_name: req.full_name,
        college: req.college,
        branch: req.branch,
        year: req.year,
        bio: req.bio,
        skills: req.skills,
        interests: req.interests,
        github_username: req.github_username,
        linkedin_url: req.linkedin_url,
        avatar_url: req.avatar_url,
    };
    let profile = state.campus.create_profile(new, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

pub async fn get_profile<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(state.campus.get_profile(id)?.into()))
}

pub async fn update_profile<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let patch = ProfilePatch {
        full_name: req.full_name,
        college: req.college,
        branch: req.branch,
        year: req.year,
        bio: req.bio,
        skills: req.skills,
        interests: req.interests,
        github_username: req.github_username,
        linkedin_url: req.linkedin_url,
        avatar_url: req.avatar_url,
    };
    Ok(Json(state.campus.update_profile(id, patch, Utc::now())?.into()))
}

pub async fn search_profiles<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<ProfileResponse>>> {
    let query = ProfileQuery {
        college: q.college,
        skill: q.skill,
        text: q.q,
        limit: q.limit.unwrap_or(20),
    };
    let profiles = state.campus.search_profiles(query)?;
    Ok(Json(profiles.into_iter().map(Into::into).collect()))
}

pub async fn github_stats<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.campus.github_stats(id).await?))
}

pub async fn discover<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<LimitQuery>,
) -> ApiResult<Json<Vec<DiscoverResponse>>> {
    let candidates = state.campus.discover(id, q.limit)?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

pub async fn leaderboard<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(q): ApiQuery<LeaderboardQuery>,
) -> ApiResult<Json<Vec<LeaderboardEntryResponse>>> {
    let entries = state
        .campus
        .leaderboard(q.college.as_deref(), q.limit)?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use crate::rest::handlers::test_support::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_then_fetch_profile() {
        let app = test_app();
        let (status, created) = app
            .call(
                "POST",
                "/api/profiles",
                Some(json!({
                    "username": "Ada_L",
                    "fullName": "Ada Lovelace",
                    "college": "IIT Delhi",
                    "skills": ["Rust", "rust", "Math"],
                    "githubUsername": "ada",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["username"], "ada_l");
        assert_eq!(created["skills"], json!(["Rust", "Math"]));
        assert_eq!(created["reputation"], 20);

        let id = created["id"].as_str().unwrap();
        let (status, fetched) = app.call("GET", &format!("/api/profiles/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["fullName"], "Ada Lovelace");
        assert_eq!(fetched["githubUsername"], "ada");
    }

    #[tokio::test]
    async fn create_profile_errors() {
        let app = test_app();
        app.profile("taken", &[]).await;

        let (status, body) = app
            .call(
                "POST",
                "/api/profiles",
                Some(json!({"username": "taken", "fullName": "X", "college": "Y"})),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "username already taken");

        let (status, body) = app
            .call(
                "POST",
                "/api/profiles",
                Some(json!({"username": "fresh", "fullName": "X", "college": "  "})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "college is required");

        let (status, body) = app
            .call("POST", "/api/profiles", Some(json!({"username": "fresh"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn get_profile_not_found_and_bad_id() {
        let app = test_app();
        let (status, body) = app
            .call("GET", &format!("/api/profiles/{}", uuid::Uuid::new_v4()), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "profile not found");

        let (status, _) = app.call("GET", "/api/profiles/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn patch_profile_links_linkedin_once() {
        let app = test_app();
        let id = app.profile("linker", &[]).await;

        let (status, body) = app
            .call(
                "PATCH",
                &format!("/api/profiles/{id}"),
                Some(json!({"linkedinUrl": "https://linkedin.com/in/linker", "bio": "hi"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reputation"], 10);
        assert_eq!(body["bio"], "hi");

        let (status, body) = app
            .call(
                "PATCH",
                &format!("/api/profiles/{id}"),
                Some(json!({"linkedinUrl": "ftp://nope"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("linkedinUrl"));
    }

    #[tokio::test]
    async fn search_and_leaderboard() {
        let app = test_app();
        app.profile("rustacean", &["Rust"]).await;
        app.profile("gopher", &["Go"]).await;

        let (status, body) = app.call("GET", "/api/profiles?skill=rust", None).await;
        assert_eq!(status, StatusCode::OK);
        let names: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["rustacean"]);

        let (_, body) = app.call("GET", "/api/profiles?q=GOPH", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = app
            .call("GET", "/api/profiles?college=&skill=&q=", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (status, body) = app.call("GET", "/api/leaderboard?limit=5", None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        // both at zero reputation share first place
        assert_eq!(entries[0]["rank"], 1);
        assert_eq!(entries[1]["rank"], 1);
    }

    #[tokio::test]
    async fn discover_ranks_shared_skills_first() {
        let app = test_app();
        let me = app.profile("meh", &["Rust", "SQL"]).await;
        app.profile("aaa", &[]).await;
        app.profile("zzz", &["rust", "sql"]).await;

        let (status, body) = app
            .call("GET", &format!("/api/users/{me}/discover"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["profile"]["username"], "zzz");
        assert_eq!(list[0]["score"], 2);
        assert_eq!(list[0]["sharedSkills"], json!(["rust", "sql"]));
    }

    #[tokio::test]
    async fn github_stats_requires_a_login() {
        let app = test_app();
        let id = app.profile("nogit", &[]).await;
        let (status, body) = app
            .call("GET", &format!("/api/profiles/{id}/github"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "profile has no github username");
    }
}
