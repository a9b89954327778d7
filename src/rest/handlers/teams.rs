use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    rest::{
        error::{ApiJson, ApiPath, ApiQuery, ApiResult},
        models::{
            ActorQuery, ApplicationResponse, ApplyRequest, CreateTeamRequest, InviteRequest,
            MembershipResponse, RespondRequest, RoleRequest, TeamDetailResponse, TeamResponse,
            TeamSummaryResponse, TeamsQuery, UpdateTeamRequest, UserBody,
        },
        AppState,
    },
    service::{NewTeam, TeamPatch},
    storage::Storage,
};

pub async fn create_team<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiJson(req): ApiJson<CreateTeamRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = NewTeam {
        owner_id: req.owner_id,
        name: req.name,
        description: req.description,
        required_skills: req.required_skills,
        max_members: req.max_members,
        is_open: req.is_open,
    };
    let team = state.campus.create_team(new, Utc::now())?;
    Ok((StatusCode::CREATED, Json(TeamResponse::from(team))))
}

pub async fn list_teams<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiQuery(q): ApiQuery<TeamsQuery>,
) -> ApiResult<Json<Vec<TeamSummaryResponse>>> {
    let teams = state.campus.list_teams(q.open, q.skill, q.limit)?;
    Ok(Json(teams.into_iter().map(Into::into).collect()))
}

pub async fn team_detail<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<TeamDetailResponse>> {
    Ok(Json(state.campus.team_detail(id)?.into()))
}

pub async fn update_team<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTeamRequest>,
) -> ApiResult<Json<TeamResponse>> {
    let patch = TeamPatch {
        name: req.name,
        description: req.description,
        required_skills: req.required_skills,
        max_members: req.max_members,
        is_open: req.is_open,
    };
    Ok(Json(state.campus.update_team(id, req.actor_id, patch)?.into()))
}

pub async fn apply<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let application = state
        .campus
        .apply_to_team(team_id, req.user_id, req.message, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

pub async fn invite<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<InviteRequest>,
) -> ApiResult<impl IntoResponse> {
    let invite = state
        .campus
        .invite_to_team(team_id, req.actor_id, req.user_id, Utc::now())?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(invite))))
}

pub async fn pending_applications<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiQuery(q): ApiQuery<ActorQuery>,
) -> ApiResult<Json<Vec<ApplicationResponse>>> {
    let pending = state.campus.pending_applications(team_id, q.actor_id)?;
    Ok(Json(pending.into_iter().map(Into::into).collect()))
}

pub async fn respond<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(application_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RespondRequest>,
) -> ApiResult<Json<ApplicationResponse>> {
    let answered =
        state
            .campus
            .respond_to_application(application_id, req.actor_id, req.approve, Utc::now())?;
    Ok(Json(answered.into()))
}

pub async fn leave<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath(team_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UserBody>,
) -> ApiResult<StatusCode> {
    state.campus.leave_team(team_id, req.user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_member<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath((team_id, user_id)): ApiPath<(Uuid, Uuid)>,
    ApiQuery(q): ApiQuery<ActorQuery>,
) -> ApiResult<StatusCode> {
    state.campus.remove_member(team_id, q.actor_id, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_role<S: Storage + Clone + Send + Sync + 'static>(
    State(state): State<AppState<S>>,
    ApiPath((team_id, user_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<RoleRequest>,
) -> ApiResult<Json<MembershipResponse>> {
    let member = state
        .campus
        .set_member_role(team_id, req.actor_id, user_id, req.role)?;
    Ok(Json(member.into()))
}
