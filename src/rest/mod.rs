use std::{net::SocketAddr, time::Instant};

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
    Router,
};

use crate::{service::Campus, storage::Storage};

mod error;
mod handlers;
pub(crate) mod models;

use handlers::{chat, community, feed, health, matching, not_found, profiles, teams};

#[derive(Clone)]
pub struct AppState<S: Storage> {
    pub campus: Campus<S>,
    pub started_at: std::time::SystemTime,
}

pub fn router<S: Storage + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::<S>))
        .route(
            "/api/profiles",
            post(profiles::create_profile::<S>).get(profiles::search_profiles::<S>),
        )
        .route(
            "/api/profiles/:id",
            get(profiles::get_profile::<S>).patch(profiles::update_profile::<S>),
        )
        .route("/api/profiles/:id/github", get(profiles::github_stats::<S>))
        .route("/api/leaderboard", get(profiles::leaderboard::<S>))
        .route("/api/users/:id/discover", get(profiles::discover::<S>))
        .route("/api/swipes", post(matching::swipe::<S>))
        .route("/api/users/:id/matches", get(matching::list_matches::<S>))
        .route("/api/matches/:id", delete(matching::unmatch::<S>))
        .route(
            "/api/matches/:id/messages",
            post(chat::send_message::<S>).get(chat::list_messages::<S>),
        )
        .route("/api/matches/:id/read", post(chat::mark_read::<S>))
        .route(
            "/api/teams",
            post(teams::create_team::<S>).get(teams::list_teams::<S>),
        )
        .route(
            "/api/teams/:id",
            get(teams::team_detail::<S>).patch(teams::update_team::<S>),
        )
        .route("/api/teams/:id/apply", post(teams::apply::<S>))
        .route("/api/teams/:id/invite", post(teams::invite::<S>))
        .route(
            "/api/teams/:id/applications",
            get(teams::pending_applications::<S>),
        )
        .route("/api/applications/:id/respond", post(teams::respond::<S>))
        .route("/api/teams/:id/leave", post(teams::leave::<S>))
        .route(
            "/api/teams/:id/members/:user_id",
            delete(teams::remove_member::<S>),
        )
        .route(
            "/api/teams/:id/members/:user_id/role",
            post(teams::set_role::<S>),
        )
        .route(
            "/api/stars",
            post(community::give_star::<S>).delete(community::remove_star::<S>),
        )
        .route(
            "/api/blocks",
            post(community::block::<S>).delete(community::unblock::<S>),
        )
        .route("/api/users/:id/blocks", get(community::blocked::<S>))
        .route("/api/reports", post(community::report::<S>))
        .route(
            "/api/users/:id/notifications",
            get(feed::notifications::<S>),
        )
        .route(
            "/api/notifications/:id/read",
            post(feed::mark_notification_read::<S>),
        )
        .route(
            "/api/users/:id/notifications/read-all",
            post(feed::mark_all_read::<S>),
        )
        .route("/api/users/:id/counts", get(feed::counts::<S>))
        .route("/api/users/:id/activity", get(feed::activity::<S>))
        .route("/api/users/:id/reputation", get(feed::reputation::<S>))
        .fallback(not_found)
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

pub async fn serve<S: Storage + Clone + Send + Sync + 'static>(
    addr: SocketAddr,
    campus: Campus<S>,
    shutdown: tokio_util::sync::CancellationToken,
) -> anyhow::Result<()> {
    log::info!("🌐 REST service on http://{}", addr);

    let app = router(AppState {
        campus,
        started_at: std::time::SystemTime::now(),
    });

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            log::info!("🛑 REST shutdown requested");
        })
        .await?;
    log::info!("👋 REST server exited");
    Ok(())
}
