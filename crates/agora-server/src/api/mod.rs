//! HTTP surface: one route per remote procedure.
//!
//! Mutating procedures are POST/PUT/DELETE, queries are GET, all
//! synchronous request/response.  Near-real-time behavior is achieved by
//! client polling; the server never pushes.

mod admin;
mod calls;
mod groups;
mod messaging;
mod profiles;
mod social;

use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use agora_store::{CallBoard, Groups, Messaging, ProfileDirectory, SocialGraph};

use crate::config::ServerConfig;
use crate::rate_limit::{rate_limit_middleware, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub social: SocialGraph,
    pub messaging: Messaging,
    pub groups: Groups,
    pub calls: CallBoard,
    pub directory: ProfileDirectory,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_per_sec, config.rate_limit_burst);
        Self {
            social: SocialGraph::new(),
            messaging: Messaging::new(),
            groups: Groups::new(),
            calls: CallBoard::new(),
            directory: ProfileDirectory::new(),
            rate_limiter,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/info", get(server_info))
        // Social graph
        .route("/friends/requests", post(social::send_friend_request))
        .route("/friends/requests/pending", get(social::pending_requests))
        .route("/friends/requests/respond", post(social::respond_to_request))
        .route("/friends/status/:user", get(social::request_status))
        .route("/friends/:user", get(social::friends_of))
        .route("/follows", post(social::follow))
        .route("/follows/:user", delete(social::unfollow))
        .route("/users/:user/followers", get(social::followers_of))
        .route("/users/:user/following", get(social::following_of))
        // Direct messaging
        .route("/messages", post(messaging::send_message))
        .route("/messages/unread-count", get(messaging::unread_count))
        .route("/conversations", get(messaging::conversations))
        .route("/conversations/:other", get(messaging::conversation))
        .route("/conversations/:other/read", post(messaging::mark_read))
        // Groups
        .route("/groups", post(groups::create_group).get(groups::my_groups))
        .route(
            "/groups/:id",
            get(groups::get_group).delete(groups::delete_group),
        )
        .route("/groups/:id/members", post(groups::add_member))
        .route("/groups/:id/members/:member", delete(groups::remove_member))
        .route(
            "/groups/:id/messages",
            post(groups::send_group_message).get(groups::group_messages),
        )
        // Call signaling
        .route(
            "/calls/:call_id/offer",
            post(calls::store_offer).get(calls::get_offer),
        )
        .route(
            "/calls/:call_id/answer",
            post(calls::store_answer).get(calls::get_answer),
        )
        .route("/calls/:call_id/candidates", post(calls::add_candidate))
        .route(
            "/calls/:call_id/candidates/:contributor",
            get(calls::candidates_from),
        )
        .route("/calls/:call_id", delete(calls::end_call))
        // Profile directory
        .route("/profile", put(profiles::upsert_profile))
        .route("/profiles/:user", get(profiles::get_profile))
        // Admin
        .route("/admin/status", get(admin::status))
        .route("/admin/groups/:id", delete(admin::delete_group))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ServerInfoResponse {
    name: String,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn server_info(State(state): State<AppState>) -> Json<ServerInfoResponse> {
    Json(ServerInfoResponse {
        name: state.config.instance_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
