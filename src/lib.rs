// Public API for integration tests and potential library usage

pub mod api;
pub mod audio;
pub mod auth;
pub mod bank;
pub mod config;
pub mod game;
pub mod protocol;
pub mod screen;
pub mod state;
pub mod timer;
pub mod types;
pub mod ws;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use auth::AuthConfig;
use state::AppState;

/// All HTTP and WebSocket routes
pub fn router(state: Arc<AppState>, auth_config: Arc<AuthConfig>) -> Router {
    // Protected host routes (with HTTP Basic Auth)
    let host_routes = Router::new()
        .route("/host.html", get(auth::serve_host))
        .route("/api/host/characters", post(api::register_character))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::host_auth_middleware,
        ));

    // Host sockets need the same credentials as the host page
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::host_ws_auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/characters", get(api::list_characters))
        .route("/api/characters/{id}", get(api::get_character))
        .route("/api/state", get(api::get_state));

    Router::new()
        .merge(ws_routes)
        .merge(host_routes)
        .merge(api_routes)
        .fallback_service(ServeDir::new("static"))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
