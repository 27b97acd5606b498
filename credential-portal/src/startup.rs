use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post},
};
use portal_core::middleware::tracing::request_id_middleware;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::AppState;
use crate::handlers::{
    account::{create_password_handler, create_two_factor_handler},
    app::{
        dismiss_notification_handler, health_check, index, navigate_handler, portal_state_handler,
        qr_handler,
    },
    auth::{login_handler, logout_handler},
    renew::renew_password_handler,
};
use crate::services::metrics::metrics_middleware;

pub fn build_router(state: AppState) -> Router {
    // Session setup: in-memory only, nothing survives a restart
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/state", get(portal_state_handler))
        .route("/navigate", post(navigate_handler))
        .route("/account/password", post(create_password_handler))
        .route("/account/two-factor", post(create_two_factor_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/renew", post(renew_password_handler))
        .route("/notifications/:id", delete(dismiss_notification_handler))
        .route("/qr/:slot", get(qr_handler))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        // Add tracing layer
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Add tracing middleware for request_id
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
