use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use console_core::middleware::tracing::request_id_middleware;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    auth::{
        login_handler, login_page, logout_handler, register_handler, register_page,
        resend_verification_handler,
    },
    dashboard::{dashboard_handler, stats_fragment, users_fragment},
    email::{email_page, send_email_handler},
    users::{ban_handler, group_handler, open_user_modal, unban_handler},
};
use crate::middleware::{auth::auth_middleware, auth::staff_middleware, metrics::metrics_middleware};
use crate::AppState;

pub fn build_router(state: AppState) -> Router {
    // Session setup
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let staff = from_fn_with_state(state.clone(), staff_middleware);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(crate::handlers::metrics::metrics))
        .route("/login", get(login_page).post(login_handler))
        .route("/register", get(register_page).post(register_handler))
        .route("/logout", get(logout_handler))
        .route(
            "/verification/resend",
            post(resend_verification_handler).layer(from_fn(auth_middleware)),
        )
        .route("/dashboard", get(dashboard_handler).layer(staff.clone()))
        .route(
            "/dashboard/users",
            get(users_fragment).layer(staff.clone()),
        )
        .route(
            "/dashboard/stats",
            get(stats_fragment).layer(staff.clone()),
        )
        .route(
            "/admin/users/modal",
            post(open_user_modal).layer(staff.clone()),
        )
        .route(
            "/admin/users/:id/ban",
            post(ban_handler).layer(staff.clone()),
        )
        .route(
            "/admin/users/:id/unban",
            post(unban_handler).layer(staff.clone()),
        )
        .route(
            "/admin/users/:id/group",
            put(group_handler).layer(staff.clone()),
        )
        .route("/admin/email", get(email_page).layer(staff.clone()))
        .route(
            "/admin/email/send",
            post(send_email_handler).layer(staff),
        )
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
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
