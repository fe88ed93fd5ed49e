use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::role::Role;
use crate::session::AuthSession;
use crate::AppState;

/// Staff floor for the dashboard: Support and every tier above it.
pub const STAFF_ROLES: &[Role] = &[Role::Support];

/// Anonymous requests to protected pages go to the login form.
pub async fn auth_middleware(
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth = AuthSession::new(session);

    if auth.token().await.is_none() {
        return Ok(Redirect::to("/login").into_response());
    }

    Ok(next.run(request).await)
}

/// Dashboard guard: restores the session identity (re-validating a bare
/// token against the platform) and requires the staff floor. Anonymous
/// callers are sent to login; authenticated callers below the floor get a
/// 403 page.
pub async fn staff_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request<Body>,
    next: Next,
) -> Response {
    let auth = AuthSession::new(session);

    let Some(user) = auth.restore(&state.api).await else {
        return Redirect::to("/login").into_response();
    };

    if !auth.has_privilege(STAFF_ROLES).await {
        tracing::warn!(user_id = user.id, group = %user.group, "Dashboard access denied");
        return (
            StatusCode::FORBIDDEN,
            "You do not have access to the admin dashboard.",
        )
            .into_response();
    }

    next.run(request).await
}
