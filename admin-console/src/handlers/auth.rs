use askama::Template;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect},
    Form,
};
use serde::Deserialize;

use super::{status_error, status_ok};
use crate::session::AuthSession;
use crate::AppState;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {}

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

pub async fn login_page() -> impl IntoResponse {
    LoginTemplate {}
}

pub async fn register_page() -> impl IntoResponse {
    RegisterTemplate {}
}

pub async fn login_handler(
    State(state): State<AppState>,
    auth: AuthSession,
    Form(payload): Form<LoginForm>,
) -> impl IntoResponse {
    match state.api.login(&payload.email, &payload.password).await {
        Ok(response) => {
            if let Err(e) = auth.establish(&response.token, &response.user).await {
                tracing::error!("Failed to persist session after login: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    status_error("Something went wrong. Please try again."),
                )
                    .into_response();
            }

            tracing::info!(
                user_id = response.user.id,
                group = %response.user.group,
                "User logged in successfully"
            );

            // HTMX redirect to the dashboard
            let mut headers = HeaderMap::new();
            headers.insert("HX-Redirect", "/dashboard".parse().unwrap());
            (StatusCode::OK, headers, "").into_response()
        }
        Err(e) => {
            // Failed login leaves the held session untouched
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                status_error(e.user_message()),
            )
                .into_response()
        }
    }
}

pub async fn register_handler(
    State(state): State<AppState>,
    Form(payload): Form<RegisterForm>,
) -> impl IntoResponse {
    match state
        .api
        .register(&payload.name, &payload.email, &payload.password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            status_ok("Registration successful! Please check your email."),
        )
            .into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            status_error(e.user_message()),
        )
            .into_response(),
    }
}

pub async fn logout_handler(auth: AuthSession) -> impl IntoResponse {
    auth.clear().await;
    tracing::info!("Session cleared on logout");

    let mut headers = HeaderMap::new();
    headers.insert("HX-Redirect", "/".parse().unwrap());
    (StatusCode::OK, headers, "").into_response()
}

/// Ask the platform to resend the verification mail for the held identity.
pub async fn resend_verification_handler(
    State(state): State<AppState>,
    auth: AuthSession,
) -> impl IntoResponse {
    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state.api.resend_verification(&token).await {
        Ok(()) => status_ok("Verification email sent.").into_response(),
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            status_error(e.user_message()),
        )
            .into_response(),
    }
}
