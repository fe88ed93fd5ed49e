use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use serde::Deserialize;

use super::{status_error, Capabilities};
use crate::models::page::{page_in_bounds, PageMeta};
use crate::models::user::is_banned_at;
use crate::services::api_client::AdminStats;
use crate::session::{AuthSession, CurrentUser};
use crate::AppState;

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub name: String,
    pub group: String,
    pub needs_verification: bool,
    pub banned: bool,
    pub caps: Capabilities,
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
    auth: AuthSession,
    CurrentUser(user): CurrentUser,
) -> impl IntoResponse {
    DashboardTemplate {
        needs_verification: user.needs_verification(),
        // Recomputed on every page load so an expired ban reads as lifted
        banned: auth.is_banned(state.clock.now()).await,
        caps: Capabilities::for_group(&user.group),
        name: user.name,
        group: user.group,
    }
}

#[derive(Template)]
#[template(path = "partials/stats.html")]
pub struct StatsTemplate {
    pub stats: AdminStats,
}

pub async fn stats_fragment(State(state): State<AppState>, auth: AuthSession) -> impl IntoResponse {
    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state.api.admin_stats(&token).await {
        Ok(stats) => StatsTemplate { stats }.into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch admin stats: {}", e);
            status_error(e.user_message()).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    pub page: Option<u64>,
    /// Last page as of the previous render; out-of-range requests are
    /// rejected against it before any network call.
    pub last_page: Option<u64>,
}

pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub group: String,
    pub banned: bool,
    pub user_json: String,
}

#[derive(Template)]
#[template(path = "partials/user_table.html")]
pub struct UserTableTemplate {
    pub rows: Vec<UserRow>,
    pub meta: PageMeta,
    pub search: String,
}

pub async fn users_fragment(
    State(state): State<AppState>,
    auth: AuthSession,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    let page = params.page.unwrap_or(1);
    if !page_in_bounds(page, params.last_page) {
        return (
            StatusCode::BAD_REQUEST,
            status_error("That page is out of range."),
        )
            .into_response();
    }

    let search = params.search.unwrap_or_default();
    match state.api.list_users(&token, page, Some(&search)).await {
        Ok(user_page) => {
            let now = state.clock.now();
            let rows = user_page
                .data
                .into_iter()
                .map(|user| UserRow {
                    id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    group: user.group.clone(),
                    banned: is_banned_at(&user, now),
                    user_json: serde_json::to_string(&user).unwrap_or_default(),
                })
                .collect();

            UserTableTemplate {
                rows,
                meta: user_page.meta,
                search,
            }
            .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch user list: {}", e);
            status_error(e.user_message()).into_response()
        }
    }
}
