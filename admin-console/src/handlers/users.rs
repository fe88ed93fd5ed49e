//! Selected-user detail modal and its moderation actions.
//!
//! The selected record travels with each modal request and is patched in
//! place after a successful action; nothing is refetched until the modal
//! closes. Action failure re-renders the modal in its current tab with the
//! server's message and the record unchanged.

use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use validator::Validate;

use super::{status_error, validation_message, Capabilities};
use crate::models::role::{Role, RoleError};
use crate::models::user::{is_banned_at, SessionUser};
use crate::session::{AuthSession, CurrentUser};
use crate::AppState;

pub const TAB_INFO: &str = "info";
pub const TAB_MODERATION: &str = "moderation";
pub const TAB_PERMISSIONS: &str = "permissions";

/// Status line rendered inside the modal.
pub struct StatusLine {
    pub ok: bool,
    pub text: String,
}

/// Display-ready projection of the selected user.
pub struct ModalView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub group: String,
    pub bio: String,
    pub nationality: String,
    pub verified: bool,
    pub public_profile: bool,
    pub banned: bool,
    pub banned_until_label: String,
    pub ban_reason: String,
    pub user_json: String,
}

impl ModalView {
    fn new(user: &SessionUser, now: DateTime<Utc>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            group: user.group.clone(),
            bio: user.bio.clone().unwrap_or_else(|| "-".to_string()),
            nationality: user.nationality.clone().unwrap_or_else(|| "-".to_string()),
            verified: !user.needs_verification(),
            public_profile: user.public_profile,
            banned: is_banned_at(user, now),
            banned_until_label: user
                .banned_until
                .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                .unwrap_or_else(|| "-".to_string()),
            ban_reason: user.ban_reason.clone().unwrap_or_else(|| "-".to_string()),
            user_json: serde_json::to_string(user).unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "partials/user_modal.html")]
pub struct UserModalTemplate {
    pub view: ModalView,
    pub tab: String,
    pub caps: Capabilities,
    pub message: Option<StatusLine>,
    pub groups: Vec<String>,
}

fn render_modal(
    user: &SessionUser,
    tab: &str,
    caps: Capabilities,
    message: Option<StatusLine>,
    now: DateTime<Utc>,
) -> Response {
    // Tabs the operator cannot use fall back to the info tab
    let tab = match tab {
        TAB_MODERATION if caps.can_moderate => TAB_MODERATION,
        TAB_PERMISSIONS if caps.can_manage_groups => TAB_PERMISSIONS,
        _ => TAB_INFO,
    };

    UserModalTemplate {
        view: ModalView::new(user, now),
        tab: tab.to_string(),
        caps,
        message,
        groups: Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
    }
    .into_response()
}

fn parse_selected(user_json: &str) -> Result<SessionUser, Response> {
    serde_json::from_str(user_json).map_err(|e| {
        tracing::warn!("Rejected malformed selected-user payload: {}", e);
        (
            StatusCode::BAD_REQUEST,
            status_error("The selected user could not be read. Close and reopen the details."),
        )
            .into_response()
    })
}

/// `datetime-local` inputs submit naive timestamps; an empty field means no
/// end date.
fn parse_banned_until(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, String> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| "The ban end date could not be read.".to_string())
}

#[derive(Deserialize)]
pub struct ModalForm {
    pub user: String,
    pub tab: Option<String>,
}

pub async fn open_user_modal(
    State(state): State<AppState>,
    CurrentUser(operator): CurrentUser,
    Form(form): Form<ModalForm>,
) -> Response {
    let selected = match parse_selected(&form.user) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };

    render_modal(
        &selected,
        form.tab.as_deref().unwrap_or(TAB_INFO),
        Capabilities::for_group(&operator.group),
        None,
        state.clock.now(),
    )
}

#[derive(Deserialize, Validate)]
pub struct BanForm {
    pub user: String,
    #[validate(length(min = 1, message = "Ban reason is required."))]
    pub ban_reason: String,
    pub banned_until: Option<String>,
}

pub async fn ban_handler(
    State(state): State<AppState>,
    CurrentUser(operator): CurrentUser,
    auth: AuthSession,
    Path(user_id): Path<i64>,
    Form(form): Form<BanForm>,
) -> Response {
    let caps = Capabilities::for_group(&operator.group);
    if !caps.can_moderate {
        return (
            StatusCode::FORBIDDEN,
            status_error("You are not allowed to moderate users."),
        )
            .into_response();
    }

    let mut selected = match parse_selected(&form.user) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };
    let now = state.clock.now();

    // Validation failures never reach the network
    if let Err(errors) = form.validate() {
        let message = StatusLine {
            ok: false,
            text: validation_message(&errors),
        };
        return render_modal(&selected, TAB_MODERATION, caps, Some(message), now);
    }
    let banned_until = match parse_banned_until(form.banned_until.as_deref()) {
        Ok(until) => until,
        Err(text) => {
            return render_modal(
                &selected,
                TAB_MODERATION,
                caps,
                Some(StatusLine { ok: false, text }),
                now,
            );
        }
    };

    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state
        .api
        .ban_user(&token, user_id, &form.ban_reason, banned_until)
        .await
    {
        Ok(()) => {
            selected.apply_ban(&form.ban_reason, banned_until);
            echo_to_session(&auth, &operator, &selected).await;
            tracing::info!(target_id = user_id, by = operator.id, "User banned");
            let message = StatusLine {
                ok: true,
                text: "User banned.".to_string(),
            };
            render_modal(&selected, TAB_MODERATION, caps, Some(message), now)
        }
        Err(e) => {
            let message = StatusLine {
                ok: false,
                text: e.user_message(),
            };
            render_modal(&selected, TAB_MODERATION, caps, Some(message), now)
        }
    }
}

#[derive(Deserialize)]
pub struct UnbanForm {
    pub user: String,
}

pub async fn unban_handler(
    State(state): State<AppState>,
    CurrentUser(operator): CurrentUser,
    auth: AuthSession,
    Path(user_id): Path<i64>,
    Form(form): Form<UnbanForm>,
) -> Response {
    let caps = Capabilities::for_group(&operator.group);
    if !caps.can_moderate {
        return (
            StatusCode::FORBIDDEN,
            status_error("You are not allowed to moderate users."),
        )
            .into_response();
    }

    let mut selected = match parse_selected(&form.user) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };
    let now = state.clock.now();

    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state.api.unban_user(&token, user_id).await {
        Ok(()) => {
            selected.apply_unban();
            echo_to_session(&auth, &operator, &selected).await;
            tracing::info!(target_id = user_id, by = operator.id, "Ban lifted");
            let message = StatusLine {
                ok: true,
                text: "Ban lifted.".to_string(),
            };
            render_modal(&selected, TAB_MODERATION, caps, Some(message), now)
        }
        Err(e) => {
            let message = StatusLine {
                ok: false,
                text: e.user_message(),
            };
            render_modal(&selected, TAB_MODERATION, caps, Some(message), now)
        }
    }
}

#[derive(Deserialize)]
pub struct GroupForm {
    pub user: String,
    pub group: String,
}

pub async fn group_handler(
    State(state): State<AppState>,
    CurrentUser(operator): CurrentUser,
    auth: AuthSession,
    Path(user_id): Path<i64>,
    Form(form): Form<GroupForm>,
) -> Response {
    let caps = Capabilities::for_group(&operator.group);
    if !caps.can_manage_groups {
        return (
            StatusCode::FORBIDDEN,
            status_error("You are not allowed to change groups."),
        )
            .into_response();
    }

    let mut selected = match parse_selected(&form.user) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };
    let now = state.clock.now();

    // Only labels from the closed hierarchy go to the backend
    if let Err(RoleError::Unknown(label)) = Role::from_label(&form.group) {
        let message = StatusLine {
            ok: false,
            text: format!("\"{label}\" is not a known group."),
        };
        return render_modal(&selected, TAB_PERMISSIONS, caps, Some(message), now);
    }

    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state.api.set_group(&token, user_id, &form.group).await {
        Ok(()) => {
            selected.apply_group(&form.group);
            echo_to_session(&auth, &operator, &selected).await;
            tracing::info!(
                target_id = user_id,
                by = operator.id,
                group = %form.group,
                "Group updated"
            );
            let message = StatusLine {
                ok: true,
                text: "Group updated.".to_string(),
            };
            render_modal(&selected, TAB_PERMISSIONS, caps, Some(message), now)
        }
        Err(e) => {
            let message = StatusLine {
                ok: false,
                text: e.user_message(),
            };
            render_modal(&selected, TAB_PERMISSIONS, caps, Some(message), now)
        }
    }
}

/// When an operator moderates their own account, the held session identity
/// gets the same echo as the selected record.
async fn echo_to_session(auth: &AuthSession, operator: &SessionUser, selected: &SessionUser) {
    if operator.id == selected.id {
        if let Err(e) = auth.replace_identity(selected).await {
            tracing::error!("Failed to echo moderation to own session: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn empty_banned_until_means_no_end_date() {
        assert_eq!(parse_banned_until(None), Ok(None));
        assert_eq!(parse_banned_until(Some("")), Ok(None));
        assert_eq!(parse_banned_until(Some("   ")), Ok(None));
    }

    #[test]
    fn datetime_local_values_parse_as_utc() {
        let parsed = parse_banned_until(Some("2026-09-01T18:30")).unwrap();
        assert_eq!(
            parsed,
            Some(Utc.with_ymd_and_hms(2026, 9, 1, 18, 30, 0).unwrap())
        );
    }

    #[test]
    fn garbage_banned_until_is_rejected() {
        assert!(parse_banned_until(Some("next tuesday")).is_err());
    }

    #[test]
    fn ban_form_requires_a_reason() {
        let form = BanForm {
            user: "{}".to_string(),
            ban_reason: String::new(),
            banned_until: None,
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Ban reason is required.");
    }
}
