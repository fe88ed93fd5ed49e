pub mod app;
pub mod auth;
pub mod dashboard;
pub mod email;
pub mod metrics;
pub mod users;

use askama::Template;
use axum::response::Html;

use crate::models::role::{label_qualifies, Role};

/// One-line status fragment swapped into the page after an action.
#[derive(Template)]
#[template(path = "partials/status.html")]
pub struct StatusTemplate {
    pub ok: bool,
    pub text: String,
}

pub(crate) fn status_ok(text: impl Into<String>) -> Html<String> {
    let fragment = StatusTemplate {
        ok: true,
        text: text.into(),
    };
    Html(fragment.render().unwrap_or_default())
}

pub(crate) fn status_error(text: impl Into<String>) -> Html<String> {
    let fragment = StatusTemplate {
        ok: false,
        text: text.into(),
    };
    Html(fragment.render().unwrap_or_default())
}

/// First human-readable message out of a validation failure.
pub(crate) fn validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .filter_map(|err| err.message.as_ref())
        .map(|msg| msg.to_string())
        .next()
        .unwrap_or_else(|| "Please check the form and try again.".to_string())
}

/// What the logged-in operator may do, derived from the role hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub can_moderate: bool,
    pub can_manage_groups: bool,
    pub can_email: bool,
}

impl Capabilities {
    pub fn for_group(group: &str) -> Self {
        Self {
            can_moderate: label_qualifies(group, &[Role::Moderator]),
            can_manage_groups: label_qualifies(group, &[Role::Admin]),
            can_email: label_qualifies(group, &[Role::Admin]),
        }
    }
}
