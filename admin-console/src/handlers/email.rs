//! Bulk email composition. The console only validates and forwards; the
//! backend owns delivery.

use askama::Template;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use validator::Validate;

use super::{status_error, status_ok, validation_message, Capabilities};
use crate::services::api_client::{RecipientsType, SendEmailRequest};
use crate::session::{AuthSession, CurrentUser};
use crate::AppState;

#[derive(Template)]
#[template(path = "email.html")]
pub struct EmailTemplate {
    pub name: String,
}

pub async fn email_page(CurrentUser(operator): CurrentUser) -> Response {
    if !Capabilities::for_group(&operator.group).can_email {
        return (
            StatusCode::FORBIDDEN,
            "You are not allowed to send platform email.",
        )
            .into_response();
    }

    EmailTemplate {
        name: operator.name,
    }
    .into_response()
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailForm {
    pub recipients_type: String,
    pub group_name: Option<String>,
    pub user_identifiers: Option<String>,
    #[validate(length(min = 1, message = "Subject is required."))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required."))]
    pub message: String,
}

impl EmailForm {
    /// Turn the raw form into a wire request, or a message explaining what
    /// is missing. Runs entirely before any network call.
    fn into_request(self) -> Result<SendEmailRequest, String> {
        if let Err(errors) = self.validate() {
            return Err(validation_message(&errors));
        }

        let (recipients_type, group_name, user_identifiers) =
            match self.recipients_type.as_str() {
                "all" => (RecipientsType::All, None, None),
                "group" => {
                    let group = self
                        .group_name
                        .as_deref()
                        .map(str::trim)
                        .filter(|g| !g.is_empty())
                        .ok_or_else(|| "Pick a group to send to.".to_string())?;
                    (RecipientsType::Group, Some(group.to_string()), None)
                }
                "specific_users" => {
                    let identifiers: Vec<String> = self
                        .user_identifiers
                        .as_deref()
                        .unwrap_or_default()
                        .split(|c| c == ',' || c == '\n')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect();
                    if identifiers.is_empty() {
                        return Err("List at least one recipient.".to_string());
                    }
                    (RecipientsType::SpecificUsers, None, Some(identifiers))
                }
                _ => return Err("Choose who should receive this email.".to_string()),
            };

        Ok(SendEmailRequest {
            recipients_type,
            group_name,
            user_identifiers,
            subject: self.subject,
            message: self.message,
        })
    }
}

pub async fn send_email_handler(
    State(state): State<AppState>,
    CurrentUser(operator): CurrentUser,
    auth: AuthSession,
    Form(form): Form<EmailForm>,
) -> Response {
    if !Capabilities::for_group(&operator.group).can_email {
        return (
            StatusCode::FORBIDDEN,
            status_error("You are not allowed to send platform email."),
        )
            .into_response();
    }

    let request = match form.into_request() {
        Ok(request) => request,
        Err(text) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, status_error(text)).into_response();
        }
    };

    let Some(token) = auth.token().await else {
        return Redirect::to("/login").into_response();
    };

    match state.api.send_email(&token, &request).await {
        Ok(()) => {
            tracing::info!(
                by = operator.id,
                recipients = ?request.recipients_type,
                "Bulk email accepted"
            );
            status_ok("Email handed off for delivery.").into_response()
        }
        Err(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            status_error(e.user_message()),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_form() -> EmailForm {
        EmailForm {
            recipients_type: "all".to_string(),
            group_name: None,
            user_identifiers: None,
            subject: "Maintenance window".to_string(),
            message: "Back at 04:00 UTC.".to_string(),
        }
    }

    #[test]
    fn all_recipients_needs_no_extras() {
        let request = base_form().into_request().unwrap();
        assert_eq!(request.recipients_type, RecipientsType::All);
        assert_eq!(request.group_name, None);
        assert_eq!(request.user_identifiers, None);
    }

    #[test]
    fn missing_subject_is_caught_before_any_request() {
        let mut form = base_form();
        form.subject = String::new();
        assert_eq!(form.into_request().unwrap_err(), "Subject is required.");
    }

    #[test]
    fn group_mode_requires_a_group() {
        let mut form = base_form();
        form.recipients_type = "group".to_string();
        assert!(form.into_request().is_err());

        let mut form = base_form();
        form.recipients_type = "group".to_string();
        form.group_name = Some("Premium".to_string());
        let request = form.into_request().unwrap();
        assert_eq!(request.recipients_type, RecipientsType::Group);
        assert_eq!(request.group_name.as_deref(), Some("Premium"));
    }

    #[test]
    fn specific_users_mode_splits_and_trims_identifiers() {
        let mut form = base_form();
        form.recipients_type = "specific_users".to_string();
        form.user_identifiers = Some("alice@example.com, bob@example.com\n carol ".to_string());
        let request = form.into_request().unwrap();
        assert_eq!(
            request.user_identifiers,
            Some(vec![
                "alice@example.com".to_string(),
                "bob@example.com".to_string(),
                "carol".to_string(),
            ])
        );
    }

    #[test]
    fn specific_users_mode_rejects_an_empty_list() {
        let mut form = base_form();
        form.recipients_type = "specific_users".to_string();
        form.user_identifiers = Some(" ,\n".to_string());
        assert_eq!(
            form.into_request().unwrap_err(),
            "List at least one recipient."
        );
    }

    #[test]
    fn unknown_recipient_mode_is_rejected() {
        let mut form = base_form();
        form.recipients_type = "everyone".to_string();
        assert!(form.into_request().is_err());
    }
}
