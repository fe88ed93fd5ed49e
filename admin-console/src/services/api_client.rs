//! Typed client for the platform API the console administers.
//!
//! Every authorized call attaches the session's bearer token; trace context
//! is injected so backend traces join the console's. Failures are
//! normalized to [`ApiError`]: the server's own `message` when it sent one,
//! a generic fallback otherwise. No retries, no timeout policy - a failed
//! request is terminal and needs explicit re-initiation.

use chrono::{DateTime, Utc};
use console_core::observability::TracedClientExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::PlatformSettings;
use crate::models::page::UserPage;
use crate::models::user::SessionUser;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure before any server response arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message}")]
    Server { status: StatusCode, message: String },
}

impl ApiError {
    /// Message fit for the status line shown to the operator.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Could not reach the server. Please try again.".to_string(),
            ApiError::Server { message, .. } => message.clone(),
        }
    }
}

/// Identity + session token returned by a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default)]
pub struct AdminStats {
    pub total_users: u64,
    pub active_today: u64,
    pub active_bans: u64,
}

/// Recipient selection for a bulk email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientsType {
    All,
    Group,
    SpecificUsers,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendEmailRequest {
    pub recipients_type: RecipientsType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_identifiers: Option<Vec<String>>,
    pub subject: String,
    pub message: String,
}

pub struct ApiClient {
    client: Client,
    settings: PlatformSettings,
}

impl ApiClient {
    pub fn new(settings: PlatformSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url, path)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(Self::success(response).await?.json().await?)
    }

    /// Fire-and-forget registration; the backend mails the verification.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/register"))
            .json(&json!({ "name": name, "email": email, "password": password }))
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    /// Validate a token and fetch the identity behind it.
    pub async fn current_user(&self, token: &str) -> Result<SessionUser, ApiError> {
        let response = self
            .client
            .traced_get(&self.url("/user"))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(Self::success(response).await?.json().await?)
    }

    pub async fn resend_verification(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/email/verification-notification"))
            .bearer_auth(token)
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    pub async fn list_users(
        &self,
        token: &str,
        page: u64,
        search: Option<&str>,
    ) -> Result<UserPage, ApiError> {
        let mut query = vec![("page", page.to_string())];
        if let Some(search) = search.filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }

        let response = self
            .client
            .traced_get(&self.url("/users"))
            .query(&query)
            .bearer_auth(token)
            .send()
            .await?;
        Ok(Self::success(response).await?.json().await?)
    }

    pub async fn admin_stats(&self, token: &str) -> Result<AdminStats, ApiError> {
        let response = self
            .client
            .traced_get(&self.url("/admin/stats"))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(Self::success(response).await?.json().await?)
    }

    pub async fn ban_user(
        &self,
        token: &str,
        user_id: i64,
        reason: &str,
        banned_until: Option<DateTime<Utc>>,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_post(&self.url(&format!("/admin/users/{}/ban", user_id)))
            .json(&json!({ "ban_reason": reason, "banned_until": banned_until }))
            .bearer_auth(token)
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    pub async fn unban_user(&self, token: &str, user_id: i64) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_post(&self.url(&format!("/admin/users/{}/unban", user_id)))
            .bearer_auth(token)
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    pub async fn set_group(&self, token: &str, user_id: i64, group: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_put(&self.url(&format!("/admin/users/{}/group", user_id)))
            .json(&json!({ "group": group }))
            .bearer_auth(token)
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    pub async fn send_email(&self, token: &str, request: &SendEmailRequest) -> Result<(), ApiError> {
        let response = self
            .client
            .traced_post(&self.url("/admin/send-email"))
            .json(request)
            .bearer_auth(token)
            .send()
            .await?;
        Self::success(response).await?;
        Ok(())
    }

    async fn success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, "Platform API call failed");
        Err(ApiError::Server {
            status,
            message: extract_message(&body)
                .unwrap_or_else(|| "The server could not complete the request.".to_string()),
        })
    }
}

/// Pull the human-readable message out of an error body, if the server sent
/// one. The platform uses `message`; proxies in front of it use `error`.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))?
        .as_str()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_server_message() {
        assert_eq!(
            extract_message(r#"{"message":"Ban reason is required."}"#).as_deref(),
            Some("Ban reason is required.")
        );
    }

    #[test]
    fn falls_back_to_error_field() {
        assert_eq!(
            extract_message(r#"{"error":"Forbidden"}"#).as_deref(),
            Some("Forbidden")
        );
    }

    #[test]
    fn non_json_bodies_yield_nothing() {
        assert_eq!(extract_message("<html>502</html>"), None);
        assert_eq!(extract_message(""), None);
        assert_eq!(extract_message(r#"{"message":42}"#), None);
    }

    #[test]
    fn recipients_type_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&RecipientsType::SpecificUsers).unwrap(),
            r#""specific_users""#
        );
        assert_eq!(
            serde_json::to_string(&RecipientsType::All).unwrap(),
            r#""all""#
        );
    }

    #[test]
    fn email_request_omits_unused_recipient_fields() {
        let request = SendEmailRequest {
            recipients_type: RecipientsType::All,
            group_name: None,
            user_identifiers: None,
            subject: "Maintenance".to_string(),
            message: "Tonight".to_string(),
        };
        let wire = serde_json::to_value(&request).unwrap();
        assert!(wire.get("group_name").is_none());
        assert!(wire.get("user_identifiers").is_none());
        assert_eq!(wire["recipients_type"], "all");
    }

    #[test]
    fn transport_and_server_errors_render_differently() {
        let server = ApiError::Server {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Ban reason is required.".to_string(),
        };
        assert_eq!(server.user_message(), "Ban reason is required.");
    }
}
