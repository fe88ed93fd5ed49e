//! Session-scoped authentication state.
//!
//! At most one identity is held per browser session, stored together with
//! the bearer token under fixed keys. Derived answers (privilege, ban
//! state) are computed from the held record on every query, never stored:
//! a session held open across a ban's expiry must re-evaluate, not trust a
//! stale flag.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use console_core::error::AppError;
use tower_sessions::Session;

use crate::models::role::{label_qualifies, Role};
use crate::models::user::{is_banned_at, SessionUser, UserPatch};
use crate::services::api_client::ApiClient;
use crate::AppState;

/// Session key for the held identity.
pub const USER_KEY: &str = "auth.user";
/// Session key for the bearer token attached to platform API calls.
pub const TOKEN_KEY: &str = "auth.token";

/// Injectable wall clock so ban-window checks are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Handle over the browser session holding at most one authenticated
/// identity.
#[derive(Clone)]
pub struct AuthSession {
    session: Session,
}

impl AuthSession {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Replace the held identity and token after a successful login.
    pub async fn establish(&self, token: &str, user: &SessionUser) -> Result<(), AppError> {
        self.session
            .insert(TOKEN_KEY, token)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session write failed: {e}")))?;
        self.session
            .insert(USER_KEY, user)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session write failed: {e}")))?;
        Ok(())
    }

    pub async fn token(&self) -> Option<String> {
        self.session.get(TOKEN_KEY).await.unwrap_or(None)
    }

    pub async fn identity(&self) -> Option<SessionUser> {
        self.session.get(USER_KEY).await.unwrap_or(None)
    }

    /// Return the held identity, re-validating a bare token against the
    /// platform when necessary. Validation failure discards the token and
    /// reports emptiness; it never surfaces an error.
    pub async fn restore(&self, api: &ApiClient) -> Option<SessionUser> {
        if let Some(user) = self.identity().await {
            return Some(user);
        }

        let token = self.token().await?;
        match api.current_user(&token).await {
            Ok(user) => {
                if let Err(e) = self.session.insert(USER_KEY, &user).await {
                    tracing::error!("Failed to cache restored identity: {}", e);
                }
                Some(user)
            }
            Err(e) => {
                tracing::debug!("Session restore failed, clearing token: {}", e);
                self.clear().await;
                None
            }
        }
    }

    /// Merge partial profile fields into the held identity; a no-op when
    /// none is held.
    pub async fn update_identity(&self, patch: &UserPatch) -> Result<(), AppError> {
        let Some(mut user) = self.identity().await else {
            return Ok(());
        };
        user.apply_patch(patch);
        self.session
            .insert(USER_KEY, &user)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session write failed: {e}")))
    }

    /// Replace the held identity wholesale (moderation echo on self,
    /// refreshed profile).
    pub async fn replace_identity(&self, user: &SessionUser) -> Result<(), AppError> {
        if self.identity().await.is_none() {
            return Ok(());
        }
        self.session
            .insert(USER_KEY, user)
            .await
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("session write failed: {e}")))
    }

    /// Drop identity, token and everything else held; idempotent.
    pub async fn clear(&self) {
        self.session.clear().await;
    }

    /// OR over the required set: true iff the held identity's tier ranks at
    /// or above at least one member. No identity, or an unknown group
    /// label, never qualifies.
    pub async fn has_privilege(&self, required: &[Role]) -> bool {
        match self.identity().await {
            Some(user) => label_qualifies(&user.group, required),
            None => false,
        }
    }

    /// Ban-window check against the held identity, recomputed at `now`.
    pub async fn is_banned(&self, now: DateTime<Utc>) -> bool {
        match self.identity().await {
            Some(user) => is_banned_at(&user, now),
            None => false,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;
        Ok(AuthSession::new(session))
    }
}

/// The authenticated operator, restored from the session. Rejects to the
/// login page when no identity can be held.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|e| e.into_response())?;
        let auth = AuthSession::new(session);

        match auth.restore(&state.api).await {
            Some(user) => Ok(CurrentUser(user)),
            None => Err(Redirect::to("/login").into_response()),
        }
    }
}
