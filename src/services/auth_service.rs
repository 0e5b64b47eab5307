//! Seam to the authentication subsystem.
//!
//! Two implementations exist: an embedded one backed by the local database
//! and one that talks to a hosted GoTrue server.

use thiserror::Error;
use tokio::sync::broadcast;
use url::Url;

use crate::clients::SupabaseError;
use crate::domain::events::AuthEvent;
use crate::models::{OAuthProvider, Session, SignUpOutcome};

/// Errors specific to authentication operations. The display text is shown to
/// the user as-is.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0} sign-in is not available with this backend")]
    UnsupportedProvider(String),

    #[error("Invalid sign-in callback: {0}")]
    InvalidCallback(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

impl From<SupabaseError> for AuthError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Timeout => Self::Network("request timed out".to_string()),
            SupabaseError::Network(msg) => Self::Network(msg),
            SupabaseError::Api { code, .. }
                if matches!(code.as_deref(), Some("invalid_credentials" | "invalid_grant")) =>
            {
                Self::InvalidCredentials
            }
            SupabaseError::Api { message, .. } => Self::Rejected(message),
            SupabaseError::Decode(msg) | SupabaseError::Url(msg) => Self::Internal(msg),
        }
    }
}

/// Identity provider operations. Implementations broadcast only the changes
/// nobody asked for (token refresh, revocation); results of explicit calls are
/// returned to the caller.
#[async_trait::async_trait]
pub trait AuthBackend: Send + Sync {
    /// Picks up the session left by a previous run, refreshing it when needed.
    async fn restore_session(&self) -> Result<Option<Session>, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] when the email/password pair is rejected.
    async fn sign_in_with_password(&self, email: &str, password: &str)
    -> Result<Session, AuthError>;

    /// Where to send the user to sign in with an external provider.
    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<Url, AuthError>;

    /// Finishes an OAuth sign-in from the URL the provider redirected back to.
    async fn complete_oauth(&self, callback: &Url) -> Result<Session, AuthError>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError>;

    /// Exchanges a refresh token for a new session and announces it as
    /// [`AuthEvent::TokenRefreshed`].
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError>;

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gotrue_errors_keep_their_message() {
        let err = AuthError::from(SupabaseError::Api {
            status: 400,
            code: Some("invalid_credentials".to_string()),
            message: "Invalid login credentials".to_string(),
        });
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid login credentials");

        let err = AuthError::from(SupabaseError::Api {
            status: 422,
            code: Some("weak_password".to_string()),
            message: "Password should be at least 6 characters.".to_string(),
        });
        assert!(matches!(err, AuthError::Rejected(_)));
        assert_eq!(err.to_string(), "Password should be at least 6 characters.");
    }

    #[test]
    fn timeouts_are_network_errors() {
        assert!(matches!(
            AuthError::from(SupabaseError::Timeout),
            AuthError::Network(_)
        ));
    }
}
