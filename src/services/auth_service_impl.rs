//! `SeaORM` implementation of the `AuthBackend` trait.

use async_trait::async_trait;
use chrono::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};
use url::Url;

use crate::config::SecurityConfig;
use crate::db::{SessionRow, Store, parse_timestamp};
use crate::domain::UserId;
use crate::domain::events::AuthEvent;
use crate::models::{OAuthProvider, Session, SignUpOutcome, User};
use crate::services::auth_service::{AuthBackend, AuthError};
use crate::services::session_file::SessionFile;

const EVENT_BUFFER: usize = 16;

pub struct SeaOrmAuthBackend {
    store: Store,
    security: SecurityConfig,
    session_file: SessionFile,
    events: broadcast::Sender<AuthEvent>,
}

impl SeaOrmAuthBackend {
    #[must_use]
    pub fn new(store: Store, security: SecurityConfig, session_file: SessionFile) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            store,
            security,
            session_file,
            events,
        }
    }

    fn ttl(&self) -> Duration {
        Duration::seconds(self.security.session_ttl_secs)
    }

    async fn session_from_row(&self, row: SessionRow) -> Result<Session, AuthError> {
        let user_id: UserId = row
            .user_id
            .parse()
            .map_err(|e| AuthError::Internal(format!("Invalid user id in session: {e}")))?;
        let user = self
            .store
            .get_user(&user_id)
            .await?
            .ok_or_else(|| AuthError::Internal("Session belongs to a missing user".to_string()))?;

        Ok(Session {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: parse_timestamp(&row.expires_at)?,
            user,
        })
    }

    async fn issue_session(&self, user: User) -> Result<Session, AuthError> {
        let row = self.store.create_session(&user.id, self.ttl()).await?;
        let session = Session {
            access_token: row.access_token,
            refresh_token: row.refresh_token,
            expires_at: parse_timestamp(&row.expires_at)?,
            user,
        };
        self.session_file.save(&session).await?;
        Ok(session)
    }

    /// Invalidates every session of a user, as an administrator would. Signed-in
    /// clients learn about it through [`AuthEvent::SignedOut`].
    pub async fn revoke_user_sessions(&self, user_id: &UserId) -> Result<u64, AuthError> {
        let removed = self.store.delete_user_sessions(user_id).await?;
        if let Some(stored) = self.session_file.load().await?
            && stored.user.id == *user_id
        {
            self.session_file.clear().await?;
        }

        info!(%user_id, removed, "Revoked sessions");
        let _ = self.events.send(AuthEvent::SignedOut { user_id: *user_id });
        Ok(removed)
    }

    /// Changes profile metadata and announces it as [`AuthEvent::UserUpdated`].
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        display_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<User, AuthError> {
        let user = self
            .store
            .update_user_profile(user_id, display_name, avatar_url)
            .await?
            .ok_or(AuthError::NotAuthenticated)?;

        if let Some(mut stored) = self.session_file.load().await?
            && stored.user.id == user.id
        {
            stored.user = user.clone();
            self.session_file.save(&stored).await?;
        }

        let _ = self.events.send(AuthEvent::UserUpdated(user.clone()));
        Ok(user)
    }
}

#[async_trait]
impl AuthBackend for SeaOrmAuthBackend {
    async fn restore_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(stored) = self.session_file.load().await? else {
            return Ok(None);
        };

        if let Some(row) = self.store.find_valid_session(&stored.access_token).await? {
            return self.session_from_row(row).await.map(Some);
        }

        match self.store.rotate_session(&stored.refresh_token, self.ttl()).await? {
            Some(row) => {
                let session = self.session_from_row(row).await?;
                self.session_file.save(&session).await?;
                info!(user = %session.user.id, "Restored session with a refreshed token");
                Ok(Some(session))
            }
            None => {
                warn!("Stored session is no longer valid");
                self.session_file.clear().await?;
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .verify_user_password(email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let session = self.issue_session(user).await?;
        info!(user = %session.user.id, "Signed in with password");
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<Url, AuthError> {
        Err(AuthError::UnsupportedProvider(provider.to_string()))
    }

    async fn complete_oauth(&self, _callback: &Url) -> Result<Session, AuthError> {
        Err(AuthError::UnsupportedProvider("OAuth".to_string()))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::Validation(
                "Unable to validate email address: invalid format".to_string(),
            ));
        }
        if password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password should be at least {} characters.",
                self.security.min_password_length
            )));
        }

        let display_name = display_name.map(str::trim).filter(|n| !n.is_empty());
        let user = self
            .store
            .create_user(email, password, display_name, &self.security)
            .await?
            .ok_or_else(|| AuthError::Rejected("User already registered".to_string()))?;

        info!(user = %user.id, "Registered new user");
        let session = self.issue_session(user).await?;
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let row = self
            .store
            .rotate_session(refresh_token, self.ttl())
            .await?
            .ok_or_else(|| AuthError::Rejected("Invalid Refresh Token".to_string()))?;

        let session = self.session_from_row(row).await?;
        self.session_file.save(&session).await?;
        let _ = self.events.send(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.session_file.clear().await?;
        self.store.delete_session(&session.access_token).await?;
        info!(user = %session.user.id, "Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
