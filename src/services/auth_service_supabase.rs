//! `AuthBackend` backed by a hosted GoTrue server.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::clients::{SupabaseClient, SupabaseError};
use crate::domain::UserId;
use crate::domain::events::AuthEvent;
use crate::models::{OAuthProvider, Session, SignUpOutcome, User};
use crate::services::auth_service::{AuthBackend, AuthError};
use crate::services::session_file::SessionFile;

const EVENT_BUFFER: usize = 16;

/// How long before expiry the access token is refreshed.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: UserId,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    user_name: Option<String>,
    full_name: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

impl From<GoTrueUser> for User {
    fn from(user: GoTrueUser) -> Self {
        let meta = user.user_metadata;
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            display_name: meta.user_name.or(meta.full_name).or(meta.name),
            avatar_url: meta.avatar_url,
        }
    }
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.expires_in.unwrap_or(3600)));

        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

#[derive(Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    data: SignUpData<'a>,
}

#[derive(Serialize)]
struct SignUpData<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_name: Option<&'a str>,
}

/// Sign-up returns a session when email confirmation is off, and just the user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Session(TokenResponse),
    Wrapped { user: GoTrueUser },
    User(GoTrueUser),
}

async fn exchange_refresh_token(
    client: &SupabaseClient,
    refresh_token: &str,
) -> Result<Session, SupabaseError> {
    let response: TokenResponse = client
        .auth_post(
            "token",
            &[("grant_type", "refresh_token")],
            &RefreshGrant { refresh_token },
            None,
        )
        .await?;
    Ok(response.into_session())
}

pub struct SupabaseAuthBackend {
    client: SupabaseClient,
    session_file: SessionFile,
    redirect_url: Option<String>,
    events: broadcast::Sender<AuthEvent>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl SupabaseAuthBackend {
    #[must_use]
    pub fn new(
        client: SupabaseClient,
        session_file: SessionFile,
        redirect_url: Option<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            client,
            session_file,
            redirect_url,
            events,
            refresh_task: Mutex::new(None),
        }
    }

    /// Replaces the background refresh task with one for `session`.
    fn schedule_refresh(&self, session: &Session) {
        let client = self.client.clone();
        let session_file = self.session_file.clone();
        let events = self.events.clone();
        let mut current = session.clone();

        let task = tokio::spawn(async move {
            loop {
                let refresh_at = current.expires_at - Duration::seconds(REFRESH_MARGIN_SECS);
                let wait = (refresh_at - Utc::now()).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                let user_id = current.user.id;
                match exchange_refresh_token(&client, &current.refresh_token).await {
                    Ok(session) => {
                        debug!(user = %user_id, "Access token refreshed");
                        if let Err(e) = session_file.save(&session).await {
                            warn!(error = %e, "Failed to persist refreshed session");
                        }
                        let _ = events.send(AuthEvent::TokenRefreshed(session.clone()));
                        current = session;
                    }
                    Err(e) => {
                        warn!(user = %user_id, error = %e, "Token refresh failed, signing out");
                        if let Err(e) = session_file.clear().await {
                            warn!(error = %e, "Failed to remove session file");
                        }
                        let _ = events.send(AuthEvent::SignedOut { user_id });
                        break;
                    }
                }
            }
        });

        if let Ok(mut slot) = self.refresh_task.lock()
            && let Some(previous) = slot.replace(task)
        {
            previous.abort();
        }
    }

    fn cancel_refresh(&self) {
        if let Ok(mut slot) = self.refresh_task.lock()
            && let Some(task) = slot.take()
        {
            task.abort();
        }
    }

    async fn establish(&self, session: Session) -> Result<Session, AuthError> {
        self.session_file.save(&session).await?;
        self.schedule_refresh(&session);
        Ok(session)
    }

    async fn fetch_user(&self, access_token: &str) -> Result<User, SupabaseError> {
        let user: GoTrueUser = self.client.auth_get("user", access_token).await?;
        Ok(user.into())
    }
}

impl Drop for SupabaseAuthBackend {
    fn drop(&mut self) {
        self.cancel_refresh();
    }
}

#[async_trait]
impl AuthBackend for SupabaseAuthBackend {
    async fn restore_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(stored) = self.session_file.load().await? else {
            return Ok(None);
        };

        let margin = Duration::seconds(REFRESH_MARGIN_SECS);
        if !stored.expires_within(Utc::now(), margin) {
            match self.fetch_user(&stored.access_token).await {
                Ok(user) => {
                    let session = Session { user, ..stored };
                    return self.establish(session).await.map(Some);
                }
                Err(SupabaseError::Api { status, .. }) if status == 401 || status == 403 => {
                    debug!("Stored access token rejected, trying refresh");
                }
                Err(e) => return Err(e.into()),
            }
        }

        match exchange_refresh_token(&self.client, &stored.refresh_token).await {
            Ok(session) => {
                info!(user = %session.user.id, "Restored session with a refreshed token");
                self.establish(session).await.map(Some)
            }
            Err(SupabaseError::Api { message, .. }) => {
                warn!(error = %message, "Stored session is no longer valid");
                self.session_file.clear().await?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let response: TokenResponse = self
            .client
            .auth_post(
                "token",
                &[("grant_type", "password")],
                &PasswordGrant {
                    email: email.trim(),
                    password,
                },
                None,
            )
            .await?;

        let session = self.establish(response.into_session()).await?;
        info!(user = %session.user.id, "Signed in with password");
        Ok(session)
    }

    fn oauth_authorize_url(&self, provider: OAuthProvider) -> Result<Url, AuthError> {
        Ok(self
            .client
            .authorize_url(provider, self.redirect_url.as_deref())?)
    }

    async fn complete_oauth(&self, callback: &Url) -> Result<Session, AuthError> {
        let params = callback
            .fragment()
            .map(|f| url::form_urlencoded::parse(f.as_bytes()).into_owned().collect())
            .unwrap_or_else(Vec::<(String, String)>::new);
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        if let Some(description) = get("error_description").or_else(|| get("error")) {
            return Err(AuthError::Rejected(description));
        }

        let access_token = get("access_token")
            .ok_or_else(|| AuthError::InvalidCallback("missing access_token".to_string()))?;
        let refresh_token = get("refresh_token")
            .ok_or_else(|| AuthError::InvalidCallback("missing refresh_token".to_string()))?;
        let expires_at = get("expires_at")
            .and_then(|v| v.parse::<i64>().ok())
            .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
            .or_else(|| {
                get("expires_in")
                    .and_then(|v| v.parse::<i64>().ok())
                    .map(|secs| Utc::now() + Duration::seconds(secs))
            })
            .ok_or_else(|| AuthError::InvalidCallback("missing expiry".to_string()))?;

        let user = self.fetch_user(&access_token).await?;
        let session = self
            .establish(Session {
                access_token,
                refresh_token,
                expires_at,
                user,
            })
            .await?;

        info!(user = %session.user.id, "Signed in with OAuth");
        Ok(session)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let request = SignUpRequest {
            email: email.trim(),
            password,
            data: SignUpData {
                user_name: display_name.map(str::trim).filter(|n| !n.is_empty()),
            },
        };

        let response: SignUpResponse = self.client.auth_post("signup", &[], &request, None).await?;

        match response {
            SignUpResponse::Session(tokens) => {
                let session = self.establish(tokens.into_session()).await?;
                info!(user = %session.user.id, "Registered and signed in");
                Ok(SignUpOutcome::SignedIn(session))
            }
            SignUpResponse::Wrapped { user } | SignUpResponse::User(user) => {
                let user = User::from(user);
                info!(user = %user.id, "Registered, awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationRequired(user))
            }
        }
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let session = exchange_refresh_token(&self.client, refresh_token).await?;
        let session = self.establish(session).await?;
        let _ = self.events.send(AuthEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        self.cancel_refresh();
        // The token is revoked remotely even when the local file cannot be removed.
        let remote = self
            .client
            .auth_post_empty("logout", &session.access_token)
            .await;
        let local = self.session_file.clear().await;
        remote?;
        local?;
        info!(user = %session.user.id, "Signed out");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_response_maps_user_metadata() {
        let json = r#"{
            "access_token": "a",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1900000000,
            "refresh_token": "r",
            "user": {
                "id": "0b3e1b8e-8f5a-4a57-9a84-2f6f7c3f6f11",
                "email": "rin@example.com",
                "user_metadata": { "user_name": "Rin", "avatar_url": "https://img/rin.png" }
            }
        }"#;
        let session = serde_json::from_str::<TokenResponse>(json)
            .unwrap()
            .into_session();
        assert_eq!(session.expires_at.timestamp(), 1_900_000_000);
        assert_eq!(session.user.display_name.as_deref(), Some("Rin"));
        assert_eq!(session.user.avatar_url.as_deref(), Some("https://img/rin.png"));
    }

    #[test]
    fn sign_up_without_tokens_needs_confirmation() {
        let json = r#"{
            "id": "0b3e1b8e-8f5a-4a57-9a84-2f6f7c3f6f11",
            "email": "rin@example.com",
            "user_metadata": {}
        }"#;
        let response: SignUpResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response, SignUpResponse::User(_)));
    }
}
