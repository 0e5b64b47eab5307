//! Process-wide "who is signed in" state.
//!
//! [`SessionStore`] is created once at start-up and owned by the application
//! context. Explicit calls (sign-in, sign-out) and notifications pushed by the
//! auth backend are both reduced to [`AuthEvent`]s and applied in one place, so
//! subscribers see every transition exactly once regardless of its origin.

use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::events::AuthEvent;
use crate::models::{OAuthProvider, Session, SignUpOutcome, User};
use crate::services::{AuthBackend, AuthError};

type SessionState = watch::Sender<Option<Session>>;

pub struct SessionStore {
    backend: Arc<dyn AuthBackend>,
    state: Arc<SessionState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl SessionStore {
    /// Restores any persisted session and starts listening for backend events.
    ///
    /// # Errors
    ///
    /// Fails when the backend cannot be reached to validate a stored session.
    pub async fn start(backend: Arc<dyn AuthBackend>) -> Result<Self, AuthError> {
        let events = backend.subscribe();
        let restored = backend.restore_session().await?;
        if let Some(session) = &restored {
            info!(user = %session.user.id, "Session restored");
        }
        Ok(Self::with_events(backend, events, restored))
    }

    /// Builds a store with a known initial session, without asking the backend to restore one.
    #[must_use]
    pub fn manual(backend: Arc<dyn AuthBackend>, initial: Option<Session>) -> Self {
        let events = backend.subscribe();
        Self::with_events(backend, events, initial)
    }

    fn with_events(
        backend: Arc<dyn AuthBackend>,
        events: broadcast::Receiver<AuthEvent>,
        initial: Option<Session>,
    ) -> Self {
        let (sender, _) = watch::channel(initial);
        let state = Arc::new(sender);
        let listener = tokio::spawn(listen(events, Arc::clone(&state)));

        Self {
            backend,
            state,
            listener: Mutex::new(Some(listener)),
        }
    }

    #[must_use]
    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().as_ref().map(|s| s.user.clone())
    }

    #[must_use]
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    /// # Errors
    ///
    /// The backend's [`AuthError`], unchanged.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let session = self.backend.sign_in_with_password(email, password).await?;
        let user = session.user.clone();
        apply(&self.state, AuthEvent::SignedIn(session));
        Ok(user)
    }

    /// Returns the provider URL the user must visit; the sign-in finishes in
    /// [`Self::complete_oauth`].
    pub fn sign_in_with_oauth(&self, provider: OAuthProvider) -> Result<Url, AuthError> {
        self.backend.oauth_authorize_url(provider)
    }

    pub async fn complete_oauth(&self, callback: &Url) -> Result<User, AuthError> {
        let session = self.backend.complete_oauth(callback).await?;
        let user = session.user.clone();
        apply(&self.state, AuthEvent::SignedIn(session));
        Ok(user)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignUpOutcome, AuthError> {
        let outcome = self.backend.sign_up(email, password, display_name).await?;
        if let SignUpOutcome::SignedIn(session) = &outcome {
            apply(&self.state, AuthEvent::SignedIn(session.clone()));
        }
        Ok(outcome)
    }

    /// Clears the current session. Local state is cleared even when the remote
    /// call fails; the failure is still returned.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.current_session() else {
            debug!("Sign-out requested without a session");
            return Ok(());
        };

        let result = self.backend.sign_out(&session).await;
        if let Err(e) = &result {
            warn!(error = %e, "Remote sign-out failed, clearing local session anyway");
        }

        apply(
            &self.state,
            AuthEvent::SignedOut {
                user_id: session.user.id,
            },
        );
        result
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        SessionSubscription {
            receiver: self.state.subscribe(),
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Stops listening for backend notifications. Idempotent.
    pub fn shutdown(&self) {
        if let Ok(mut slot) = self.listener.lock()
            && let Some(task) = slot.take()
        {
            task.abort();
            debug!("Session listener stopped");
        }
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn listen(mut events: broadcast::Receiver<AuthEvent>, state: Arc<SessionState>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                debug!(event = event.name(), "Auth event received");
                apply(&state, event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Session listener lagged behind auth events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// The single writer of session state. Returns whether subscribers were notified.
fn apply(state: &SessionState, event: AuthEvent) -> bool {
    state.send_if_modified(|current| {
        let concerns_current = current
            .as_ref()
            .is_some_and(|s| s.user.id == *event.user_id());

        match event {
            AuthEvent::SignedIn(session) => {
                if current.as_ref() == Some(&session) {
                    return false;
                }
                info!(user = %session.user.id, "Signed in");
                *current = Some(session);
                true
            }
            AuthEvent::TokenRefreshed(session) if concerns_current => {
                if current.as_ref() == Some(&session) {
                    return false;
                }
                *current = Some(session);
                true
            }
            AuthEvent::UserUpdated(user) if concerns_current => match current {
                Some(session) if session.user != user => {
                    session.user = user;
                    true
                }
                _ => false,
            },
            AuthEvent::SignedOut { user_id } if concerns_current => {
                info!(user = %user_id, "Signed out");
                *current = None;
                true
            }
            other => {
                debug!(event = other.name(), "Ignoring auth event for another user");
                false
            }
        }
    })
}

/// Live view of the current user. Dropping it unsubscribes.
pub struct SessionSubscription {
    receiver: watch::Receiver<Option<Session>>,
}

impl SessionSubscription {
    #[must_use]
    pub fn current(&self) -> Option<User> {
        self.receiver.borrow().as_ref().map(|s| s.user.clone())
    }

    /// True when a change happened that this subscriber has not yet seen.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Waits for the next change and returns the user after it. `None` once
    /// the store has been dropped.
    pub async fn changed(&mut self) -> Option<Option<User>> {
        self.receiver.changed().await.ok()?;
        Some(
            self.receiver
                .borrow_and_update()
                .as_ref()
                .map(|s| s.user.clone()),
        )
    }
}
