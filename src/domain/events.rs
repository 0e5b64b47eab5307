//! Notifications pushed by the auth subsystem.
//!
//! Backends broadcast these for changes the application did not ask for
//! (token refresh, revocation, expiry). Explicit sign-in and sign-out calls are
//! turned into the same events by the session store, so every change to the
//! current session goes through one path.

use crate::domain::UserId;
use crate::models::{Session, User};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    UserUpdated(User),
    SignedOut { user_id: UserId },
}

impl AuthEvent {
    /// The user this event is about.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => &session.user.id,
            Self::UserUpdated(user) => &user.id,
            Self::SignedOut { user_id } => user_id,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::UserUpdated(_) => "USER_UPDATED",
            Self::SignedOut { .. } => "SIGNED_OUT",
        }
    }
}
