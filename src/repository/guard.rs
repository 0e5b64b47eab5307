use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use super::RepositoryError;
use crate::services::Caller;
use crate::session::SessionStore;

/// The one place repositories check for a signed-in caller before touching the store.
#[derive(Clone)]
pub struct AuthorizationGuard {
    session: Arc<SessionStore>,
}

impl AuthorizationGuard {
    #[must_use]
    pub const fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    /// # Errors
    ///
    /// [`RepositoryError::NotAuthenticated`] when nobody is signed in or the
    /// session has expired.
    pub fn authorize(&self) -> Result<Caller, RepositoryError> {
        let Some(session) = self.session.current_session() else {
            return Err(RepositoryError::NotAuthenticated);
        };

        if session.is_expired(Utc::now()) {
            debug!(user = %session.user.id, "Session expired before the call");
            return Err(RepositoryError::NotAuthenticated);
        }

        Ok(Caller::from(&session))
    }
}
