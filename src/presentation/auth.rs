use thiserror::Error;

use crate::models::{SignUpOutcome, User, ValidationError};
use crate::services::AuthError;
use crate::session::SessionStore;

/// A form submission that failed either locally or at the auth backend.
/// Backend messages are passed through unchanged.
#[derive(Debug, Error)]
pub enum FormError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &SessionStore) -> Result<User, FormError> {
        self.validate()?;
        Ok(session
            .sign_in_with_password(self.email.trim(), &self.password)
            .await?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub display_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::MissingField("display name"));
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }

    pub async fn submit(&self, session: &SessionStore) -> Result<SignUpOutcome, FormError> {
        self.validate()?;
        Ok(session
            .sign_up(
                self.email.trim(),
                &self.password,
                Some(self.display_name.trim()),
            )
            .await?)
    }
}
