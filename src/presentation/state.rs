use std::fmt;

/// Lifecycle of whatever a view is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ViewState<T> {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Success or a rendered error, using `describe` for the message.
    pub fn from_result<E>(result: Result<T, E>, describe: impl FnOnce(&E) -> String) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::Error(describe(&e)),
        }
    }
}

impl<T> fmt::Display for ViewState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Loading => f.write_str("loading"),
            Self::Success(_) => f.write_str("success"),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let ok: ViewState<u8> = ViewState::from_result(Ok::<_, String>(3), |e: &String| e.clone());
        assert_eq!(ok.value(), Some(&3));
        assert!(ok.error().is_none());

        let err: ViewState<u8> = ViewState::from_result(Err("boom".to_string()), |e| e.to_uppercase());
        assert_eq!(err.error(), Some("BOOM"));
        assert!(err.value().is_none());
        assert!(ViewState::<u8>::default() == ViewState::Idle);
    }
}
