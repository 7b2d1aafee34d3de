use thiserror::Error;

/// Failure talking to the signup backend. Never shown to the renderer as-is;
/// the controller folds these into field error messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("signup backend is unavailable: {0}")]
    Unavailable(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response status {0}")]
    UnexpectedStatus(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Transport(_) | BackendError::Unavailable(_))
    }
}
