use thiserror::Error;

/// Failure reported by one of the remote collaborators (planner, executor, log store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Network failure, timeout, non-2xx status or a body that could not be decoded.
    #[error("transport error: {0}")]
    Transport(String),
    /// Well-formed response that signals failure.
    #[error("service rejected request: {0}")]
    Rejected(String),
}

impl ServiceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport(message) | Self::Rejected(message) => message,
        }
    }
}
