use thiserror::Error;

/// Contract violations of a quiz session. The session is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("cannot start a quiz with an empty word pool")]
    EmptyPool,
    #[error("quiz has not been started")]
    NotStarted,
    #[error("quiz has already been started")]
    AlreadyStarted,
    #[error("quiz is finished, no more guesses are accepted")]
    Finished,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
    #[error("cannot update {path:?}: {reason}")]
    InvalidUpdate { path: String, reason: &'static str },
    #[error("no record at {0:?}")]
    NotFound(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
