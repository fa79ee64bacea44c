use thiserror::Error;

/// Failure kinds surfaced by [`ScriptLibrary`](crate::services::ScriptLibrary) operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LibraryError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for LibraryError {
    fn from(e: std::io::Error) -> Self {
        Self::Internal(e.into())
    }
}

pub type LibraryResult<T> = std::result::Result<T, LibraryError>;
