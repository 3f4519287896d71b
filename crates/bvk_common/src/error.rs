//! Error types shared across the workspace.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BvkError {
    /// Rejected input: bad form fields, insufficient budget, non-positive
    /// quantity. Nothing was mutated; the message is shown to the user.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Authentication required")]
    Unauthorized,

    /// Authenticated but not allowed (e.g. a child hitting parent views).
    #[error("{0}")]
    Forbidden(String),

    /// State no longer admits the operation (locked lesson, ended
    /// play-through, duplicate username).
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failures the user cannot fix: hashing, corrupted stored data.
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, BvkError>;

impl BvkError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// True for errors the user can fix by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::NotFound(_) | Self::Conflict(_)
        )
    }
}
