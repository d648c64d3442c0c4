use thiserror::Error;

/// Errors produced by account mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("section already exists: {0}")]
    SectionExists(String),

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("friend not found: {0}")]
    FriendNotFound(String),

    #[error("section name must not be empty")]
    EmptySectionName,
}

pub type AccountResult<T> = Result<T, AccountError>;
