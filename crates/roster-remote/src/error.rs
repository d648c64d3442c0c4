use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// No credential configured, or the remote refused the one given.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The remote document does not exist yet.
    #[error("remote document not found")]
    NotFound,

    /// Transport failure or an unexpected status.
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    /// The version token sent with a write is no longer current.
    #[error("version conflict: {0}")]
    Conflict(String),

    /// The remote answered with something that is not a document.
    #[error("decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Unavailable(e.to_string())
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;
