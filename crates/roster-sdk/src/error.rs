use roster_remote::RemoteError;
use roster_types::AccountError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    #[error("passcode is already registered")]
    PasscodeTaken,

    #[error("invalid passcode")]
    InvalidPasscode,

    #[error("account no longer exists")]
    AccountMissing,

    #[error("section already exists: {0}")]
    SectionExists(String),

    #[error("section not found: {0}")]
    SectionNotFound(String),

    #[error("friend not found: {0}")]
    FriendNotFound(String),

    /// The change is in the local cache but the remote refused it.
    #[error("saved locally but not remotely: {0}")]
    NotPersisted(#[source] RemoteError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] roster_store::StoreError),

    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<AccountError> for SdkError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::SectionExists(name) => Self::SectionExists(name),
            AccountError::SectionNotFound(name) => Self::SectionNotFound(name),
            AccountError::FriendNotFound(id) => Self::FriendNotFound(id),
            AccountError::EmptySectionName => Self::MissingField("section name"),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
