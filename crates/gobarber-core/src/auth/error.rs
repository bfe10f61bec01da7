use thiserror::Error;

use crate::api::ApiError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("use_session must be used within a SessionProvider")]
    OutsideProvider,

    #[error("Not signed in")]
    NotSignedIn,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Saved user is not valid: {0}")]
    InvalidStoredUser(#[source] serde_json::Error),

    #[error("Failed to encode user: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
