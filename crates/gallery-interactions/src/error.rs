use thiserror::Error;

#[derive(Debug, Error)]
pub enum InteractionError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Emoji must not be empty")]
    EmptyEmoji,

    #[error("Comment text must not be empty")]
    EmptyComment,

    #[error("Sync service unavailable: {0}")]
    Unavailable(String),

    #[error("Sync error: {0}")]
    Sync(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User name must not be empty")]
    EmptyName,

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
