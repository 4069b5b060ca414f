use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("push transport error: {0}")]
    Transport(String),

    #[error("malformed frame: {0}")]
    Frame(String),
}

impl AppError {
    /// Transport-level failures are retried by the channel supervisor;
    /// everything else propagates to the caller.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Frame(_))
    }
}
