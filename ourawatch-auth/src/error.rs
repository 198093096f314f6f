use oura_api::HttpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Token storage error: {0}")]
    TokenStorage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Token response did not include an access token")]
    MissingAccessToken,

    #[error("Invalid authorization callback: {0}")]
    InvalidCallback(String),
}

impl AuthError {
    /// Network and parse failures leave the stored credential untouched
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Http(e) if e.is_transient())
    }
}
