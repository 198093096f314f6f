use thiserror::Error;

/// Classified outcome of a failed request.
///
/// Every transport failure is mapped onto one of these variants at the
/// `HttpClient` boundary, so callers never see raw `reqwest` errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HttpError {
    /// HTTP 401 from the server
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-success status
    #[error("HTTP status {0}")]
    Status(u16),

    /// A success response whose body could not be decoded
    #[error("parse error: {0}")]
    Parse(String),

    /// Connection, timeout or body-read failure
    #[error("network error: {0}")]
    Network(String),
}

impl HttpError {
    /// Network and parse failures are worth retrying without touching credentials.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Parse(_))
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(err: serde_json::Error) -> Self {
        HttpError::Parse(err.to_string())
    }
}
