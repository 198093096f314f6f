use secrecy::SecretString;

pub const OURA_AUTHORIZE_URL: &str = "https://cloud.ouraring.com/oauth/authorize";
pub const OURA_TOKEN_URL: &str = "https://api.ouraring.com/oauth/token";

/// Registered OAuth application
#[derive(Debug)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
    pub scope: String,
    pub authorize_url: String,
    pub token_url: String,
}

impl OAuthConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            redirect_uri: redirect_uri.into(),
            scope: "daily".to_string(),
            authorize_url: OURA_AUTHORIZE_URL.to_string(),
            token_url: OURA_TOKEN_URL.to_string(),
        }
    }
}

/// Result of a refresh attempt sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New access token stored
    Refreshed(String),
    /// Only transient failures; credential kept for the next cycle
    Deferred,
    /// The server rejected the credential (or there was none); tokens cleared
    Rejected,
}

/// What the caller can do right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    Valid(String),
    /// Never authorized or definitively rejected; the user must authorize again
    Unauthenticated,
    /// Refresh failed transiently; try again on the next cycle
    Deferred,
}

impl From<RefreshOutcome> for TokenStatus {
    fn from(outcome: RefreshOutcome) -> Self {
        match outcome {
            RefreshOutcome::Refreshed(token) => TokenStatus::Valid(token),
            RefreshOutcome::Deferred => TokenStatus::Deferred,
            RefreshOutcome::Rejected => TokenStatus::Unauthenticated,
        }
    }
}
