mod oauth_manager;
mod token_storage;
mod webview;

pub use oauth_manager::{
    OAuthConfig, OAuthManager, RefreshOutcome, TokenStatus, MAX_REFRESH_ATTEMPTS,
    OURA_AUTHORIZE_URL, OURA_TOKEN_URL, REFRESH_RETRY_DELAY,
};
pub use token_storage::{CredentialStore, MemoryTokenStore, TokenStore};
pub use webview::parse_authorization_response;
