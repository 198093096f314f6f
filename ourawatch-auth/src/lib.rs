// Credential model shared by the client and its callers
pub mod common;

mod client;
mod error;

pub use client::{
    parse_authorization_response, CredentialStore, MemoryTokenStore, OAuthConfig, OAuthManager,
    RefreshOutcome, TokenStatus, TokenStore, MAX_REFRESH_ATTEMPTS, OURA_AUTHORIZE_URL,
    OURA_TOKEN_URL, REFRESH_RETRY_DELAY,
};
pub use common::{Credential, TokenGrant};
pub use error::AuthError;
