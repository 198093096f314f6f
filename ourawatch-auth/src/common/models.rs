use chrono::{serde::ts_milliseconds_option, DateTime, Duration, Utc};
use oura_api::HttpError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AuthError;

/// Tokens are treated as expired this long before the server says they are
pub const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Persisted OAuth state. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default, with = "ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// True when no expiry is stored or `now` is within the margin of it
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now > expires_at - EXPIRY_MARGIN,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// Merge a token grant into this credential.
    ///
    /// The access token always replaces the stored one. The refresh token and
    /// expiry only replace stored values when the server sent them, since
    /// servers are free to skip refresh-token rotation.
    pub fn apply(&mut self, grant: &TokenGrant, now: DateTime<Utc>) {
        self.access_token = Some(grant.access_token.clone());

        if let Some(refresh_token) = &grant.refresh_token {
            self.refresh_token = Some(refresh_token.clone());
        }

        if let Some(expires_in) = grant.expires_in.filter(|secs| *secs > 0) {
            self.expires_at = Some(now + Duration::seconds(expires_in));
        }
    }
}

/// Raw body of the token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// A successful token endpoint response
#[derive(Debug, Clone, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    pub expires_in: Option<i64>,
}

impl TokenGrant {
    /// Decode a token endpoint body.
    ///
    /// A body that does not decode is a parse error; one that decodes without
    /// an access token is a rejection.
    pub fn from_response(body: Value) -> Result<Self, AuthError> {
        let response: TokenResponse = serde_json::from_value(body).map_err(HttpError::from)?;

        let access_token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingAccessToken)?;

        Ok(Self {
            access_token,
            refresh_token: response.refresh_token.filter(|token| !token.is_empty()),
            expires_in: response.expires_in,
        })
    }
}
