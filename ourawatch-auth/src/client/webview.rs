use serde::Deserialize;

use crate::error::AuthError;

/// Payload the redirect page hands back when it closes
#[derive(Debug, Deserialize)]
struct CallbackPayload {
    code: Option<String>,
}

/// Extract the authorization code from a redirect-page response.
///
/// The page closes with `pebblejs://close#<percent-encoded JSON>`; either the
/// whole URL or just the fragment is accepted. An empty or `CANCELLED`
/// response means the user backed out and yields `None`.
pub fn parse_authorization_response(response: &str) -> Result<Option<String>, AuthError> {
    let response = response.trim();
    let payload = match response.split_once('#') {
        Some((_, fragment)) => fragment,
        None => response,
    };

    if payload.is_empty() || payload == "CANCELLED" {
        return Ok(None);
    }

    let decoded = urlencoding::decode(payload)
        .map_err(|e| AuthError::InvalidCallback(format!("not percent-encoded UTF-8: {}", e)))?;

    let payload: CallbackPayload = serde_json::from_str(&decoded)?;
    Ok(payload.code.filter(|code| !code.is_empty()))
}
