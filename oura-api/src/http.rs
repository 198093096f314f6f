use crate::error::HttpError;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Minimal JSON transport used by both the data endpoints and the token endpoint.
///
/// Implementations must classify every failure into an [`HttpError`] instead of
/// panicking or leaking transport-specific errors.
pub trait HttpClient: Send + Sync {
    /// Bearer-authenticated GET returning the decoded JSON body
    fn get(
        &self,
        url: &str,
        bearer_token: &str,
    ) -> impl Future<Output = Result<Value, HttpError>> + Send;

    /// Form-encoded POST returning the decoded JSON body
    fn post(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> impl Future<Output = Result<Value, HttpError>> + Send;
}

/// `HttpClient` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HttpError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str, bearer_token: &str) -> Result<Value, HttpError> {
        let response = self
            .inner
            .get(url)
            .bearer_auth(bearer_token)
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        read_json(response).await
    }

    async fn post(&self, url: &str, form: &[(&str, &str)]) -> Result<Value, HttpError> {
        let response = self
            .inner
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, HttpError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(HttpError::Unauthorized);
    }

    if !status.is_success() {
        tracing::debug!("{} returned {}", response.url().path(), status);
        return Err(HttpError::Status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|e| HttpError::Network(e.to_string()))?;

    Ok(serde_json::from_str(&body)?)
}
