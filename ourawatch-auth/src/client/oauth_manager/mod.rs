mod models;

pub use models::{OAuthConfig, RefreshOutcome, TokenStatus, OURA_AUTHORIZE_URL, OURA_TOKEN_URL};

use crate::client::token_storage::CredentialStore;
use crate::common::TokenGrant;
use crate::error::AuthError;
use chrono::Utc;
use oura_api::HttpClient;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Refresh attempts per cycle, the first one included
pub const MAX_REFRESH_ATTEMPTS: u32 = 3;
pub const REFRESH_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Owns the credential lifecycle: code exchange, expiry checks and refresh.
pub struct OAuthManager<H, S> {
    http: Arc<H>,
    store: Arc<S>,
    config: OAuthConfig,
    retry_delay: Duration,
}

impl<H, S> OAuthManager<H, S>
where
    H: HttpClient,
    S: CredentialStore,
{
    pub fn new(http: Arc<H>, store: Arc<S>, config: OAuthConfig) -> Self {
        Self {
            http,
            store,
            config,
            retry_delay: REFRESH_RETRY_DELAY,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consent page the user opens in a browser
    pub fn authorization_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.config.authorize_url,
            &[
                ("response_type", "code"),
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
            ],
        )
        .map_err(|e| AuthError::Configuration(format!("Invalid authorize URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    ///
    /// Nothing is stored unless the exchange succeeds.
    pub async fn exchange_code(&self, code: &str) -> Result<(), AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];

        let grant = match self.http.post(&self.config.token_url, &form).await {
            Ok(body) => TokenGrant::from_response(body),
            Err(e) => Err(e.into()),
        }
        .inspect_err(|e| tracing::warn!("Token exchange failed: {}", e))?;

        let mut credential = self.store.get()?;
        credential.apply(&grant, Utc::now());
        self.store.put(&credential)?;

        tracing::info!(
            "Tokens stored, expires in {}s",
            grant.expires_in.unwrap_or_default()
        );
        Ok(())
    }

    /// Current access token, refreshing it first if it has expired
    pub async fn valid_token(&self) -> Result<TokenStatus, AuthError> {
        let credential = self.store.get()?;

        let Some(access_token) = credential.access_token.clone() else {
            tracing::info!("No access token stored, user must authorize");
            return Ok(TokenStatus::Unauthenticated);
        };

        if !credential.is_expired() {
            return Ok(TokenStatus::Valid(access_token));
        }

        tracing::info!("Token expired, attempting refresh");
        Ok(self.refresh().await?.into())
    }

    /// Rotate the access token with the stored refresh token.
    ///
    /// Network and parse failures are retried up to [`MAX_REFRESH_ATTEMPTS`]
    /// times with a fixed delay and never clear the credential. Any other
    /// failure means the server rejected the refresh token: both tokens are
    /// cleared and [`RefreshOutcome::Rejected`] is returned.
    pub async fn refresh(&self) -> Result<RefreshOutcome, AuthError> {
        let mut attempt = 1;

        loop {
            let mut credential = self.store.get()?;

            let Some(refresh_token) = credential.refresh_token.clone() else {
                tracing::warn!("No refresh token stored, clearing credential");
                self.store.clear()?;
                return Ok(RefreshOutcome::Rejected);
            };

            let failure = match self.request_refresh(&refresh_token).await {
                Ok(grant) => {
                    credential.apply(&grant, Utc::now());
                    self.store.put(&credential)?;
                    tracing::info!("Token refreshed successfully (attempt {})", attempt);
                    return Ok(RefreshOutcome::Refreshed(grant.access_token));
                }
                Err(failure) => failure,
            };

            tracing::warn!("Token refresh failed (attempt {}): {}", attempt, failure);

            if !failure.is_transient() {
                tracing::info!("Server rejected refresh, clearing tokens");
                self.store.clear()?;
                return Ok(RefreshOutcome::Rejected);
            }

            if attempt >= MAX_REFRESH_ATTEMPTS {
                tracing::info!("Transient error, keeping tokens for next cycle");
                return Ok(RefreshOutcome::Deferred);
            }

            tracing::debug!("Retrying refresh in {:?}", self.retry_delay);
            tokio::time::sleep(self.retry_delay).await;
            attempt += 1;
        }
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];

        let body = self.http.post(&self.config.token_url, &form).await?;
        TokenGrant::from_response(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::token_storage::MemoryTokenStore;
    use crate::common::Credential;
    use chrono::Duration as ChronoDuration;
    use oura_api::testing::ScriptedHttp;
    use oura_api::HttpError;
    use serde_json::json;

    fn config() -> OAuthConfig {
        OAuthConfig::new("client", "secret", "https://example.test/config/")
    }

    fn manager(
        http: &Arc<ScriptedHttp>,
        store: &Arc<MemoryTokenStore>,
    ) -> OAuthManager<ScriptedHttp, MemoryTokenStore> {
        OAuthManager::new(http.clone(), store.clone(), config())
    }

    fn expired_credential() -> Credential {
        Credential {
            access_token: Some("old-access".into()),
            refresh_token: Some("old-refresh".into()),
            expires_at: Some(Utc::now() - ChronoDuration::hours(1)),
        }
    }

    fn grant(access: &str, refresh: Option<&str>) -> serde_json::Value {
        match refresh {
            Some(refresh) => json!({
                "access_token": access,
                "refresh_token": refresh,
                "expires_in": 86400,
                "token_type": "bearer"
            }),
            None => json!({ "access_token": access, "expires_in": 86400 }),
        }
    }

    #[test]
    fn authorization_url_carries_client_and_scope() {
        let http = Arc::new(ScriptedHttp::new());
        let store = Arc::new(MemoryTokenStore::new());
        let url = manager(&http, &store).authorization_url().unwrap();

        assert!(url.starts_with("https://cloud.ouraring.com/oauth/authorize?response_type=code"));
        assert!(url.contains("client_id=client"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fexample.test%2Fconfig%2F"));
        assert!(url.contains("scope=daily"));
    }

    #[tokio::test]
    async fn exchange_code_stores_both_tokens() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Ok(grant("access", Some("refresh"))));
        let store = Arc::new(MemoryTokenStore::new());

        manager(&http, &store).exchange_code("the-code").await.unwrap();

        let credential = store.get().unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("access"));
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh"));
        assert!(!credential.is_expired());

        let request = &http.requests()[0];
        assert_eq!(request.form_value("grant_type"), Some("authorization_code"));
        assert_eq!(request.form_value("code"), Some("the-code"));
        assert_eq!(request.form_value("client_secret"), Some("secret"));
    }

    #[tokio::test]
    async fn failed_exchange_changes_nothing() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Err(HttpError::Status(400)));
        let store = Arc::new(MemoryTokenStore::new());

        let result = manager(&http, &store).exchange_code("bad").await;

        assert!(matches!(result, Err(AuthError::Http(HttpError::Status(400)))));
        assert_eq!(store.writes(), 0);
        assert!(!store.get().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn valid_token_skips_refresh_when_fresh() {
        let http = Arc::new(ScriptedHttp::new());
        let store = Arc::new(MemoryTokenStore::with_credential(Credential {
            access_token: Some("fresh".into()),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc::now() + ChronoDuration::hours(1)),
        }));

        let status = manager(&http, &store).valid_token().await.unwrap();

        assert_eq!(status, TokenStatus::Valid("fresh".into()));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn valid_token_without_credential_is_unauthenticated() {
        let http = Arc::new(ScriptedHttp::new());
        let store = Arc::new(MemoryTokenStore::new());

        let status = manager(&http, &store).valid_token().await.unwrap();

        assert_eq!(status, TokenStatus::Unauthenticated);
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn valid_token_refreshes_expired_token() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Ok(grant("new-access", None)));
        let store = Arc::new(MemoryTokenStore::with_credential(expired_credential()));

        let status = manager(&http, &store).valid_token().await.unwrap();

        assert_eq!(status, TokenStatus::Valid("new-access".into()));
        let credential = store.get().unwrap();
        assert_eq!(credential.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(
            http.requests()[0].form_value("refresh_token"),
            Some("old-refresh")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_then_store_once() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Err(HttpError::Network("reset".into())))
            .respond("token", Err(HttpError::Network("reset".into())))
            .respond("token", Ok(grant("a3", Some("r3"))));
        let store = Arc::new(MemoryTokenStore::with_credential(expired_credential()));
        let started = tokio::time::Instant::now();

        let outcome = manager(&http, &store).refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Refreshed("a3".into()));
        assert_eq!(http.count("token"), 3);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get().unwrap().refresh_token.as_deref(), Some("r3"));
        assert!(started.elapsed() >= REFRESH_RETRY_DELAY * 2);
        assert!(started.elapsed() < REFRESH_RETRY_DELAY * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_transient_failures_keep_tokens() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond_always("token", Err(HttpError::Parse("not json".into())));
        let store = Arc::new(MemoryTokenStore::with_credential(expired_credential()));

        let outcome = manager(&http, &store).refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Deferred);
        assert_eq!(http.count("token"), MAX_REFRESH_ATTEMPTS as usize);
        let credential = store.get().unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("old-access"));
        assert_eq!(credential.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn definitive_rejection_clears_tokens_without_retry() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Err(HttpError::Status(400)));
        let store = Arc::new(MemoryTokenStore::with_credential(expired_credential()));

        let outcome = manager(&http, &store).refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Rejected);
        assert_eq!(http.count("token"), 1);
        assert_eq!(store.get().unwrap(), Credential::default());
    }

    #[tokio::test]
    async fn success_without_access_token_is_rejection() {
        let http = Arc::new(ScriptedHttp::new());
        http.respond("token", Ok(json!({ "refresh_token": "r" })));
        let store = Arc::new(MemoryTokenStore::with_credential(expired_credential()));

        let outcome = manager(&http, &store).refresh().await.unwrap();

        assert_eq!(outcome, RefreshOutcome::Rejected);
        assert!(!store.get().unwrap().is_authenticated());
    }

    #[tokio::test]
    async fn missing_refresh_token_rejects_without_request() {
        let http = Arc::new(ScriptedHttp::new());
        let store = Arc::new(MemoryTokenStore::with_credential(Credential {
            access_token: Some("access".into()),
            ..Default::default()
        }));

        let status = manager(&http, &store).valid_token().await.unwrap();

        assert_eq!(status, TokenStatus::Unauthenticated);
        assert!(http.requests().is_empty());
        assert_eq!(store.get().unwrap(), Credential::default());
    }
}
