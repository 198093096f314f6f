use crate::background::Variant;
use crate::channel::WireFormat;
use config::{Config, ConfigError, Environment, File};
use oura_api::BASE_URL;
use ourawatch_auth::{OAuthConfig, OURA_AUTHORIZE_URL, OURA_TOKEN_URL};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub oauth: OAuthSettings,
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub bridge: BridgeSettings,
}

#[derive(Debug, Deserialize)]
pub struct OAuthSettings {
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "empty_secret", deserialize_with = "secret")]
    pub client_secret: SecretString,
    #[serde(default)]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for OAuthSettings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: empty_secret(),
            redirect_uri: String::new(),
            scope: default_scope(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BridgeSettings {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub variant: Variant,
    #[serde(default)]
    pub wire: WireFormat,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            variant: Variant::default(),
            wire: WireFormat::default(),
        }
    }
}

impl BridgeSettings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

fn default_scope() -> String {
    "daily".to_string()
}

fn default_authorize_url() -> String {
    OURA_AUTHORIZE_URL.to_string()
}

fn default_token_url() -> String {
    OURA_TOKEN_URL.to_string()
}

fn default_base_url() -> String {
    BASE_URL.to_string()
}

fn default_refresh_interval_secs() -> u64 {
    30 * 60
}

impl Settings {
    /// Load `config.toml` (or `$OURAWATCH_CONFIG`), then environment
    /// overrides such as `OURAWATCH_OAUTH__CLIENT_ID`
    pub fn new() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("OURAWATCH_CONFIG").unwrap_or_else(|_| "config.toml".to_string());

        let settings = Config::builder()
            .add_source(File::with_name(&config_path).required(false))
            .add_source(
                Environment::with_prefix("OURAWATCH")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Checks needed before talking to the API
    pub fn validate(&self) -> Result<(), String> {
        if self.oauth.client_id.is_empty() {
            return Err("oauth.client_id is required".to_string());
        }
        if self.oauth.client_secret.expose_secret().is_empty() {
            return Err("oauth.client_secret is required".to_string());
        }
        if self.oauth.redirect_uri.is_empty() {
            return Err("oauth.redirect_uri is required".to_string());
        }
        for (name, url) in [
            ("oauth.authorize_url", &self.oauth.authorize_url),
            ("oauth.token_url", &self.oauth.token_url),
            ("api.base_url", &self.api.base_url),
        ] {
            if !url.starts_with("http") {
                return Err(format!("{} must be a valid HTTP(S) URL", name));
            }
        }
        if self.bridge.refresh_interval_secs == 0 {
            return Err("bridge.refresh_interval_secs must be positive".to_string());
        }
        Ok(())
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.oauth.client_id.clone(),
            client_secret: SecretString::from(
                self.oauth.client_secret.expose_secret().to_string(),
            ),
            redirect_uri: self.oauth.redirect_uri.clone(),
            scope: self.oauth.scope.clone(),
            authorize_url: self.oauth.authorize_url.clone(),
            token_url: self.oauth.token_url.clone(),
        }
    }
}
