use crate::background::fetch_coordinator::FetchCoordinator;
use crate::background::Variant;
use crate::channel::{ChannelError, WatchChannel};
use crate::message::WatchMessage;
use crate::snapshot::ScoreSnapshot;
use chrono::{Duration, NaiveDate, Utc};
use oura_api::testing::ScriptedHttp;
use oura_api::Client;
use ourawatch_auth::{Credential, MemoryTokenStore, OAuthConfig, OAuthManager};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, PoisonError};

const FIXTURE_TODAY: NaiveDate = match NaiveDate::from_ymd_opt(2024, 1, 3) {
    Some(date) => date,
    None => panic!("invalid fixture date"),
};

/// Date every fixture treats as today
pub fn fixture_today() -> NaiveDate {
    FIXTURE_TODAY
}

/// Channel that keeps every message instead of sending it
#[derive(Default)]
pub struct RecordingChannel {
    messages: Mutex<Vec<WatchMessage>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<WatchMessage> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of `AUTH_STATUS=0` messages sent
    pub fn unauthorized_count(&self) -> usize {
        self.messages()
            .iter()
            .filter(|m| matches!(m, WatchMessage::Unauthorized))
            .count()
    }

    /// Most recent full snapshot sent
    pub fn last_snapshot(&self) -> Option<ScoreSnapshot> {
        self.messages().into_iter().rev().find_map(|m| match m {
            WatchMessage::Scores(snapshot) => Some(snapshot),
            _ => None,
        })
    }
}

impl WatchChannel for RecordingChannel {
    async fn send(&self, message: &WatchMessage) -> Result<(), ChannelError> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        Ok(())
    }
}

/// A collection endpoint body
pub fn collection(data: Value) -> Value {
    json!({ "data": data })
}

/// Credential whose access token is good for another day
pub fn valid_credential(access_token: &str) -> Credential {
    Credential {
        access_token: Some(access_token.to_string()),
        refresh_token: Some("refresh-token".to_string()),
        expires_at: Some(Utc::now() + Duration::days(1)),
    }
}

/// Credential that expired an hour ago but can still be refreshed
pub fn expired_credential(access_token: &str) -> Credential {
    Credential {
        expires_at: Some(Utc::now() - Duration::hours(1)),
        ..valid_credential(access_token)
    }
}

pub fn test_oauth_config() -> OAuthConfig {
    OAuthConfig::new("client-id", "client-secret", "https://example.test/callback")
}

pub type TestCoordinator = FetchCoordinator<ScriptedHttp, MemoryTokenStore, RecordingChannel>;

/// A coordinator wired to in-memory doubles
pub struct BridgeFixture {
    pub http: Arc<ScriptedHttp>,
    pub store: Arc<MemoryTokenStore>,
    pub channel: Arc<RecordingChannel>,
    pub coordinator: TestCoordinator,
}

/// Build a fixture anchored on [`fixture_today`]. With `access_token` the
/// store holds an unexpired credential; without it the store is empty.
pub fn bridge_fixture(access_token: Option<&str>, variant: Variant) -> BridgeFixture {
    let credential = access_token.map(valid_credential).unwrap_or_default();
    bridge_fixture_with(credential, variant)
}

/// Build a fixture whose store starts out holding `credential`
pub fn bridge_fixture_with(credential: Credential, variant: Variant) -> BridgeFixture {
    let http = Arc::new(ScriptedHttp::new());
    let store = Arc::new(MemoryTokenStore::with_credential(credential));
    let channel = Arc::new(RecordingChannel::new());

    let auth = Arc::new(OAuthManager::new(
        http.clone(),
        store.clone(),
        test_oauth_config(),
    ));
    let api = Client::with_base_url(http.clone(), "https://api.example.test/v2");
    let coordinator =
        FetchCoordinator::new(api, auth, channel.clone(), variant).anchored_on(fixture_today());

    BridgeFixture {
        http,
        store,
        channel,
        coordinator,
    }
}

impl BridgeFixture {
    /// Script every collection endpoint with a week of plausible data.
    ///
    /// Today's sleep score is 90 and two days ago it was 75; other days are
    /// missing.
    pub fn script_scores(&self) {
        self.http.respond_always(
            "daily_sleep",
            Ok(collection(json!([
                { "day": "2024-01-01", "score": 75 },
                { "day": "2024-01-03", "score": 90 },
            ]))),
        );
        self.http.respond_always(
            "daily_readiness",
            Ok(collection(json!([
                { "day": "2024-01-02", "score": 80, "temperature_deviation": 0.1 },
                { "day": "2024-01-03", "score": 72, "temperature_deviation": -0.2 },
            ]))),
        );
        self.http.respond_always(
            "daily_activity",
            Ok(collection(json!([{
                "day": "2024-01-03",
                "score": 65,
                "active_calories": 320,
                "target_calories": 500,
                "total_calories": 2100,
                "steps": 8432,
                "high_activity_time": 900,
                "medium_activity_time": 1800,
            }]))),
        );
        self.http.respond_always(
            "daily_stress",
            Ok(collection(json!([
                { "day": "2024-01-03", "stress_high": 1200, "recovery_high": 3600 },
            ]))),
        );
        self.http.respond_always(
            "sleep",
            Ok(collection(json!([{
                "day": "2024-01-03",
                "total_sleep_duration": 25920,
                "time_in_bed": 28800,
                "efficiency": 90,
                "average_heart_rate": 57.5,
                "average_hrv": 45,
                "average_breath": 15.8,
            }]))),
        );
    }
}
