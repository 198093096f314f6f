use oura_api::HttpError;
use ourawatch::channel::{read_frame, StreamChannel, WatchChannel, WireFormat};
use ourawatch::message::{keys, WatchMessage};
use ourawatch::mock::demo_snapshot;
use ourawatch::testing::{bridge_fixture, bridge_fixture_with, collection, expired_credential};
use ourawatch::{CycleOutcome, Variant};
use ourawatch_auth::{Credential, CredentialStore, REFRESH_RETRY_DELAY};
use serde_json::json;
use tokio::io::BufReader;
use tokio::time::Instant;

fn token_response(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "refresh_token": "rotated-refresh",
        "expires_in": 86400,
    })
}

#[tokio::test(start_paused = true)]
async fn test_refresh_survives_two_network_failures() {
    let fixture = bridge_fixture_with(expired_credential("stale"), Variant::App);
    fixture.script_scores();
    fixture
        .http
        .respond("token", Err(HttpError::Network("connection reset".into())))
        .respond("token", Err(HttpError::Network("timed out".into())))
        .respond("token", Ok(token_response("fresh")));

    let started = Instant::now();
    let outcome = fixture.coordinator.refresh_scores().await.unwrap();

    assert!(matches!(outcome, CycleOutcome::Published(_)));
    assert_eq!(fixture.http.count("token"), 3);
    assert!(started.elapsed() >= REFRESH_RETRY_DELAY * 2);

    // Tokens were stored exactly once and the watch never saw AUTH_STATUS=0
    assert_eq!(fixture.store.writes(), 1);
    assert_eq!(fixture.channel.unauthorized_count(), 0);

    let credential = fixture.store.get().unwrap();
    assert_eq!(credential.access_token.as_deref(), Some("fresh"));
    assert_eq!(credential.refresh_token.as_deref(), Some("rotated-refresh"));

    // Every endpoint was fetched with the new token
    let fetches: Vec<_> = fixture
        .http
        .requests()
        .into_iter()
        .filter(|r| r.method == "GET")
        .collect();
    assert_eq!(fetches.len(), 5);
    assert!(fetches
        .iter()
        .all(|r| r.bearer_token.as_deref() == Some("fresh")));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_refresh_clears_tokens_and_reports_once() {
    let fixture = bridge_fixture_with(expired_credential("stale"), Variant::App);
    fixture.script_scores();
    fixture.http.respond("token", Err(HttpError::Status(400)));

    let outcome = fixture.coordinator.refresh_scores().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Unauthorized);
    assert_eq!(fixture.http.count("token"), 1);
    assert_eq!(fixture.channel.unauthorized_count(), 1);
    assert_eq!(fixture.channel.messages().len(), 1);
    assert_eq!(fixture.store.get().unwrap(), Credential::default());

    // Nothing was fetched with the rejected credential
    assert_eq!(fixture.http.count("daily_sleep"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_refresh_failure_is_silent() {
    let fixture = bridge_fixture_with(expired_credential("stale"), Variant::App);
    fixture
        .http
        .respond_always("token", Err(HttpError::Network("offline".into())));

    let outcome = fixture.coordinator.refresh_scores().await.unwrap();

    assert_eq!(outcome, CycleOutcome::Deferred);
    assert!(fixture.channel.messages().is_empty());
    assert_eq!(
        fixture.store.get().unwrap().refresh_token.as_deref(),
        Some("refresh-token")
    );
}

#[tokio::test(start_paused = true)]
async fn test_single_unauthorized_endpoint_triggers_one_refresh_and_retry() {
    let fixture = bridge_fixture(Some("revoked"), Variant::App);
    fixture.script_scores();
    // First round: stale sleep data alongside the rejected readiness fetch
    fixture
        .http
        .respond(
            "daily_sleep",
            Ok(collection(json!([{ "day": "2024-01-03", "score": 10 }]))),
        )
        .respond("daily_readiness", Err(HttpError::Unauthorized));
    fixture.http.respond("token", Ok(token_response("fresh")));

    let outcome = fixture.coordinator.refresh_scores().await.unwrap();

    assert_eq!(fixture.http.count("token"), 1);
    for endpoint in [
        "daily_sleep",
        "daily_readiness",
        "daily_activity",
        "daily_stress",
        "sleep",
    ] {
        assert_eq!(fixture.http.count(endpoint), 2, "{}", endpoint);
    }

    // The published snapshot is built from the retry alone
    let CycleOutcome::Published(snapshot) = outcome else {
        panic!("expected a published snapshot, got {:?}", outcome);
    };
    assert_eq!(snapshot.scores().sleep, 90);
    assert_eq!(snapshot.history.sleep.values(), &[-1, -1, -1, -1, 75, -1, 90]);
    assert_eq!(snapshot.scores().readiness, 72);
    assert_eq!(snapshot.readiness.temperature_deviation, -2);
    assert_eq!(fixture.channel.messages(), vec![WatchMessage::Scores(snapshot)]);
    assert_eq!(fixture.channel.unauthorized_count(), 0);
}

#[tokio::test]
async fn test_history_places_scores_by_day() {
    let fixture = bridge_fixture(Some("tok"), Variant::App);
    fixture.script_scores();

    fixture.coordinator.refresh_scores().await.unwrap();

    let snapshot = fixture.channel.last_snapshot().unwrap();
    assert_eq!(snapshot.history.sleep.values(), &[-1, -1, -1, -1, 75, -1, 90]);
    assert_eq!(snapshot.scores().sleep, 90);
    assert_eq!(snapshot.history.stress_high.today(), 20);
    assert_eq!(snapshot.history.stress_recovery.today(), 60);
    assert_eq!(snapshot.history.stress_high[0], 0);
}

#[tokio::test]
async fn test_snapshot_survives_both_wire_formats() {
    let fixture = bridge_fixture(Some("tok"), Variant::App);
    fixture.script_scores();
    fixture.coordinator.refresh_scores().await.unwrap();
    let fetched = fixture.channel.last_snapshot().unwrap();

    for snapshot in [fetched, demo_snapshot()] {
        for format in [WireFormat::Json, WireFormat::Dictionary] {
            let channel = StreamChannel::new(Vec::new(), format);
            let sent = WatchMessage::Scores(snapshot.clone());
            channel.send(&sent).await.unwrap();

            let bytes = channel.into_inner();
            let mut reader = BufReader::new(bytes.as_slice());
            let frame = read_frame(&mut reader, format).await.unwrap().unwrap();

            assert_eq!(frame.get(keys::AUTH_STATUS), Some(1));
            assert_eq!(WatchMessage::from_app_message(&frame).unwrap(), sent);
        }
    }
}

#[tokio::test]
async fn test_watchface_headline_over_the_wire() {
    let fixture = bridge_fixture(Some("tok"), Variant::Watchface);
    fixture.script_scores();
    fixture.coordinator.refresh_scores().await.unwrap();

    let [message] = fixture.channel.messages().try_into().unwrap();
    let frame = message.to_app_message();

    assert_eq!(frame.len(), 4);
    assert_eq!(frame.get(keys::SLEEP_SCORE), Some(90));
    assert_eq!(frame.get(keys::READINESS_SCORE), Some(72));
    assert_eq!(frame.get(keys::ACTIVITY_SCORE), Some(65));
}
