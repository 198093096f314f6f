use super::{CycleError, CycleOutcome, Variant};
use crate::aggregator::{aggregate, RecordSets};
use crate::cache::SnapshotCache;
use crate::channel::WatchChannel;
use crate::message::WatchMessage;
use crate::snapshot::ScoreSnapshot;
use chrono::NaiveDate;
use oura_api::endpoints::{DailyRecord, FetchWindow, ListCollection};
use oura_api::{Client, HttpClient, HttpError, Request};
use ourawatch_auth::{CredentialStore, OAuthManager, RefreshOutcome, TokenStatus};
use std::sync::Arc;

/// Result of one endpoint fetch after failure isolation
enum Fetched<T> {
    Records(Vec<T>),
    Unauthorized,
}

impl<T> Fetched<T> {
    fn is_unauthorized(&self) -> bool {
        matches!(self, Fetched::Unauthorized)
    }

    fn into_records(self) -> Vec<T> {
        match self {
            Fetched::Records(records) => records,
            Fetched::Unauthorized => Vec::new(),
        }
    }
}

enum FetchRound {
    Collected(RecordSets),
    Unauthorized,
}

/// Runs refresh cycles: token, fan-out fetch, aggregation, publish
pub struct FetchCoordinator<H, S, C> {
    api: Client<H>,
    auth: Arc<OAuthManager<H, S>>,
    channel: Arc<C>,
    cache: Option<SnapshotCache>,
    variant: Variant,
    today: Option<NaiveDate>,
}

impl<H, S, C> FetchCoordinator<H, S, C>
where
    H: HttpClient,
    S: CredentialStore,
    C: WatchChannel,
{
    pub fn new(
        api: Client<H>,
        auth: Arc<OAuthManager<H, S>>,
        channel: Arc<C>,
        variant: Variant,
    ) -> Self {
        Self {
            api,
            auth,
            channel,
            cache: None,
            variant,
            today: None,
        }
    }

    /// Keep every published snapshot in `cache`
    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Pin "today" instead of reading the local clock
    pub fn anchored_on(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn auth(&self) -> &OAuthManager<H, S> {
        &self.auth
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn window(&self) -> FetchWindow {
        self.today
            .map(FetchWindow::for_today)
            .unwrap_or_else(FetchWindow::current)
    }

    /// One refresh cycle from token lookup to publish
    pub async fn refresh_scores(&self) -> Result<CycleOutcome, CycleError> {
        match self.auth.valid_token().await? {
            TokenStatus::Valid(access_token) => self.fetch_and_publish(access_token).await,
            TokenStatus::Unauthenticated => self.report_unauthorized().await,
            TokenStatus::Deferred => {
                tracing::info!("Token refresh deferred, skipping this cycle");
                Ok(CycleOutcome::Deferred)
            }
        }
    }

    /// Fetch with `access_token`, refreshing and retrying once on a 401
    pub async fn fetch_and_publish(
        &self,
        access_token: String,
    ) -> Result<CycleOutcome, CycleError> {
        let mut access_token = access_token;
        let mut refreshed = false;

        loop {
            let window = self.window();
            tracing::info!(
                "Fetching scores {} to {}",
                window.start_date,
                window.end_date
            );

            match self.fetch_round(&access_token, &window).await {
                FetchRound::Collected(records) => {
                    let snapshot = aggregate(&records, &window);
                    return self.publish(snapshot).await;
                }
                FetchRound::Unauthorized if refreshed => {
                    tracing::warn!("Still unauthorized after refresh");
                    return self.report_unauthorized().await;
                }
                FetchRound::Unauthorized => {
                    tracing::info!("Got 401, attempting token refresh");
                    refreshed = true;

                    match self.auth.refresh().await? {
                        RefreshOutcome::Refreshed(token) => access_token = token,
                        RefreshOutcome::Deferred => {
                            tracing::info!("Refresh deferred, abandoning cycle");
                            return Ok(CycleOutcome::Deferred);
                        }
                        RefreshOutcome::Rejected => return self.report_unauthorized().await,
                    }
                }
            }
        }
    }

    // Every fetch settles before the round is judged
    async fn fetch_round(&self, access_token: &str, window: &FetchWindow) -> FetchRound {
        let (daily_sleep, daily_readiness, daily_activity, daily_stress, sleep_periods) =
            futures::join!(
                self.fetch(Request::daily_sleep().list(window), access_token),
                self.fetch(Request::daily_readiness().list(window), access_token),
                self.fetch(Request::daily_activity().list(window), access_token),
                self.fetch(Request::daily_stress().list(window), access_token),
                self.fetch(Request::sleep().list(window), access_token),
            );

        if daily_sleep.is_unauthorized()
            || daily_readiness.is_unauthorized()
            || daily_activity.is_unauthorized()
            || daily_stress.is_unauthorized()
            || sleep_periods.is_unauthorized()
        {
            return FetchRound::Unauthorized;
        }

        FetchRound::Collected(RecordSets {
            daily_sleep: daily_sleep.into_records(),
            daily_readiness: daily_readiness.into_records(),
            daily_activity: daily_activity.into_records(),
            daily_stress: daily_stress.into_records(),
            sleep_periods: sleep_periods.into_records(),
        })
    }

    async fn fetch<T: DailyRecord>(
        &self,
        request: ListCollection<T>,
        access_token: &str,
    ) -> Fetched<T> {
        let collection = request.collection();
        if !self.variant.collections().contains(&collection) {
            return Fetched::Records(Vec::new());
        }

        match self.api.send(access_token, &request).await {
            Ok(records) => {
                tracing::debug!("Fetched {} records from {}", records.len(), collection);
                Fetched::Records(records)
            }
            Err(HttpError::Unauthorized) => {
                tracing::warn!("{} returned 401", collection);
                Fetched::Unauthorized
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}, using empty data: {}", collection, e);
                Fetched::Records(Vec::new())
            }
        }
    }

    /// Send a snapshot and remember it for the next start-up
    pub async fn publish(&self, snapshot: ScoreSnapshot) -> Result<CycleOutcome, CycleError> {
        let scores = snapshot.scores();
        tracing::info!(
            "Sending scores: sleep {}, readiness {}, activity {}",
            scores.sleep,
            scores.readiness,
            scores.activity
        );

        self.send_snapshot(&snapshot).await?;

        if let Some(cache) = &self.cache {
            match cache.set_snapshot(&snapshot).await {
                Ok(()) => tracing::debug!("Cached snapshot updated"),
                Err(e) => tracing::warn!("Failed to cache snapshot: {}", e),
            }
        }

        Ok(CycleOutcome::Published(snapshot))
    }

    /// Send a snapshot in the shape the watch variant expects
    pub async fn send_snapshot(&self, snapshot: &ScoreSnapshot) -> Result<(), CycleError> {
        let message = match self.variant {
            Variant::App => WatchMessage::Scores(snapshot.clone()),
            Variant::Watchface => WatchMessage::Headline(snapshot.scores()),
        };
        self.channel.send(&message).await?;
        Ok(())
    }

    /// Send the cached snapshot, if any. Returns whether one was sent.
    pub async fn send_cached(&self) -> Result<bool, CycleError> {
        let Some(cache) = &self.cache else {
            return Ok(false);
        };

        match cache.get_snapshot().await {
            Ok(Some(cached)) => {
                tracing::debug!("Sending cached snapshot from {}", cached.cached_at);
                self.send_snapshot(&cached.snapshot).await?;
                Ok(true)
            }
            Ok(None) => {
                tracing::debug!("No cached snapshot found");
                Ok(false)
            }
            Err(e) => {
                tracing::warn!("Failed to read cached snapshot: {}", e);
                Ok(false)
            }
        }
    }

    /// Tell the watch the user has to authorize again
    pub async fn report_unauthorized(&self) -> Result<CycleOutcome, CycleError> {
        tracing::info!("Sending AUTH_STATUS=0 to watch");
        self.channel.send(&WatchMessage::Unauthorized).await?;
        Ok(CycleOutcome::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{bridge_fixture, collection, BridgeFixture};
    use oura_api::endpoints::Collection;
    use ourawatch_auth::Credential;
    use serde_json::json;

    #[tokio::test]
    async fn missing_token_reports_unauthorized() {
        let BridgeFixture {
            http,
            channel,
            coordinator,
            ..
        } = bridge_fixture(None, Variant::App);

        let outcome = coordinator.refresh_scores().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Unauthorized);
        assert_eq!(channel.messages(), vec![WatchMessage::Unauthorized]);
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn failing_endpoint_degrades_to_sentinels() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        fixture.script_scores();
        fixture
            .http
            .respond("daily_activity", Err(HttpError::Status(500)));

        let outcome = fixture.coordinator.refresh_scores().await.unwrap();

        let CycleOutcome::Published(snapshot) = outcome else {
            panic!("expected a published snapshot, got {:?}", outcome);
        };
        assert_eq!(snapshot.scores().sleep, 90);
        assert_eq!(snapshot.scores().activity, -1);
        assert_eq!(fixture.channel.messages().len(), 1);
    }

    #[tokio::test]
    async fn watchface_fetches_three_endpoints_and_sends_headline() {
        let fixture = bridge_fixture(Some("tok"), Variant::Watchface);
        fixture.script_scores();

        fixture.coordinator.refresh_scores().await.unwrap();

        for collection in Collection::ALL {
            let expected = usize::from(Variant::Watchface.collections().contains(&collection));
            assert_eq!(fixture.http.count(collection.path()), expected);
        }
        assert!(matches!(
            fixture.channel.messages().as_slice(),
            [WatchMessage::Headline(scores)] if scores.sleep == 90
        ));
    }

    #[tokio::test]
    async fn empty_data_is_not_an_error() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        for endpoint in Collection::ALL {
            fixture
                .http
                .respond_always(endpoint.path(), Ok(collection(json!([]))));
        }

        let outcome = fixture.coordinator.refresh_scores().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Published(ScoreSnapshot::default()));
    }

    #[tokio::test]
    async fn unauthorized_twice_gives_up() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        fixture.script_scores();
        fixture
            .http
            .respond_always("daily_stress", Err(HttpError::Unauthorized));
        fixture.http.respond(
            "token",
            Ok(json!({ "access_token": "fresh", "expires_in": 86400 })),
        );

        let outcome = fixture.coordinator.refresh_scores().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Unauthorized);
        assert_eq!(fixture.http.count("token"), 1);
        assert_eq!(fixture.http.count("daily_stress"), 2);
        assert_eq!(fixture.channel.messages(), vec![WatchMessage::Unauthorized]);
    }

    #[tokio::test]
    async fn rejected_refresh_after_401_reports_once_and_clears_tokens() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        fixture.script_scores();
        fixture
            .http
            .respond("daily_sleep", Err(HttpError::Unauthorized))
            .respond("token", Err(HttpError::Status(400)));

        let outcome = fixture.coordinator.refresh_scores().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Unauthorized);
        assert_eq!(fixture.channel.messages(), vec![WatchMessage::Unauthorized]);
        assert_eq!(fixture.http.count("token"), 1);
        assert_eq!(fixture.http.count("daily_sleep"), 1);
        assert_eq!(fixture.store.get().unwrap(), Credential::default());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_refresh_after_401_is_silent() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        fixture.script_scores();
        fixture
            .http
            .respond("daily_sleep", Err(HttpError::Unauthorized))
            .respond_always("token", Err(HttpError::Network("offline".into())));

        let outcome = fixture.coordinator.refresh_scores().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Deferred);
        assert!(fixture.channel.messages().is_empty());
        assert_eq!(fixture.http.count("token"), 3);
        assert_eq!(fixture.http.count("daily_sleep"), 1);

        let credential = fixture.store.get().unwrap();
        assert_eq!(credential.access_token.as_deref(), Some("tok"));
        assert_eq!(credential.refresh_token.as_deref(), Some("refresh-token"));
    }

    #[tokio::test]
    async fn published_snapshot_is_cached() {
        let fixture = bridge_fixture(Some("tok"), Variant::App);
        let cache_dir =
            std::env::temp_dir().join(format!("ourawatch-coordinator-{}", std::process::id()));
        let cache = SnapshotCache::at(&cache_dir).await.unwrap();
        cache.clear().await.unwrap();
        fixture.script_scores();
        let coordinator = fixture.coordinator.with_cache(cache.clone());

        assert!(!coordinator.send_cached().await.unwrap());
        coordinator.refresh_scores().await.unwrap();
        assert!(coordinator.send_cached().await.unwrap());

        let cached = cache.get_snapshot().await.unwrap().unwrap();
        assert_eq!(cached.snapshot.scores().sleep, 90);
        assert_eq!(fixture.channel.messages().len(), 2);
    }
}
