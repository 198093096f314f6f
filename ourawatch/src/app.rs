use anyhow::Result;
use oura_api::{Client, HttpClient, ReqwestClient};
use ourawatch_auth::{parse_authorization_response, CredentialStore, OAuthManager, TokenStore};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::background::fetch_coordinator::FetchCoordinator;
use crate::background::{CycleError, CycleOutcome};
use crate::cache::SnapshotCache;
use crate::channel::{StreamChannel, WatchChannel};
use crate::config::Settings;
use crate::events::InboundEvent;
use crate::mock::demo_snapshot;

/// Where cycle snapshots come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreSource {
    /// The Oura API
    #[default]
    Live,
    /// The fixed demo snapshot; no network access
    Mock,
}

/// Long-running relay between the Oura API and the watch
pub struct Bridge<H, S, C> {
    coordinator: FetchCoordinator<H, S, C>,
    refresh_interval: Duration,
    source: ScoreSource,
}

pub type LiveBridge = Bridge<ReqwestClient, TokenStore, StreamChannel<tokio::io::Stdout>>;

impl<H, S, C> Bridge<H, S, C>
where
    H: HttpClient,
    S: CredentialStore,
    C: WatchChannel,
{
    pub fn new(coordinator: FetchCoordinator<H, S, C>, refresh_interval: Duration) -> Self {
        Self {
            coordinator,
            refresh_interval,
            source: ScoreSource::Live,
        }
    }

    pub fn with_source(mut self, source: ScoreSource) -> Self {
        self.source = source;
        self
    }

    pub fn coordinator(&self) -> &FetchCoordinator<H, S, C> {
        &self.coordinator
    }

    /// Run one refresh cycle. Failures are logged, not returned.
    pub async fn cycle(&self) -> Option<CycleOutcome> {
        let result = match self.source {
            ScoreSource::Live => self.coordinator.refresh_scores().await,
            ScoreSource::Mock => {
                tracing::info!("Sending demo scores");
                let snapshot = demo_snapshot();
                self.coordinator
                    .send_snapshot(&snapshot)
                    .await
                    .map(|()| CycleOutcome::Published(snapshot))
            }
        };

        match result {
            Ok(outcome) => {
                tracing::debug!("Cycle finished: {:?}", outcome);
                Some(outcome)
            }
            Err(e) => {
                tracing::error!("Refresh cycle failed: {}", e);
                None
            }
        }
    }

    /// Finish authorization with the payload returned by the consent page.
    ///
    /// A cancelled or empty payload does nothing. A successful exchange runs
    /// a cycle straight away; a failed one tells the watch to ask again.
    pub async fn complete_authorization(
        &self,
        response: &str,
    ) -> Result<Option<CycleOutcome>, CycleError> {
        let Some(code) = parse_authorization_response(response)? else {
            tracing::info!("Authorization cancelled");
            return Ok(None);
        };

        match self.coordinator.auth().exchange_code(&code).await {
            Ok(()) => self.coordinator.refresh_scores().await.map(Some),
            Err(e) => {
                tracing::warn!("Code exchange failed: {}", e);
                self.coordinator.report_unauthorized().await.map(Some)
            }
        }
    }

    async fn send_cached(&self) {
        if self.source == ScoreSource::Mock {
            return;
        }
        if let Err(e) = self.coordinator.send_cached().await {
            tracing::warn!("Failed to send cached snapshot: {}", e);
        }
    }

    /// Relay until `shutdown` resolves.
    ///
    /// Sends the cached snapshot, then runs a cycle immediately and on every
    /// interval tick. A request from the watch resends the cached snapshot
    /// and runs an extra cycle. Cycles never overlap.
    pub async fn run<F>(&self, mut inbound: mpsc::UnboundedReceiver<InboundEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            "Bridge running, refreshing every {}s",
            self.refresh_interval.as_secs()
        );
        self.send_cached().await;

        let mut interval = tokio::time::interval(self.refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut inbound_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, exiting event loop");
                    break;
                }
                _ = interval.tick() => {
                    self.cycle().await;
                }
                event = inbound.recv(), if inbound_open => {
                    match event {
                        Some(InboundEvent::RequestScores) => {
                            let queued = drain_pending(&mut inbound);
                            tracing::info!("Watch requested scores ({} more queued)", queued);
                            self.send_cached().await;
                            self.cycle().await;
                        }
                        None => {
                            tracing::debug!("Inbound channel closed, periodic refresh only");
                            inbound_open = false;
                        }
                    }
                }
            }
        }
    }
}

// Requests that piled up during a cycle are answered by the next one
fn drain_pending(inbound: &mut mpsc::UnboundedReceiver<InboundEvent>) -> usize {
    std::iter::from_fn(|| inbound.try_recv().ok()).count()
}

/// Bridge wired to the Oura API, the on-disk credential and stdout
pub async fn live_bridge(settings: &Settings, source: ScoreSource) -> Result<LiveBridge> {
    if source == ScoreSource::Live {
        settings.validate().map_err(anyhow::Error::msg)?;
    }

    let http = Arc::new(ReqwestClient::new()?);
    let store = Arc::new(TokenStore::new()?);
    let auth = Arc::new(OAuthManager::new(
        http.clone(),
        store,
        settings.oauth_config(),
    ));
    let api = Client::with_base_url(http, settings.api.base_url.clone());
    let channel = Arc::new(StreamChannel::stdout(settings.bridge.wire));

    let mut coordinator = FetchCoordinator::new(api, auth, channel, settings.bridge.variant);
    match SnapshotCache::new().await {
        Ok(cache) => coordinator = coordinator.with_cache(cache),
        Err(e) => tracing::warn!("Snapshot cache unavailable: {}", e),
    }

    Ok(Bridge::new(coordinator, settings.bridge.refresh_interval()).with_source(source))
}
