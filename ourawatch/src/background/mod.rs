pub mod fetch_coordinator;

use crate::channel::ChannelError;
use crate::snapshot::ScoreSnapshot;
use oura_api::endpoints::Collection;
use ourawatch_auth::AuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which watch program the bridge talks to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Full app with details and histories
    #[default]
    App,
    /// Watchface showing the three scores
    Watchface,
}

impl Variant {
    /// Endpoints fetched each cycle
    pub fn collections(&self) -> &'static [Collection] {
        match self {
            Variant::App => &Collection::ALL,
            Variant::Watchface => &[
                Collection::DailySleep,
                Collection::DailyReadiness,
                Collection::DailyActivity,
            ],
        }
    }
}

/// How a refresh cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published(ScoreSnapshot),
    /// The watch was told to ask for authorization
    Unauthorized,
    /// Token refresh failed transiently; nothing was sent
    Deferred,
}

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}
