pub mod aggregator;
pub mod app;
pub mod background;
pub mod cache;
pub mod channel;
pub mod config;
pub mod events;
pub mod logging;
pub mod message;
pub mod mock;
pub mod snapshot;
mod utils;

pub use app::{live_bridge, Bridge, LiveBridge, ScoreSource};
pub use background::{fetch_coordinator::FetchCoordinator, CycleOutcome, Variant};
pub use config::Settings;

// Always expose testing module (integration tests need it)
pub mod testing;
