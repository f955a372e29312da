// Common test utilities and helpers
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pump_vote_sim::{Config, Identity, RecordingSink, SimulationEngine};

/// Configuration with the random walk switched off so prices only move on votes and shocks
pub fn create_test_config() -> Config {
    let mut config = Config::default();
    config.price.volatility = 0.0;
    config.price.trend_magnitude = 0.0;
    config.price.floor = 0.00001;
    config.round.duration_seconds = 5;
    config.logging.enable_vote_logging = false;
    config
}

/// Fixed clock origin
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

/// Seeded engine wired to a recording sink
pub fn create_test_engine(config: Config) -> (SimulationEngine, RecordingSink) {
    let sink = RecordingSink::new();
    let engine = SimulationEngine::builder(config)
        .with_render_sink(sink.clone())
        .with_seed(42)
        .started_at(t0())
        .build()
        .expect("Failed to build test engine");
    (engine, sink)
}

/// Distinct voter identities
pub fn voters(count: usize) -> Vec<Identity> {
    (0..count).map(|i| Identity::new(format!("voter-{:03}", i))).collect()
}
