// Integration tests for configuration loading and validation

mod common;

use common::create_test_config;
use pump_vote_sim::config::MAX_DURATION_SECONDS;
use pump_vote_sim::{Config, ConfigError, EmptySplit, RecordingSink, SimulationEngine};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.price.initial_price, 0.00004);
    assert_eq!(config.price.floor, 0.00004);
    assert_eq!(config.price.vote_impact_cap, 0.003);
    assert_eq!(config.round.duration_seconds, 3600);
    assert_eq!(config.candles.window_size, 20);
    assert_eq!(config.candles.history_size, 60);
    assert_eq!(config.engine.tick_interval_ms, 500);
    assert_eq!(config.voting.empty_split, EmptySplit::Zero);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_file_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");

    let mut config = create_test_config();
    config.identity.public_key = Some("So11111111111111111111111111111111111111112".to_string());
    config.engine.seed = Some(9);
    config.to_file(&config_path).expect("Failed to save config");

    let loaded = Config::from_file(&config_path).expect("Failed to load config");

    assert_eq!(loaded.round.duration_seconds, 5);
    assert_eq!(loaded.price.floor, 0.00001);
    assert_eq!(loaded.engine.seed, Some(9));
    assert_eq!(loaded.identity.public_key, config.identity.public_key);
}

#[test]
fn test_load_or_create_writes_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("fresh.toml");
    assert!(!config_path.exists());

    let created = Config::load_or_create(&config_path).expect("Failed to create config");
    assert!(config_path.exists());

    let reloaded = Config::load_or_create(&config_path).expect("Failed to reload config");
    assert_eq!(created.round.duration_seconds, reloaded.round.duration_seconds);
    assert_eq!(created.price.initial_price, reloaded.price.initial_price);
}

#[test]
fn test_partial_toml_uses_defaults() {
    let config = Config::from_toml_str(
        r#"
[round]
duration_seconds = 120

[voting]
empty_split = "even"
allow_switch = false
"#,
    )
    .expect("Partial config should parse");

    assert_eq!(config.round.duration_seconds, 120);
    assert!(config.round.restart_timer_on_reset);
    assert_eq!(config.voting.empty_split, EmptySplit::Even);
    assert!(!config.voting.allow_switch);
    assert_eq!(config.price.initial_price, 0.00004);
    assert_eq!(config.candles.window_size, 20);
}

#[test]
fn test_missing_file_is_read_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let result = Config::from_file(temp_dir.path().join("non_existent.toml"));
    assert!(matches!(result, Err(ConfigError::FileRead(_))));
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("malformed.toml");
    fs::write(&config_path, "this is not valid toml {{{").expect("Failed to write malformed config");

    let result = Config::from_file(&config_path);
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let cases = [
        "[price]\ninitial_price = 0.00004\nfloor = 0.001\n",
        "[round]\nduration_seconds = 0\n",
        "[candles]\nwindow_size = 0\n",
        "[candles]\nvolume_min = 500.0\nvolume_max = 100.0\n",
        "[engine]\ntick_interval_ms = 5000\n",
        "[candles]\nvolume_max = inf\n",
        "[candles]\nvolume_min = nan\n",
        "[candles]\ncandle_duration_seconds = 9223372036854775807\n",
        "[round]\nduration_seconds = 9223372036854775807\n",
        "[price]\ninitial_price = nan\n",
        "[price]\nfloor = nan\n",
        "[price]\nvolatility = inf\n",
    ];

    for case in cases {
        let result = Config::from_toml_str(case);
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "expected validation failure for {:?}",
            case
        );
    }
}

#[test]
fn test_example_config_parses() {
    let example = include_str!("../config.toml.example");
    let config = Config::from_toml_str(example).expect("config.toml.example should be valid");

    assert_eq!(config.round.duration_seconds, Config::default().round.duration_seconds);
    assert_eq!(config.price.round_shock_scale, 0.2);
    assert!(config.identity.public_key.is_none());
}

#[test]
fn test_longest_valid_durations_build_and_tick() {
    let mut config = create_test_config();
    config.candles.candle_duration_seconds = MAX_DURATION_SECONDS;
    config.round.duration_seconds = MAX_DURATION_SECONDS;
    config.candles.volume_min = 500.0;
    config.candles.volume_max = 500.0;
    assert!(config.validate().is_ok());

    let mut engine = SimulationEngine::builder(config)
        .with_render_sink(RecordingSink::new())
        .started_at(common::t0())
        .build()
        .expect("Failed to build engine at the duration limit");
    engine.price_tick(common::t0() + chrono::Duration::seconds(1));
    engine.second_tick(common::t0() + chrono::Duration::seconds(1));

    assert_eq!(engine.candles().candle_count(), 1);
    assert!((engine.candles().current_candle().unwrap().volume - 500.0).abs() < 1e-9);
}
