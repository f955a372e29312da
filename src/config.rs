// Configuration management for the pump/dump voting simulator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceConfig {
    #[serde(default = "default_initial_price")]
    pub initial_price: f64,
    #[serde(default = "default_initial_price")]
    pub floor: f64,
    #[serde(default = "default_volatility")]
    pub volatility: f64,              // Random walk budget per tick (fraction of price)
    #[serde(default = "default_trend_up_probability")]
    pub trend_up_probability: f64,
    #[serde(default = "default_trend_magnitude")]
    pub trend_magnitude: f64,
    #[serde(default = "default_vote_influence")]
    pub vote_influence: f64,          // Drift per tick at 100% pump share
    #[serde(default = "default_vote_impact_cap")]
    pub vote_impact_cap: f64,         // 0.3% max nudge per vote
    #[serde(default = "default_round_shock_scale")]
    pub round_shock_scale: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            initial_price: default_initial_price(),
            floor: default_initial_price(),
            volatility: default_volatility(),
            trend_up_probability: default_trend_up_probability(),
            trend_magnitude: default_trend_magnitude(),
            vote_influence: default_vote_influence(),
            vote_impact_cap: default_vote_impact_cap(),
            round_shock_scale: default_round_shock_scale(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundConfig {
    #[serde(default = "default_round_duration")]
    pub duration_seconds: u64,
    #[serde(default = "default_true")]
    pub restart_timer_on_reset: bool,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            duration_seconds: default_round_duration(),
            restart_timer_on_reset: true,
        }
    }
}

/// Percentages reported while a round has no votes yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptySplit {
    Zero,
    Even,
}

impl EmptySplit {
    pub fn percentages(self) -> (u8, u8) {
        match self {
            EmptySplit::Zero => (0, 0),
            EmptySplit::Even => (50, 50),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingConfig {
    #[serde(default = "default_true")]
    pub allow_switch: bool,
    #[serde(default = "default_empty_split")]
    pub empty_split: EmptySplit,
    #[serde(default)]
    pub reset_seed_max: u64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            allow_switch: true,
            empty_split: default_empty_split(),
            reset_seed_max: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    #[serde(default = "default_candle_duration")]
    pub candle_duration_seconds: u64,
    #[serde(default = "default_volume_min")]
    pub volume_min: f64,
    #[serde(default = "default_volume_max")]
    pub volume_max: f64,
    #[serde(default = "default_true")]
    pub prefill_history: bool,
}

impl Default for CandleConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            history_size: default_history_size(),
            candle_duration_seconds: default_candle_duration(),
            volume_min: default_volume_min(),
            volume_max: default_volume_max(),
            prefill_history: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default = "default_true")]
    pub auto_approve: bool,
    #[serde(default = "default_wallet")]
    pub wallet: String,               // Injected provider; only phantom is supported
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            auto_approve: true,
            wallet: default_wallet(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub enable_price_logging: bool,
    #[serde(default = "default_true")]
    pub enable_vote_logging: bool,
    #[serde(default = "default_true")]
    pub enable_round_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            enable_price_logging: false,
            enable_vote_logging: true,
            enable_round_logging: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub price: PriceConfig,
    #[serde(default)]
    pub round: RoundConfig,
    #[serde(default)]
    pub voting: VotingConfig,
    #[serde(default)]
    pub candles: CandleConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

pub const SUPPORTED_WALLET: &str = "phantom";

/// Longest round or candle that still fits a chrono duration
pub const MAX_DURATION_SECONDS: u64 = (i64::MAX / 1000) as u64;

// Default value functions
fn default_initial_price() -> f64 { 0.00004 }
fn default_volatility() -> f64 { 0.02 }
fn default_trend_up_probability() -> f64 { 0.55 }
fn default_trend_magnitude() -> f64 { 0.001 }
fn default_vote_influence() -> f64 { 0.0005 }
fn default_vote_impact_cap() -> f64 { 0.003 }
fn default_round_shock_scale() -> f64 { 0.2 }
fn default_round_duration() -> u64 { 60 * 60 }
fn default_empty_split() -> EmptySplit { EmptySplit::Zero }
fn default_window_size() -> usize { 20 }
fn default_history_size() -> usize { 60 }
fn default_candle_duration() -> u64 { 60 }
fn default_volume_min() -> f64 { 100.0 }
fn default_volume_max() -> f64 { 1000.0 }
fn default_tick_interval() -> u64 { 500 }
fn default_wallet() -> String { SUPPORTED_WALLET.to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_true() -> bool { true }

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            tracing::info!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let price = &self.price;

        let floats = [
            ("initial_price", price.initial_price),
            ("floor", price.floor),
            ("volatility", price.volatility),
            ("trend_up_probability", price.trend_up_probability),
            ("trend_magnitude", price.trend_magnitude),
            ("vote_influence", price.vote_influence),
            ("vote_impact_cap", price.vote_impact_cap),
            ("round_shock_scale", price.round_shock_scale),
            ("volume_min", self.candles.volume_min),
            ("volume_max", self.candles.volume_max),
        ];
        if let Some((name, _)) = floats.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigError::Validation(format!("{} must be a finite number", name)));
        }

        if price.initial_price <= 0.0 {
            return Err(ConfigError::Validation("initial_price must be positive".to_string()));
        }

        if price.floor <= 0.0 {
            return Err(ConfigError::Validation("floor must be positive".to_string()));
        }

        if price.floor > price.initial_price {
            return Err(ConfigError::Validation("floor must not exceed initial_price".to_string()));
        }

        if !(0.0..=1.0).contains(&price.volatility) {
            return Err(ConfigError::Validation("volatility must be within [0, 1]".to_string()));
        }

        if !(0.0..=1.0).contains(&price.trend_up_probability) {
            return Err(ConfigError::Validation("trend_up_probability must be within [0, 1]".to_string()));
        }

        if price.trend_magnitude < 0.0 || price.vote_influence < 0.0 || price.vote_impact_cap < 0.0 {
            return Err(ConfigError::Validation("trend and vote factors must be non-negative".to_string()));
        }

        if !(0.0..=2.0).contains(&price.round_shock_scale) {
            return Err(ConfigError::Validation("round_shock_scale must be within [0, 2]".to_string()));
        }

        if self.round.duration_seconds == 0 || self.round.duration_seconds > MAX_DURATION_SECONDS {
            return Err(ConfigError::Validation(format!(
                "duration_seconds must be within 1..={}",
                MAX_DURATION_SECONDS
            )));
        }

        if self.candles.window_size == 0 || self.candles.history_size == 0 {
            return Err(ConfigError::Validation("candle window sizes must be greater than 0".to_string()));
        }

        if self.candles.candle_duration_seconds == 0 || self.candles.candle_duration_seconds > MAX_DURATION_SECONDS {
            return Err(ConfigError::Validation(format!(
                "candle_duration_seconds must be within 1..={}",
                MAX_DURATION_SECONDS
            )));
        }

        if self.candles.volume_min < 0.0 || self.candles.volume_min > self.candles.volume_max {
            return Err(ConfigError::Validation("volume range must satisfy 0 <= volume_min <= volume_max".to_string()));
        }

        if !(100..=1000).contains(&self.engine.tick_interval_ms) {
            return Err(ConfigError::Validation("tick_interval_ms must be within 100..=1000".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.round.duration_seconds, 3600);
        assert_eq!(config.candles.window_size, 20);
        assert_eq!(config.voting.empty_split, EmptySplit::Zero);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[round]\nduration_seconds = 480\n")
            .expect("partial config should load");
        assert_eq!(config.round.duration_seconds, 480);
        assert_eq!(config.engine.tick_interval_ms, 500);
        assert_eq!(config.price.initial_price, 0.00004);
    }

    #[test]
    fn test_empty_split_parses_lowercase() {
        let config = Config::from_toml_str("[voting]\nempty_split = \"even\"\n").unwrap();
        assert_eq!(config.voting.empty_split.percentages(), (50, 50));
    }

    #[test]
    fn test_floor_above_initial_rejected() {
        let mut config = Config::default();
        config.price.floor = 1.0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_tick_interval_bounds() {
        let mut config = Config::default();
        config.engine.tick_interval_ms = 50;
        assert!(config.validate().is_err());
        config.engine.tick_interval_ms = 1000;
        assert!(config.validate().is_ok());
    }
}
