// Pump/Dump Voting Simulator Library
//
// A countdown drives voting rounds, votes bias a random-walk price, and the
// resulting series is bucketed into OHLC candles for a chart sink.

pub mod core;
pub mod clients;
pub mod config;
pub mod error;       // Unified error handling
pub mod progress;
pub mod simulation;

// Re-export core simulation types
pub use core::{
    Candle, CandleAggregator, Identity, PricePoint, PriceSimulator, PriceState, RoundController,
    RoundOutcome, RoundParticipants, RoundPhase, RoundReport, RoundState, VoteChange,
    VoteDirection, VoteState, VoteTally,
};

// Re-export error types
pub use error::{GameError, GameResult};

// Re-export client types
pub use clients::{
    DashboardFrame, IdentityProvider, JsonLinesSink, Notice, NoticeLevel, RecordingSink,
    RenderMode, RenderSink, TracingRenderSink, WalletIdentityProvider,
};

// Re-export configuration
pub use config::{
    CandleConfig, Config, ConfigError, EmptySplit, EngineConfig, IdentityConfig, LoggingConfig,
    PriceConfig, RoundConfig, VotingConfig,
};

// Re-export simulation components
pub use simulation::{
    Command, GameRunner, Scheduler, SimulationEngine, SimulationEngineBuilder, SimulationStats,
    TimerKind, VoterScript,
};

pub use progress::SimulationProgress;
