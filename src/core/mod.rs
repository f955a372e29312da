// Core simulation modules

pub mod types;
pub mod price_simulator;
pub mod vote_tally;
pub mod round_controller;
pub mod candle_aggregator;

// Re-export commonly used types
pub use types::{format_price, Identity, PricePoint, RoundOutcome, RoundPhase, VoteDirection};
pub use price_simulator::{PriceSimulator, PriceState};
pub use vote_tally::{VoteChange, VoteState, VoteTally};
pub use round_controller::{RoundController, RoundParticipants, RoundReport, RoundState};
pub use candle_aggregator::{Candle, CandleAggregator};
