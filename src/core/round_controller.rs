// Countdown and round lifecycle

use crate::config::RoundConfig;
use crate::core::candle_aggregator::CandleAggregator;
use crate::core::price_simulator::PriceSimulator;
use crate::core::types::{format_price, RoundOutcome, RoundPhase, VoteDirection};
use crate::core::vote_tally::VoteTally;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoundState {
    pub remaining_seconds: u64,
    pub phase: RoundPhase,
}

/// Collaborators borrowed for the duration of one resolution
pub struct RoundParticipants<'a> {
    pub tally: &'a mut VoteTally,
    pub simulator: &'a mut PriceSimulator,
    pub candles: &'a mut CandleAggregator,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub round_number: u64,
    pub outcome: RoundOutcome,
    pub pump_votes: u64,
    pub dump_votes: u64,
    pub multiplier: f64,
    pub price_before: f64,
    pub price_after: f64,
    pub settled_at: DateTime<Utc>,
}

impl RoundReport {
    pub fn message(&self) -> &'static str {
        self.outcome.message()
    }
}

#[derive(Debug, Clone)]
pub struct RoundController {
    state: RoundState,
    round_number: u64,
    config: RoundConfig,
    log_rounds: bool,
}

impl RoundController {
    pub fn new(config: RoundConfig) -> Self {
        Self {
            state: RoundState {
                remaining_seconds: config.duration_seconds,
                phase: RoundPhase::Idle,
            },
            round_number: 1,
            config,
            log_rounds: true,
        }
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_rounds = enabled;
        self
    }

    pub fn start(&mut self) {
        self.state = RoundState {
            remaining_seconds: self.config.duration_seconds,
            phase: RoundPhase::Active,
        };
    }

    pub fn state(&self) -> RoundState {
        self.state
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    pub fn is_active(&self) -> bool {
        self.state.phase == RoundPhase::Active
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn duration_seconds(&self) -> u64 {
        self.config.duration_seconds
    }

    /// `HH:MM:SS` of the remaining time
    pub fn countdown_label(&self) -> String {
        let secs = self.state.remaining_seconds;
        format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
    }

    /// Advance the countdown by one second, resolving the round when it hits zero.
    /// Does nothing unless the round is active.
    pub fn on_second(&mut self, participants: RoundParticipants<'_>, now: DateTime<Utc>) -> Option<RoundReport> {
        if self.state.phase != RoundPhase::Active {
            return None;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        if self.state.remaining_seconds == 0 {
            Some(self.resolve(participants, now))
        } else {
            None
        }
    }

    /// Run the resolution sequence: majority, shock, settlement candle,
    /// tally reset, countdown reset. Collaborator failures are logged and
    /// never prevent the reset.
    pub fn resolve(&mut self, participants: RoundParticipants<'_>, now: DateTime<Utc>) -> RoundReport {
        let RoundParticipants { tally, simulator, candles } = participants;
        self.state.phase = RoundPhase::Resolving;

        let outcome = tally.outcome();
        let pump_votes = tally.count(VoteDirection::Pump);
        let dump_votes = tally.count(VoteDirection::Dump);

        let price_before = simulator.current_price();
        let multiplier = simulator.apply_round_shock(&outcome);
        let price_after = simulator.current_price();

        if let Err(e) = candles.roll_new_candle_at(price_after, now) {
            warn!("⚠️  Settlement candle rejected: {}", e);
        }
        candles.append_history_point_at(price_after, now);

        tally.reset_for_new_round();

        let report = RoundReport {
            round_number: self.round_number,
            outcome,
            pump_votes,
            dump_votes,
            multiplier,
            price_before,
            price_after,
            settled_at: now,
        };

        if self.log_rounds {
            info!("🏁 Round {} resolved: {} (pump {} / dump {}) {} → {}",
                report.round_number,
                report.message(),
                pump_votes,
                dump_votes,
                format_price(price_before),
                format_price(price_after)
            );
        }

        self.round_number += 1;
        self.state = RoundState {
            remaining_seconds: self.config.duration_seconds,
            phase: RoundPhase::Active,
        };

        report
    }
}
