// Price random walk with vote-weighted drift
//
// Three perturbation tiers, in increasing weight: continuous tick drift,
// per-vote nudge, and the one-time round shock.

use crate::config::PriceConfig;
use crate::core::types::{RoundOutcome, VoteDirection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceState {
    pub current_price: f64,
    pub initial_price: f64,
    pub floor: f64,
}

#[derive(Debug, Clone)]
pub struct PriceSimulator {
    state: PriceState,
    config: PriceConfig,
    rng: StdRng,
}

impl PriceSimulator {
    pub fn new(config: PriceConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            state: PriceState {
                current_price: config.initial_price,
                initial_price: config.initial_price,
                floor: config.floor,
            },
            config,
            rng,
        }
    }

    pub fn current_price(&self) -> f64 {
        self.state.current_price
    }

    pub fn state(&self) -> PriceState {
        self.state
    }

    /// Percentage change since the simulation started
    pub fn growth_since_start(&self) -> f64 {
        (self.state.current_price - self.state.initial_price) / self.state.initial_price * 100.0
    }

    /// Apply one random-walk step.
    ///
    /// `pump_percentage` is the live pump share of the current round, or
    /// `None` while no votes exist (no vote influence is applied then).
    pub fn tick(&mut self, pump_percentage: Option<u8>) -> f64 {
        let price = self.state.current_price;

        let perturbation = self.rng.gen_range(-1.0..=1.0) * price * self.config.volatility;

        let trend = if self.rng.gen_bool(self.config.trend_up_probability) {
            price * self.config.trend_magnitude
        } else {
            -price * self.config.trend_magnitude
        };

        let vote_influence = pump_percentage
            .map(|pct| (f64::from(pct) - 50.0) / 50.0 * price * self.config.vote_influence)
            .unwrap_or(0.0);

        self.set_clamped(price + perturbation + trend + vote_influence);
        self.state.current_price
    }

    /// Immediate nudge for a single vote, proportional to the voted
    /// direction's share and capped at `vote_impact_cap` of the price.
    pub fn apply_vote_impact(&mut self, direction: VoteDirection, share_pct: u8) -> f64 {
        let cap = self.config.vote_impact_cap;
        let impact = (f64::from(share_pct.min(100)) / 100.0 * cap).min(cap);
        let price = self.state.current_price;

        self.set_clamped(price + direction.sign() * price * impact);
        debug!("🗳️  Vote impact {} {:.3}% → {:.8}", direction, impact * 100.0, self.state.current_price);
        self.state.current_price
    }

    /// Round-resolution shock. Returns the multiplier applied
    /// (1.0 for a tie or an empty round).
    pub fn apply_round_shock(&mut self, outcome: &RoundOutcome) -> f64 {
        let scale = self.config.round_shock_scale;
        let multiplier = match *outcome {
            RoundOutcome::PumpWins { share } => 1.0 + (share - 0.5).clamp(0.0, 0.5) * scale,
            RoundOutcome::DumpWins { share } => 1.0 - (share - 0.5).clamp(0.0, 0.5) * scale,
            RoundOutcome::Tie | RoundOutcome::NoVotes => return 1.0,
        };

        let price = self.state.current_price;
        self.set_clamped(price * multiplier);
        multiplier
    }

    fn set_clamped(&mut self, price: f64) {
        // Floor also absorbs NaN
        self.state.current_price = if price >= self.state.floor {
            price
        } else {
            self.state.floor
        };
    }
}
