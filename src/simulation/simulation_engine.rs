// Simulation Engine Orchestrator
// Coordinates price simulator, vote tally, round controller and candle aggregator

use crate::clients::identity::IdentityProvider;
use crate::clients::render::{DashboardFrame, Notice, RenderMode, RenderSink};
use crate::config::Config;
use crate::core::candle_aggregator::CandleAggregator;
use crate::core::price_simulator::PriceSimulator;
use crate::core::round_controller::{RoundController, RoundParticipants, RoundReport};
use crate::core::types::{format_price, Identity, RoundOutcome, VoteDirection};
use crate::core::vote_tally::{VoteChange, VoteTally};
use crate::error::{GameError, GameResult};
use crate::simulation::script::VoterScript;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Owns every piece of game state and the render sink
pub struct SimulationEngine {
    simulator: PriceSimulator,
    tally: VoteTally,
    rounds: RoundController,
    candles: CandleAggregator,
    sink: Box<dyn RenderSink>,
    identity: Option<Identity>,
    config: Config,
    stats: SimulationStats,
    /// Timestamp of the most recent event
    clock: DateTime<Utc>,
}

/// Statistics tracked by the simulation engine
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationStats {
    pub price_ticks: u64,
    pub votes_cast: u64,
    pub votes_switched: u64,
    pub votes_rejected: u64,
    pub rounds_resolved: u64,
    pub pump_wins: u64,
    pub dump_wins: u64,
    pub ties: u64,
    pub empty_rounds: u64,
    pub peak_price: f64,
    pub errors: u64,
}

/// Result of an accepted vote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteReceipt {
    pub direction: VoteDirection,
    pub change: VoteChange,
    pub share: u8,
    pub price: f64,
}

impl SimulationEngine {
    pub fn builder(config: Config) -> SimulationEngineBuilder {
        SimulationEngineBuilder::new(config)
    }

    pub fn simulator(&self) -> &PriceSimulator {
        &self.simulator
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    pub fn rounds(&self) -> &RoundController {
        &self.rounds
    }

    pub fn candles(&self) -> &CandleAggregator {
        &self.candles
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn clock(&self) -> DateTime<Utc> {
        self.clock
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::milliseconds(i64::try_from(self.config.engine.tick_interval_ms).unwrap_or(1000))
    }

    /// Connect an identity through `provider`. Failures become a notice.
    pub async fn connect<P: IdentityProvider>(&mut self, provider: &mut P) -> GameResult<Identity> {
        match provider.try_connect().await {
            Ok(identity) => {
                self.sink.notify(&Notice::info(format!("Connected: {}", identity.short())));
                self.identity = Some(identity.clone());
                self.render_dashboard();
                Ok(identity)
            }
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }

    /// One random-walk step, folded into the current candle
    pub fn price_tick(&mut self, now: DateTime<Utc>) -> f64 {
        self.clock = now;
        let price = self.simulator.tick(self.tally.pump_percentage());

        let folded = if self.candles.needs_roll(now) {
            self.candles.roll_new_candle_at(price, now)
        } else {
            self.candles.on_price_tick_at(price, now)
        };
        if let Err(e) = folded {
            self.report_error(&e);
        }
        self.candles.append_history_point_at(price, now);

        self.stats.price_ticks += 1;
        self.stats.peak_price = self.stats.peak_price.max(price);

        if self.config.logging.enable_price_logging {
            debug!("💹 Tick {} → {}", self.stats.price_ticks, format_price(price));
        }

        self.render_series(RenderMode::Immediate);
        price
    }

    /// Advance the round countdown by one second
    pub fn second_tick(&mut self, now: DateTime<Utc>) -> Option<RoundReport> {
        self.clock = now;
        let report = self.rounds.on_second(
            RoundParticipants {
                tally: &mut self.tally,
                simulator: &mut self.simulator,
                candles: &mut self.candles,
            },
            now,
        );

        if let Some(report) = &report {
            self.record_round(report);
            self.sink.notify(&Notice::info(report.message()));
            self.render_series(RenderMode::Animated);
        }

        self.render_dashboard();
        report
    }

    /// Vote as the connected identity
    pub fn cast_vote(&mut self, direction: VoteDirection, now: DateTime<Utc>) -> GameResult<VoteReceipt> {
        let result = match self.identity.clone() {
            Some(identity) => self.try_cast_vote(&identity, direction, now),
            None => Err(GameError::InvalidVoteState(
                "please connect your wallet to vote".to_string(),
            )),
        };
        self.finish_vote(result)
    }

    /// Vote on behalf of an arbitrary identity
    pub fn cast_vote_as(&mut self, identity: &Identity, direction: VoteDirection, now: DateTime<Utc>) -> GameResult<VoteReceipt> {
        let result = self.try_cast_vote(identity, direction, now);
        self.finish_vote(result)
    }

    fn try_cast_vote(&mut self, identity: &Identity, direction: VoteDirection, now: DateTime<Utc>) -> GameResult<VoteReceipt> {
        if !self.rounds.is_active() {
            return Err(GameError::InvalidVoteState(
                "voting is currently closed, wait for the next round".to_string(),
            ));
        }

        self.clock = now;
        let change = self.tally.cast_vote(identity, direction)?;
        let share = self.tally.share(direction);
        let price = self.simulator.apply_vote_impact(direction, share);

        if let Err(e) = self.candles.on_price_tick_at(price, now) {
            self.report_error(&e);
        }
        self.candles.append_history_point_at(price, now);

        if self.config.logging.enable_vote_logging {
            info!("🗳️  {} voted {} ({}% share) → {}", identity.short(), direction, share, format_price(price));
        }

        Ok(VoteReceipt { direction, change, share, price })
    }

    fn finish_vote(&mut self, result: GameResult<VoteReceipt>) -> GameResult<VoteReceipt> {
        match &result {
            Ok(receipt) => {
                self.stats.votes_cast += 1;
                if matches!(receipt.change, VoteChange::Switched { .. }) {
                    self.stats.votes_switched += 1;
                }
                self.stats.peak_price = self.stats.peak_price.max(receipt.price);
                self.render_series(RenderMode::Immediate);
                self.render_dashboard();
            }
            Err(e) => {
                self.stats.votes_rejected += 1;
                self.report_error(e);
            }
        }
        result
    }

    /// Run `seconds` of game time without a wall clock, letting `script` vote.
    /// `on_second` sees the engine after every simulated second.
    pub fn fast_forward<F: FnMut(u64, &SimulationEngine)>(
        &mut self,
        seconds: u64,
        script: &mut VoterScript,
        mut on_second: F,
    ) -> Vec<RoundReport> {
        let tick = self.tick_interval();
        let origin = self.clock;
        let mut reports = Vec::new();

        for second in 1..=seconds {
            let second_start = self.clock;
            let boundary = origin + Duration::seconds(i64::try_from(second).unwrap_or(i64::MAX / 1000));

            // Ticks restart from each boundary so the clock never drifts off game seconds
            let mut now = second_start + tick;
            while now <= boundary {
                self.price_tick(now);
                now = now + tick;
            }
            self.clock = boundary;

            let now = boundary;
            let state = self.rounds.state();
            for (identity, direction) in script.votes_for_second(
                self.rounds.round_number(),
                state.remaining_seconds,
                self.rounds.duration_seconds(),
            ) {
                // Rejections are already counted and surfaced as notices
                let _ = self.cast_vote_as(&identity, direction, now);
            }

            if let Some(report) = self.second_tick(now) {
                reports.push(report);
            }
            on_second(second, &*self);
        }

        reports
    }

    pub fn dashboard(&self) -> DashboardFrame {
        DashboardFrame {
            round_number: self.rounds.round_number(),
            countdown: self.rounds.countdown_label(),
            price: self.simulator.current_price(),
            growth_since_start: self.simulator.growth_since_start(),
            window_growth: self.candles.growth_rate(),
            votes: self.tally.state(),
            identity: self.identity.as_ref().map(Identity::short),
        }
    }

    fn record_round(&mut self, report: &RoundReport) {
        self.stats.rounds_resolved += 1;
        match report.outcome {
            RoundOutcome::PumpWins { .. } => self.stats.pump_wins += 1,
            RoundOutcome::DumpWins { .. } => self.stats.dump_wins += 1,
            RoundOutcome::Tie => self.stats.ties += 1,
            RoundOutcome::NoVotes => self.stats.empty_rounds += 1,
        }
        self.stats.peak_price = self.stats.peak_price.max(report.price_after);
    }

    fn report_error(&mut self, err: &GameError) {
        self.stats.errors += 1;
        warn!("❌ [{}] {}", err.category(), err);
        self.sink.notify(&Notice::from_error(err));
    }

    fn render_series(&mut self, mode: RenderMode) {
        self.sink.render_prices(self.candles.history_window(), mode);
        self.sink.render_candles(self.candles.candle_window(), mode);
    }

    fn render_dashboard(&mut self) {
        let frame = self.dashboard();
        self.sink.render_dashboard(&frame);
    }
}

/// Builder pattern for assembling an engine
pub struct SimulationEngineBuilder {
    config: Config,
    sink: Option<Box<dyn RenderSink>>,
    started_at: Option<DateTime<Utc>>,
}

impl SimulationEngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            sink: None,
            started_at: None,
        }
    }

    pub fn with_render_sink<S: RenderSink + 'static>(mut self, sink: S) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_boxed_sink(mut self, sink: Box<dyn RenderSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.engine.seed = Some(seed);
        self
    }

    /// Clock origin for the first candle and the history pre-fill
    pub fn started_at(mut self, time: DateTime<Utc>) -> Self {
        self.started_at = Some(time);
        self
    }

    pub fn build(self) -> GameResult<SimulationEngine> {
        self.config.validate()?;
        let mut sink = self.sink.ok_or(GameError::MissingRenderTarget)?;
        let config = self.config;
        let now = self.started_at.unwrap_or_else(Utc::now);

        // Independent streams per component, reproducible from one seed
        let seed = config.engine.seed;
        let derive = |offset: u64| seed.map(|s| s.wrapping_add(offset));

        let simulator = PriceSimulator::new(config.price.clone(), derive(0));
        let tally = VoteTally::new(config.voting.clone(), derive(1));
        let mut candles = CandleAggregator::new(config.candles.clone(), derive(2));
        let mut rounds = RoundController::new(config.round.clone())
            .with_logging(config.logging.enable_round_logging);

        let initial_price = simulator.current_price();
        let tick = Duration::milliseconds(i64::try_from(config.engine.tick_interval_ms).unwrap_or(1000));
        if config.candles.prefill_history {
            candles.prefill_history(initial_price, now, tick);
        }
        candles.roll_new_candle_at(initial_price, now)?;
        rounds.start();

        sink.render_prices(candles.history_window(), RenderMode::Animated);
        sink.render_candles(candles.candle_window(), RenderMode::Animated);

        info!("🚀 Simulation started at {} (round {}s, tick {}ms)",
            format_price(initial_price),
            config.round.duration_seconds,
            config.engine.tick_interval_ms
        );

        Ok(SimulationEngine {
            simulator,
            tally,
            rounds,
            candles,
            sink,
            identity: None,
            stats: SimulationStats {
                peak_price: initial_price,
                ..SimulationStats::default()
            },
            config,
            clock: now,
        })
    }
}
