// Headless simulation commands
use pump_vote_sim::core::types::format_price;
use pump_vote_sim::{
    Candle, Config, GameError, GameResult, RoundOutcome, RoundReport, SimulationEngine, SimulationProgress,
    SimulationStats, TracingRenderSink, VoterScript,
};
use serde::Serialize;
use tracing::info;

/// Parameters of one headless run
pub struct SimulateOptions {
    pub rounds: u64,
    pub voters: usize,
    pub pump_bias: f64,
    pub participation: f64,
    pub round_seconds: Option<u64>,
    pub seed: Option<u64>,
    pub json: bool,
}

#[derive(Debug, Serialize)]
pub struct SimulationSummary {
    pub rounds: Vec<RoundReport>,
    pub stats: SimulationStats,
    pub initial_price: f64,
    pub final_price: f64,
    pub growth_since_start: f64,
    pub candles: Vec<Candle>,
}

pub fn run_simulation(options: SimulateOptions, mut config: Config) -> GameResult<SimulationSummary> {
    if options.rounds == 0 {
        return Err(GameError::InvalidParameter("rounds".to_string(), "must be at least 1".to_string()));
    }
    if !(0.0..=1.0).contains(&options.pump_bias) {
        return Err(GameError::InvalidParameter("pump-bias".to_string(), "must be between 0 and 1".to_string()));
    }
    if !(0.0..=1.0).contains(&options.participation) {
        return Err(GameError::InvalidParameter("participation".to_string(), "must be between 0 and 1".to_string()));
    }

    if let Some(seconds) = options.round_seconds {
        config.round.duration_seconds = seconds;
    }
    if options.seed.is_some() {
        config.engine.seed = options.seed;
    }
    // Per-vote log lines would drown the progress bar
    config.logging.enable_vote_logging = false;

    let total_seconds = options.rounds.checked_mul(config.round.duration_seconds).ok_or_else(|| {
        GameError::InvalidParameter("rounds".to_string(), "total simulated time overflows".to_string())
    })?;
    let script_seed = config.engine.seed.map(|s| s.wrapping_add(3));

    info!("🎲 Simulating {} rounds of {}s with {} voters (pump bias {:.0}%)",
        options.rounds,
        config.round.duration_seconds,
        options.voters,
        options.pump_bias * 100.0
    );

    let mut engine = SimulationEngine::builder(config)
        .with_render_sink(TracingRenderSink::new(false))
        .build()?;
    let mut script = VoterScript::new(options.voters, options.pump_bias, options.participation, script_seed);

    let progress = if options.json {
        SimulationProgress::hidden()
    } else {
        SimulationProgress::new(total_seconds)
    };

    let rounds = engine.fast_forward(total_seconds, &mut script, |second, engine| {
        progress.update(second, engine.rounds().round_number(), engine.simulator().current_price());
    });
    progress.finish(rounds.len() as u64, engine.simulator().current_price());

    let simulator = engine.simulator();
    let summary = SimulationSummary {
        stats: engine.stats().clone(),
        initial_price: simulator.state().initial_price,
        final_price: simulator.current_price(),
        growth_since_start: simulator.growth_since_start(),
        candles: engine.candles().candles().copied().collect(),
        rounds,
    };

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_report(&summary);
    }

    Ok(summary)
}

fn print_report(summary: &SimulationSummary) {
    info!("");
    info!("📊 Simulation Results");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for report in &summary.rounds {
        let marker = match report.outcome {
            RoundOutcome::PumpWins { .. } => "🟢",
            RoundOutcome::DumpWins { .. } => "🔴",
            RoundOutcome::Tie | RoundOutcome::NoVotes => "⚪",
        };
        info!("{} Round {:>3}: {} → {} | {}",
            marker,
            report.round_number,
            format_price(report.price_before),
            format_price(report.price_after),
            report.message()
        );
    }
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("💰 {} → {} ({:+.2}%)",
        format_price(summary.initial_price),
        format_price(summary.final_price),
        summary.growth_since_start
    );
    info!("📈 Peak: {}", format_price(summary.stats.peak_price));
    info!("🗳️  Votes cast: {} ({} rejected)", summary.stats.votes_cast, summary.stats.votes_rejected);
    info!("🏆 Pump {} / Dump {} / Tie {} / Empty {}",
        summary.stats.pump_wins, summary.stats.dump_wins, summary.stats.ties, summary.stats.empty_rounds);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(rounds: u64) -> SimulateOptions {
        SimulateOptions {
            rounds,
            voters: 20,
            pump_bias: 1.0,
            participation: 1.0,
            round_seconds: Some(4),
            seed: Some(7),
            json: true,
        }
    }

    #[test]
    fn test_run_simulation_counts_rounds() {
        let summary = run_simulation(options(3), Config::default()).unwrap();
        assert_eq!(summary.rounds.len(), 3);
        assert_eq!(summary.stats.pump_wins, 3);
        assert!(summary.candles.len() <= 20);
    }

    #[test]
    fn test_rejects_zero_rounds() {
        let err = run_simulation(options(0), Config::default()).unwrap_err();
        assert!(matches!(err, GameError::InvalidParameter(ref name, _) if name == "rounds"));
    }

    #[test]
    fn test_rejects_overflowing_round_count() {
        let err = run_simulation(options(u64::MAX), Config::default()).unwrap_err();
        assert!(matches!(err, GameError::InvalidParameter(ref name, _) if name == "rounds"));
    }
}
