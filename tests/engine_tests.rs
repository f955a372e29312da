// Integration tests for the assembled simulation engine

mod common;

use chrono::Duration;
use common::{create_test_config, create_test_engine, t0, voters};
use pump_vote_sim::{GameError, Identity, RoundOutcome, VoteChange, VoteDirection, VoterScript};

#[test]
fn test_price_never_falls_below_floor() {
    let mut config = create_test_config();
    config.price.volatility = 1.0;
    config.price.trend_up_probability = 0.0;
    config.price.trend_magnitude = 0.5;
    let floor = config.price.floor;
    let (mut engine, _sink) = create_test_engine(config);

    for i in 1..=500 {
        let price = engine.price_tick(t0() + Duration::milliseconds(500 * i));
        assert!(price >= floor, "tick {} fell to {}", i, price);
    }

    assert!(engine.candles().history().all(|p| p.price >= floor));
    assert!(engine.candles().candles().all(|c| c.low >= floor));
}

#[test]
fn test_percentages_always_sum_to_100() {
    let (mut engine, _sink) = create_test_engine(create_test_config());
    let crowd = voters(7);

    for (i, voter) in crowd.iter().enumerate() {
        let direction = if i % 3 == 0 { VoteDirection::Dump } else { VoteDirection::Pump };
        engine.cast_vote_as(voter, direction, t0()).unwrap();

        let votes = engine.tally().state();
        assert_eq!(votes.pump_percentage as u16 + votes.dump_percentage as u16, 100);
        assert_eq!(votes.pump_count + votes.dump_count, i as u64 + 1);
    }
}

#[test]
fn test_single_dump_vote_lowers_price_by_cap() {
    let (mut engine, _sink) = create_test_engine(create_test_config());
    let before = engine.simulator().current_price();

    let receipt = engine.cast_vote_as(&Identity::new("bear"), VoteDirection::Dump, t0()).unwrap();

    assert_eq!(receipt.share, 100);
    assert!((receipt.price - before * (1.0 - 0.003)).abs() < 1e-15);
    let candle = engine.candles().current_candle().unwrap();
    assert_eq!(candle.close, receipt.price);
    assert!(candle.low <= receipt.price);
}

#[test]
fn test_switching_and_repeat_votes() {
    let (mut engine, _sink) = create_test_engine(create_test_config());
    let alice = Identity::new("alice");

    assert_eq!(engine.cast_vote_as(&alice, VoteDirection::Pump, t0()).unwrap().change, VoteChange::New);
    let switched = engine.cast_vote_as(&alice, VoteDirection::Dump, t0()).unwrap();
    assert_eq!(switched.change, VoteChange::Switched { from: VoteDirection::Pump });

    let repeat = engine.cast_vote_as(&alice, VoteDirection::Dump, t0());
    assert!(matches!(repeat, Err(GameError::AlreadyVoted { .. })));

    assert_eq!(engine.tally().count(VoteDirection::Pump), 0);
    assert_eq!(engine.tally().count(VoteDirection::Dump), 1);
    assert_eq!(engine.stats().votes_switched, 1);
    assert_eq!(engine.stats().votes_rejected, 1);
}

#[test]
fn test_pump_majority_shock_is_six_percent() {
    let (mut engine, sink) = create_test_engine(create_test_config());
    let crowd = voters(5);
    for voter in &crowd[..4] {
        engine.cast_vote_as(voter, VoteDirection::Pump, t0()).unwrap();
    }
    engine.cast_vote_as(&crowd[4], VoteDirection::Dump, t0()).unwrap();

    let mut report = None;
    for s in 1..=5 {
        report = report.or(engine.second_tick(t0() + Duration::seconds(s)));
    }
    let report = report.expect("round should resolve after 5 seconds");

    assert_eq!(report.outcome, RoundOutcome::PumpWins { share: 0.8 });
    assert_eq!((report.pump_votes, report.dump_votes), (4, 1));
    assert!((report.multiplier - 1.06).abs() < 1e-12);
    assert!((report.price_after - report.price_before * 1.06).abs() < 1e-15);
    assert!(sink.recording().notices.iter().any(|n| n.message == "Pump wins! Price will continue to rise."));
}

#[test]
fn test_tie_and_empty_rounds_leave_price() {
    let (mut engine, _sink) = create_test_engine(create_test_config());
    let crowd = voters(2);
    engine.cast_vote_as(&crowd[0], VoteDirection::Pump, t0()).unwrap();
    engine.cast_vote_as(&crowd[1], VoteDirection::Dump, t0()).unwrap();

    let mut reports = Vec::new();
    for s in 1..=10 {
        reports.extend(engine.second_tick(t0() + Duration::seconds(s)));
    }

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].outcome, RoundOutcome::Tie);
    assert_eq!(reports[1].outcome, RoundOutcome::NoVotes);
    for report in &reports {
        assert_eq!(report.multiplier, 1.0);
        assert_eq!(report.price_before, report.price_after);
    }
    assert_eq!(engine.stats().ties, 1);
    assert_eq!(engine.stats().empty_rounds, 1);
}

#[test]
fn test_each_round_resolves_exactly_once() {
    let mut config = create_test_config();
    config.round.duration_seconds = 3;
    let (mut engine, _sink) = create_test_engine(config);

    let mut resolved = Vec::new();
    for s in 1..=9 {
        if let Some(report) = engine.second_tick(t0() + Duration::seconds(s)) {
            resolved.push((s, report.round_number));
        }
    }

    assert_eq!(resolved, vec![(3, 1), (6, 2), (9, 3)]);
    assert_eq!(engine.rounds().round_number(), 4);
    assert_eq!(engine.rounds().state().remaining_seconds, 3);
    assert!(engine.rounds().is_active());
}

#[test]
fn test_candle_window_evicts_oldest() {
    let mut config = create_test_config();
    config.candles.candle_duration_seconds = 1;
    let (mut engine, _sink) = create_test_engine(config);

    // The build opens one candle at t0, every tick below opens another
    for s in 1..=25 {
        engine.price_tick(t0() + Duration::seconds(s));
    }

    assert_eq!(engine.candles().candle_count(), 20);
    let oldest = engine.candles().candles().next().unwrap();
    assert_eq!(oldest.open_time, t0() + Duration::seconds(6));
    assert!(engine.candles().candles().all(|c| c.check_invariant().is_ok()));
}

#[test]
fn test_history_is_bounded() {
    let (mut engine, _sink) = create_test_engine(create_test_config());
    assert_eq!(engine.candles().history_len(), 60);

    for i in 1..=100 {
        engine.price_tick(t0() + Duration::milliseconds(500 * i));
    }

    assert_eq!(engine.candles().history_len(), 60);
    let newest = engine.candles().history().last().unwrap();
    assert_eq!(newest.time, t0() + Duration::milliseconds(50_000));
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let mut config = create_test_config();
        config.price.volatility = 0.02;
        config.price.trend_magnitude = 0.001;
        let (mut engine, _sink) = create_test_engine(config);
        let mut script = VoterScript::new(25, 0.6, 0.8, Some(5));
        let reports = engine.fast_forward(20, &mut script, |_, _| {});
        (reports.len(), engine.simulator().current_price(), engine.stats().votes_cast)
    };

    assert_eq!(run(), run());
}
