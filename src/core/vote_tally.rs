// Pump/dump vote counting for the current round

use crate::config::VotingConfig;
use crate::core::types::{Identity, RoundOutcome, VoteDirection};
use crate::error::{GameError, GameResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteState {
    pub pump_count: u64,
    pub dump_count: u64,
    pub pump_percentage: u8,
    pub dump_percentage: u8,
}

/// What a successful `cast_vote` did to the tally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    New,
    Switched { from: VoteDirection },
}

#[derive(Debug, Clone)]
pub struct VoteTally {
    pump_count: u64,
    dump_count: u64,
    choices: HashMap<Identity, VoteDirection>,
    config: VotingConfig,
    rng: StdRng,
}

impl VoteTally {
    pub fn new(config: VotingConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        let mut tally = Self {
            pump_count: 0,
            dump_count: 0,
            choices: HashMap::new(),
            config,
            rng,
        };
        tally.reset_for_new_round();
        tally
    }

    /// Record a vote for `identity`.
    ///
    /// With switching allowed, a vote for the other direction moves the
    /// identity's vote; repeating the same direction is always rejected.
    pub fn cast_vote(&mut self, identity: &Identity, direction: VoteDirection) -> GameResult<VoteChange> {
        let change = match self.choices.get(identity).copied() {
            Some(previous) if previous == direction || !self.config.allow_switch => {
                return Err(GameError::AlreadyVoted {
                    identity: identity.short(),
                    direction: previous,
                });
            }
            Some(previous) => {
                self.decrement(previous);
                VoteChange::Switched { from: previous }
            }
            None => VoteChange::New,
        };

        self.increment(direction);
        self.choices.insert(identity.clone(), direction);
        Ok(change)
    }

    /// Cast a vote given as text, rejecting anything but pump/dump
    pub fn cast_vote_str(&mut self, identity: &Identity, direction: &str) -> GameResult<VoteChange> {
        let direction: VoteDirection = direction.parse()?;
        self.cast_vote(identity, direction)
    }

    pub fn total_votes(&self) -> u64 {
        self.pump_count + self.dump_count
    }

    pub fn count(&self, direction: VoteDirection) -> u64 {
        match direction {
            VoteDirection::Pump => self.pump_count,
            VoteDirection::Dump => self.dump_count,
        }
    }

    pub fn choice_of(&self, identity: &Identity) -> Option<VoteDirection> {
        self.choices.get(identity).copied()
    }

    /// (pump, dump) as integers summing to 100, or the configured
    /// empty split when no votes exist
    pub fn percentages(&self) -> (u8, u8) {
        let total = self.total_votes();
        if total == 0 {
            return self.config.empty_split.percentages();
        }

        let pump = (self.pump_count as f64 / total as f64 * 100.0).round() as u8;
        (pump, 100 - pump)
    }

    /// Share of `direction` as a percentage (0 with no votes)
    pub fn share(&self, direction: VoteDirection) -> u8 {
        if self.total_votes() == 0 {
            return 0;
        }
        let (pump, dump) = self.percentages();
        match direction {
            VoteDirection::Pump => pump,
            VoteDirection::Dump => dump,
        }
    }

    /// Pump percentage, only while the round has votes
    pub fn pump_percentage(&self) -> Option<u8> {
        (self.total_votes() > 0).then(|| self.percentages().0)
    }

    pub fn outcome(&self) -> RoundOutcome {
        let total = self.total_votes();
        if total == 0 {
            return RoundOutcome::NoVotes;
        }

        let total = total as f64;
        match self.pump_count.cmp(&self.dump_count) {
            std::cmp::Ordering::Greater => RoundOutcome::PumpWins {
                share: self.pump_count as f64 / total,
            },
            std::cmp::Ordering::Less => RoundOutcome::DumpWins {
                share: self.dump_count as f64 / total,
            },
            std::cmp::Ordering::Equal => RoundOutcome::Tie,
        }
    }

    pub fn state(&self) -> VoteState {
        let (pump_percentage, dump_percentage) = self.percentages();
        VoteState {
            pump_count: self.pump_count,
            dump_count: self.dump_count,
            pump_percentage,
            dump_percentage,
        }
    }

    /// Reset counts to the configured seed and forget every identity's choice
    pub fn reset_for_new_round(&mut self) {
        let max = self.config.reset_seed_max;
        if max > 0 {
            self.pump_count = self.rng.gen_range(0..=max);
            self.dump_count = self.rng.gen_range(0..=max);
        } else {
            self.pump_count = 0;
            self.dump_count = 0;
        }
        self.choices.clear();
    }

    fn increment(&mut self, direction: VoteDirection) {
        match direction {
            VoteDirection::Pump => self.pump_count += 1,
            VoteDirection::Dump => self.dump_count += 1,
        }
    }

    fn decrement(&mut self, direction: VoteDirection) {
        match direction {
            VoteDirection::Pump => self.pump_count = self.pump_count.saturating_sub(1),
            VoteDirection::Dump => self.dump_count = self.dump_count.saturating_sub(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmptySplit;

    fn tally() -> VoteTally {
        VoteTally::new(VotingConfig::default(), Some(1))
    }

    fn voter(n: usize) -> Identity {
        Identity::new(format!("voter-{:04}", n))
    }

    #[test]
    fn test_single_pump_vote_percentages() {
        let mut tally = tally();
        tally.cast_vote(&voter(1), VoteDirection::Pump).unwrap();
        assert_eq!(tally.percentages(), (100, 0));
        assert_eq!(tally.share(VoteDirection::Pump), 100);
    }

    #[test]
    fn test_percentages_sum_to_100() {
        let mut tally = tally();
        // 1 pump vs 199 dump rounds to 0.5% / 99.5%
        tally.cast_vote(&voter(0), VoteDirection::Pump).unwrap();
        for n in 1..200 {
            tally.cast_vote(&voter(n), VoteDirection::Dump).unwrap();
            let (pump, dump) = tally.percentages();
            assert_eq!(u16::from(pump) + u16::from(dump), 100);
        }
    }

    #[test]
    fn test_empty_split_defaults() {
        assert_eq!(tally().percentages(), (0, 0));

        let config = VotingConfig { empty_split: EmptySplit::Even, ..VotingConfig::default() };
        let tally = VoteTally::new(config, Some(1));
        assert_eq!(tally.percentages(), (50, 50));
        assert_eq!(tally.pump_percentage(), None);
    }

    #[test]
    fn test_vote_switch_moves_count() {
        let mut tally = tally();
        let id = voter(1);
        tally.cast_vote(&id, VoteDirection::Pump).unwrap();

        let change = tally.cast_vote(&id, VoteDirection::Dump).unwrap();

        assert_eq!(change, VoteChange::Switched { from: VoteDirection::Pump });
        assert_eq!(tally.count(VoteDirection::Pump), 0);
        assert_eq!(tally.count(VoteDirection::Dump), 1);
        assert_eq!(tally.choice_of(&id), Some(VoteDirection::Dump));
    }

    #[test]
    fn test_repeat_vote_rejected() {
        let mut tally = tally();
        let id = voter(1);
        tally.cast_vote(&id, VoteDirection::Pump).unwrap();

        let err = tally.cast_vote(&id, VoteDirection::Pump).unwrap_err();
        assert!(matches!(err, GameError::AlreadyVoted { direction: VoteDirection::Pump, .. }));
        assert_eq!(tally.total_votes(), 1);
    }

    #[test]
    fn test_strict_policy_rejects_switch() {
        let config = VotingConfig { allow_switch: false, ..VotingConfig::default() };
        let mut tally = VoteTally::new(config, Some(1));
        let id = voter(1);
        tally.cast_vote(&id, VoteDirection::Pump).unwrap();

        assert!(tally.cast_vote(&id, VoteDirection::Dump).is_err());
        assert_eq!(tally.count(VoteDirection::Pump), 1);
        assert_eq!(tally.count(VoteDirection::Dump), 0);
    }

    #[test]
    fn test_invalid_direction_text() {
        let mut tally = tally();
        let err = tally.cast_vote_str(&voter(1), "moon").unwrap_err();
        assert!(matches!(err, GameError::InvalidVoteState(_)));
        assert_eq!(tally.total_votes(), 0);
    }

    #[test]
    fn test_outcome_majority() {
        let mut tally = tally();
        assert_eq!(tally.outcome(), RoundOutcome::NoVotes);

        for n in 0..80 {
            tally.cast_vote(&voter(n), VoteDirection::Pump).unwrap();
        }
        for n in 80..100 {
            tally.cast_vote(&voter(n), VoteDirection::Dump).unwrap();
        }
        assert_eq!(tally.outcome(), RoundOutcome::PumpWins { share: 0.8 });
    }

    #[test]
    fn test_outcome_tie() {
        let mut tally = tally();
        tally.cast_vote(&voter(1), VoteDirection::Pump).unwrap();
        tally.cast_vote(&voter(2), VoteDirection::Dump).unwrap();
        assert_eq!(tally.outcome(), RoundOutcome::Tie);
    }

    #[test]
    fn test_reset_clears_choices() {
        let mut tally = tally();
        let id = voter(1);
        tally.cast_vote(&id, VoteDirection::Pump).unwrap();

        tally.reset_for_new_round();

        assert_eq!(tally.total_votes(), 0);
        assert_eq!(tally.choice_of(&id), None);
        assert!(tally.cast_vote(&id, VoteDirection::Pump).is_ok());
    }

    #[test]
    fn test_reset_with_engagement_seed() {
        let config = VotingConfig { reset_seed_max: 5, ..VotingConfig::default() };
        let mut tally = VoteTally::new(config, Some(9));
        for _ in 0..20 {
            tally.reset_for_new_round();
            assert!(tally.count(VoteDirection::Pump) <= 5);
            assert!(tally.count(VoteDirection::Dump) <= 5);
        }
    }
}
