// Scripted voter population for headless runs

use crate::core::types::{Identity, VoteDirection};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use uuid::Uuid;

pub struct VoterScript {
    voters: Vec<Identity>,
    pump_bias: f64,       // Probability a voter picks pump
    participation: f64,   // Expected fraction of voters voting per round
    rng: StdRng,
    current_round: u64,
    voted: HashSet<usize>,
}

impl VoterScript {
    pub fn new(voter_count: usize, pump_bias: f64, participation: f64, seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        // Random but seed-stable identities
        let voters = (0..voter_count)
            .map(|_| Identity::new(Uuid::from_u128(rng.gen::<u128>()).simple().to_string()))
            .collect();

        Self {
            voters,
            pump_bias: pump_bias.clamp(0.0, 1.0),
            participation: participation.clamp(0.0, 1.0),
            rng,
            current_round: 0,
            voted: HashSet::new(),
        }
    }

    pub fn voters(&self) -> &[Identity] {
        &self.voters
    }

    /// Votes to cast during one second of `round_number`. Every voter votes
    /// at most once per round; turnout is spread evenly over the round.
    pub fn votes_for_second(
        &mut self,
        round_number: u64,
        remaining_seconds: u64,
        round_duration: u64,
    ) -> Vec<(Identity, VoteDirection)> {
        if round_number != self.current_round {
            self.current_round = round_number;
            self.voted.clear();
        }
        if remaining_seconds == 0 || round_duration == 0 {
            return Vec::new();
        }

        let per_second = 1.0 - (1.0 - self.participation).powf(1.0 / round_duration as f64);
        let mut votes = Vec::new();

        for (index, voter) in self.voters.iter().enumerate() {
            if self.voted.contains(&index) || !self.rng.gen_bool(per_second.clamp(0.0, 1.0)) {
                continue;
            }
            let direction = if self.rng.gen_bool(self.pump_bias) {
                VoteDirection::Pump
            } else {
                VoteDirection::Dump
            };
            self.voted.insert(index);
            votes.push((voter.clone(), direction));
        }

        votes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_voter_votes_once_per_round() {
        let mut script = VoterScript::new(50, 0.5, 1.0, Some(1));

        let first = script.votes_for_second(1, 10, 10);
        let again = script.votes_for_second(1, 9, 10);
        let next_round = script.votes_for_second(2, 10, 10);

        assert_eq!(first.len(), 50);
        assert!(again.is_empty());
        assert_eq!(next_round.len(), 50);
    }

    #[test]
    fn test_zero_participation_never_votes() {
        let mut script = VoterScript::new(20, 0.5, 0.0, Some(1));
        for s in (1..=10).rev() {
            assert!(script.votes_for_second(1, s, 10).is_empty());
        }
    }

    #[test]
    fn test_seeded_identities_are_stable() {
        let a = VoterScript::new(3, 0.5, 0.5, Some(99));
        let b = VoterScript::new(3, 0.5, 0.5, Some(99));
        assert_eq!(a.voters(), b.voters());
        assert_eq!(a.voters()[0].as_str().len(), 32);
    }

    #[test]
    fn test_pump_bias_one_is_all_pump() {
        let mut script = VoterScript::new(30, 1.0, 1.0, Some(4));
        let votes = script.votes_for_second(1, 5, 5);
        assert!(votes.iter().all(|(_, d)| *d == VoteDirection::Pump));
    }
}
