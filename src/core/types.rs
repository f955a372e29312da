// Common types used across the simulation core

use crate::error::GameError;
use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Pump,  // Upward price bias
    Dump,  // Downward price bias
}

impl VoteDirection {
    pub fn opposite(self) -> Self {
        match self {
            VoteDirection::Pump => VoteDirection::Dump,
            VoteDirection::Dump => VoteDirection::Pump,
        }
    }

    /// +1.0 for pump, -1.0 for dump
    pub fn sign(self) -> f64 {
        match self {
            VoteDirection::Pump => 1.0,
            VoteDirection::Dump => -1.0,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VoteDirection::Pump => write!(f, "pump"),
            VoteDirection::Dump => write!(f, "dump"),
        }
    }
}

impl FromStr for VoteDirection {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pump" => Ok(VoteDirection::Pump),
            "dump" => Ok(VoteDirection::Dump),
            other => Err(GameError::InvalidVoteState(format!(
                "'{}' is neither pump nor dump",
                other
            ))),
        }
    }
}

/// Opaque voter identifier handed out by an identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display, e.g. `7xKX...sAsU`
    pub fn short(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Majority read at round resolution. Shares are fractions in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RoundOutcome {
    PumpWins { share: f64 },
    DumpWins { share: f64 },
    Tie,
    NoVotes,
}

impl RoundOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            RoundOutcome::PumpWins { .. } => "Pump wins! Price will continue to rise.",
            RoundOutcome::DumpWins { .. } => "Dump wins! Early voters share profits.",
            RoundOutcome::Tie => "Tie! Price remains unchanged.",
            RoundOutcome::NoVotes => "No votes were cast. Price remains unchanged.",
        }
    }

    pub fn winner(&self) -> Option<VoteDirection> {
        match self {
            RoundOutcome::PumpWins { .. } => Some(VoteDirection::Pump),
            RoundOutcome::DumpWins { .. } => Some(VoteDirection::Dump),
            RoundOutcome::Tie | RoundOutcome::NoVotes => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,       // Not started yet
    Active,     // Accepting votes, counting down
    Resolving,  // Transient, within a single tick
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    /// Chart label, `H:MM:SS`
    pub fn label(&self) -> String {
        format!(
            "{}:{:02}:{:02}",
            self.time.hour(),
            self.time.minute(),
            self.time.second()
        )
    }
}

pub fn format_price(price: f64) -> String {
    format!("${:.5}", price)
}
