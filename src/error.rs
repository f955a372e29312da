//! Unified error handling for the voting simulator
//!
//! Every error is terminal to the action that raised it and never to the
//! process: the runner turns it into an on-screen notice and keeps ticking.

use crate::config::ConfigError;
use crate::core::types::VoteDirection;
use std::io;
use thiserror::Error;

/// Main error type for the voting simulator
#[derive(Debug, Error)]
pub enum GameError {
    // Identity errors
    #[error("Identity provider unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Identity connection rejected: {0}")]
    IdentityRejected(String),

    // Voting errors
    #[error("Invalid vote state: {0}")]
    InvalidVoteState(String),

    #[error("{identity} already voted {direction} this round")]
    AlreadyVoted {
        identity: String,
        direction: VoteDirection,
    },

    // Rendering errors
    #[error("Render target missing at initialization")]
    MissingRenderTarget,

    #[error("Candle invariant violated: {0}")]
    CandleInvariant(String),

    // General errors
    #[error("Invalid parameter '{0}': {1}")]
    InvalidParameter(String, String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError {
    /// Get a user-friendly notice with a hint line where one helps
    pub fn user_message(&self) -> String {
        match self {
            GameError::IdentityUnavailable(_) => {
                format!("{}\n💡 Install a wallet extension or set identity.public_key", self)
            }
            GameError::IdentityRejected(_) => {
                format!("{}\n💡 Approve the connection request to vote", self)
            }
            GameError::InvalidVoteState(msg) if msg.contains("connect") => {
                format!("{}\n💡 Run: connect", self)
            }
            GameError::InvalidVoteState(msg) if msg.contains("closed") => {
                format!("{}\n💡 Wait for the next round", self)
            }
            GameError::AlreadyVoted { .. } => {
                format!("{}\n💡 One vote per round", self)
            }
            GameError::Config(_) => {
                format!("{}\n💡 Run: pump-vote init", self)
            }
            _ => self.to_string(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            GameError::IdentityUnavailable(_) | GameError::IdentityRejected(_) => "identity",
            GameError::InvalidVoteState(_) | GameError::AlreadyVoted { .. } => "vote",
            GameError::MissingRenderTarget | GameError::CandleInvariant(_) => "render",
            GameError::InvalidParameter(_, _) => "validation",
            GameError::Config(_) => "config",
            GameError::Io(_) | GameError::Serialization(_) => "io",
        }
    }
}

/// Result type alias using GameError
pub type GameResult<T> = Result<T, GameError>;
