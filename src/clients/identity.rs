// Wallet-style identity provider
//
// The core only needs an identifier per voter; detection and approval
// belong to the provider.

use crate::config::{IdentityConfig, SUPPORTED_WALLET};
use crate::core::types::Identity;
use crate::error::{GameError, GameResult};
use std::time::Duration;
use tracing::{info, warn};

/// Supplies a voter identity. Called once per user action, no retries.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider {
    async fn try_connect(&mut self) -> GameResult<Identity>;
}

/// Hands out a configured public key, mimicking an injected browser wallet
#[derive(Debug, Clone)]
pub struct WalletIdentityProvider {
    public_key: Option<String>,
    auto_approve: bool,
    wallet: String,
    connect_delay: Duration,
}

impl WalletIdentityProvider {
    pub fn new(public_key: Option<String>, auto_approve: bool) -> Self {
        Self {
            public_key,
            auto_approve,
            wallet: SUPPORTED_WALLET.to_string(),
            connect_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.public_key.clone(), config.auto_approve).with_wallet(&config.wallet)
    }

    /// Name of the injected provider
    pub fn with_wallet(mut self, wallet: &str) -> Self {
        self.wallet = wallet.trim().to_string();
        self
    }

    /// Simulated approval latency
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }
}

impl IdentityProvider for WalletIdentityProvider {
    async fn try_connect(&mut self) -> GameResult<Identity> {
        if !self.connect_delay.is_zero() {
            tokio::time::sleep(self.connect_delay).await;
        }

        let key = match self.public_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => {
                warn!("🔌 Wallet not detected");
                return Err(GameError::IdentityUnavailable(
                    "wallet not detected, please install it".to_string(),
                ));
            }
        };

        if !self.wallet.eq_ignore_ascii_case(SUPPORTED_WALLET) {
            warn!("🔌 Unsupported wallet provider: {}", self.wallet);
            return Err(GameError::IdentityUnavailable(
                "wallet provider is not Phantom, please install Phantom Wallet".to_string(),
            ));
        }

        if !self.auto_approve {
            warn!("🚫 User denied wallet connection");
            return Err(GameError::IdentityRejected("user denied wallet connection".to_string()));
        }

        let identity = Identity::new(key);
        info!("🔗 Connected: {}", identity.short());
        Ok(identity)
    }
}
