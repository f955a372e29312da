//! Progress bar for headless fast-forward runs
//!
//! Provides visual feedback while simulated rounds are played out using
//! the indicatif crate.

use crate::core::types::format_price;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress over simulated seconds
pub struct SimulationProgress {
    pub progress: ProgressBar,
}

impl SimulationProgress {
    /// Create a new progress bar spanning `total_seconds` of game time
    pub fn new(total_seconds: u64) -> Self {
        let progress = ProgressBar::new(total_seconds);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}s ({eta})\n{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        progress.set_style(style);

        Self { progress }
    }

    /// Hidden bar, for JSON output and tests
    pub fn hidden() -> Self {
        Self {
            progress: ProgressBar::hidden(),
        }
    }

    /// Update with the current simulated second
    pub fn update(&self, second: u64, round: u64, price: f64) {
        self.progress.set_position(second);
        self.progress.set_message(format!("🎲 Round {} | {}", round, format_price(price)));
    }

    pub fn finish(&self, rounds: u64, price: f64) {
        self.progress.finish_with_message(format!(
            "✅ Simulation complete! {} rounds, final price {}",
            rounds,
            format_price(price)
        ));
    }
}
