// OHLC+volume bucketing over a bounded sliding window

use crate::config::CandleConfig;
use crate::core::types::PricePoint;
use crate::error::{GameError, GameResult};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One fixed-duration OHLC bucket. `open_time` is the bucket start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn flat(open_time: DateTime<Utc>, price: f64, volume: f64) -> Self {
        Self {
            open_time,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
        }
    }

    /// `low <= min(open, close) <= max(open, close) <= high`
    pub fn check_invariant(&self) -> GameResult<()> {
        let body_low = self.open.min(self.close);
        let body_high = self.open.max(self.close);

        if self.low <= body_low && body_high <= self.high && self.volume >= 0.0 {
            Ok(())
        } else {
            Err(GameError::CandleInvariant(format!(
                "o={} h={} l={} c={} v={}",
                self.open, self.high, self.low, self.close, self.volume
            )))
        }
    }
}

#[derive(Debug, Clone)]
pub struct CandleAggregator {
    candles: VecDeque<Candle>,
    history: VecDeque<PricePoint>,
    config: CandleConfig,
    rng: StdRng,
}

impl CandleAggregator {
    pub fn new(config: CandleConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            candles: VecDeque::with_capacity(config.window_size + 1),
            history: VecDeque::with_capacity(config.history_size + 1),
            config,
            rng,
        }
    }

    /// Fill the history window with `price`, one point per `spacing`, ending at `now`
    pub fn prefill_history(&mut self, price: f64, now: DateTime<Utc>, spacing: Duration) {
        self.history.clear();
        for i in (0..self.config.history_size).rev() {
            let steps = i32::try_from(i).unwrap_or(i32::MAX);
            self.history.push_back(PricePoint {
                time: now - spacing * steps,
                price,
            });
        }
    }

    /// Fold a price into the in-progress candle (opening one if none exists)
    pub fn on_price_tick(&mut self, price: f64) -> GameResult<()> {
        self.on_price_tick_at(price, Utc::now())
    }

    pub fn on_price_tick_at(&mut self, price: f64, now: DateTime<Utc>) -> GameResult<()> {
        let Some(candle) = self.candles.back_mut() else {
            return self.roll_new_candle_at(price, now);
        };

        candle.close = price;
        candle.high = candle.high.max(price);
        candle.low = candle.low.min(price);
        candle.check_invariant()
    }

    /// Close the current candle and open a flat one at `open_price`
    pub fn roll_new_candle(&mut self, open_price: f64) -> GameResult<()> {
        self.roll_new_candle_at(open_price, Utc::now())
    }

    pub fn roll_new_candle_at(&mut self, open_price: f64, open_time: DateTime<Utc>) -> GameResult<()> {
        let volume = self.rng.gen_range(self.config.volume_min..=self.config.volume_max);
        let candle = Candle::flat(open_time, open_price, volume);
        candle.check_invariant()?;

        self.candles.push_back(candle);
        while self.candles.len() > self.config.window_size {
            self.candles.pop_front();
        }
        Ok(())
    }

    pub fn append_history_point(&mut self, price: f64) {
        self.append_history_point_at(price, Utc::now());
    }

    pub fn append_history_point_at(&mut self, price: f64, time: DateTime<Utc>) {
        self.history.push_back(PricePoint { time, price });
        while self.history.len() > self.config.history_size {
            self.history.pop_front();
        }
    }

    /// Whether the in-progress candle has covered its full duration at `now`
    pub fn needs_roll(&self, now: DateTime<Utc>) -> bool {
        let duration = Duration::seconds(i64::try_from(self.config.candle_duration_seconds).unwrap_or(i64::MAX / 1000));
        match self.candles.back() {
            Some(candle) => now - candle.open_time >= duration,
            None => true,
        }
    }

    /// Percentage change of the newest history point relative to the oldest
    pub fn growth_rate(&self) -> Option<f64> {
        if self.history.len() < 2 {
            return None;
        }
        let first = self.history.front()?.price;
        let last = self.history.back()?.price;
        Some((last - first) / first * 100.0)
    }

    pub fn current_candle(&self) -> Option<&Candle> {
        self.candles.back()
    }

    pub fn candles(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    pub fn history(&self) -> impl Iterator<Item = &PricePoint> {
        self.history.iter()
    }

    /// Contiguous oldest-first view of the candle window, for rendering
    pub fn candle_window(&mut self) -> &[Candle] {
        self.candles.make_contiguous()
    }

    /// Contiguous oldest-first view of the price history, for rendering
    pub fn history_window(&mut self) -> &[PricePoint] {
        self.history.make_contiguous()
    }

    pub fn candle_count(&self) -> usize {
        self.candles.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
