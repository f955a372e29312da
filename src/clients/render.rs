// Render sinks: where price series, candles and notices end up

use crate::core::candle_aggregator::Candle;
use crate::core::types::{format_price, PricePoint};
use crate::core::vote_tally::VoteState;
use crate::error::GameError;
use serde::Serialize;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Animated,
    Immediate,  // High-frequency refresh, no animation
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// Transient on-screen message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn from_error(err: &GameError) -> Self {
        Self::warning(err.user_message())
    }
}

/// Everything the status panel shows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub round_number: u64,
    pub countdown: String,
    pub price: f64,
    pub growth_since_start: f64,
    pub window_growth: Option<f64>,
    pub votes: VoteState,
    pub identity: Option<String>,
}

pub trait RenderSink: Send {
    /// Replace the displayed price series with `points` (oldest first)
    fn render_prices(&mut self, points: &[PricePoint], mode: RenderMode);

    /// Replace the displayed candle window with `candles` (oldest first)
    fn render_candles(&mut self, candles: &[Candle], mode: RenderMode);

    fn render_dashboard(&mut self, frame: &DashboardFrame);

    fn notify(&mut self, notice: &Notice);
}

/// Renders through tracing; the terminal frontend
#[derive(Debug, Clone)]
pub struct TracingRenderSink {
    log_prices: bool,
    min_price_change: f64,  // Relative move before the dashboard is logged again
    last_logged_price: f64,
}

impl TracingRenderSink {
    pub fn new(log_prices: bool) -> Self {
        Self {
            log_prices,
            min_price_change: 0.005,
            last_logged_price: 0.0,
        }
    }

    fn should_log_price(&self, price: f64) -> bool {
        self.last_logged_price == 0.0
            || ((price - self.last_logged_price) / self.last_logged_price).abs() > self.min_price_change
    }
}

impl RenderSink for TracingRenderSink {
    fn render_prices(&mut self, points: &[PricePoint], _mode: RenderMode) {
        if !self.log_prices {
            return;
        }
        if let Some(last) = points.last() {
            debug!("📈 {} {}", last.label(), format_price(last.price));
        }
    }

    fn render_candles(&mut self, candles: &[Candle], _mode: RenderMode) {
        if let Some(candle) = candles.last() {
            debug!("🕯️  {} candles, last O {:.8} H {:.8} L {:.8} C {:.8} V {:.0}",
                candles.len(), candle.open, candle.high, candle.low, candle.close, candle.volume);
        }
    }

    fn render_dashboard(&mut self, frame: &DashboardFrame) {
        if !self.should_log_price(frame.price) {
            return;
        }
        self.last_logged_price = frame.price;

        info!("💰 Round {} | ⏳ {} | {} ({:+.2}%) | 🟢 {}% 🔴 {}%",
            frame.round_number,
            frame.countdown,
            format_price(frame.price),
            frame.growth_since_start,
            frame.votes.pump_percentage,
            frame.votes.dump_percentage
        );
    }

    fn notify(&mut self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Info => info!("📣 {}", notice.message),
            NoticeLevel::Warning => warn!("⚠️  {}", notice.message),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum JsonEvent<'a> {
    Prices { mode: RenderMode, points: &'a [PricePoint] },
    Candles { mode: RenderMode, candles: &'a [Candle] },
    Dashboard { frame: &'a DashboardFrame },
    Notice { notice: &'a Notice },
}

/// One JSON object per line, for piping into an external chart
pub struct JsonLinesSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn emit(&mut self, event: &JsonEvent<'_>) {
        let result = serde_json::to_writer(&mut self.writer, event)
            .map_err(std::io::Error::from)
            .and_then(|_| self.writer.write_all(b"\n"));
        if let Err(e) = result {
            warn!("⚠️  Render write failed: {}", e);
        }
    }
}

impl<W: Write + Send> RenderSink for JsonLinesSink<W> {
    fn render_prices(&mut self, points: &[PricePoint], mode: RenderMode) {
        self.emit(&JsonEvent::Prices { mode, points });
    }

    fn render_candles(&mut self, candles: &[Candle], mode: RenderMode) {
        self.emit(&JsonEvent::Candles { mode, candles });
    }

    fn render_dashboard(&mut self, frame: &DashboardFrame) {
        self.emit(&JsonEvent::Dashboard { frame });
    }

    fn notify(&mut self, notice: &Notice) {
        self.emit(&JsonEvent::Notice { notice });
    }
}

#[derive(Debug, Default)]
pub struct Recording {
    pub prices: Vec<PricePoint>,
    pub candles: Vec<Candle>,
    pub last_mode: Option<RenderMode>,
    pub price_renders: usize,
    pub candle_renders: usize,
    pub frames: Vec<DashboardFrame>,
    pub notices: Vec<Notice>,
}

/// In-memory sink; clones share the same recording
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recording(&self) -> MutexGuard<'_, Recording> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RenderSink for RecordingSink {
    fn render_prices(&mut self, points: &[PricePoint], mode: RenderMode) {
        let mut rec = self.recording();
        rec.prices = points.to_vec();
        rec.last_mode = Some(mode);
        rec.price_renders += 1;
    }

    fn render_candles(&mut self, candles: &[Candle], mode: RenderMode) {
        let mut rec = self.recording();
        rec.candles = candles.to_vec();
        rec.last_mode = Some(mode);
        rec.candle_renders += 1;
    }

    fn render_dashboard(&mut self, frame: &DashboardFrame) {
        self.recording().frames.push(frame.clone());
    }

    fn notify(&mut self, notice: &Notice) {
        self.recording().notices.push(notice.clone());
    }
}
