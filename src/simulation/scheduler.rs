// Periodic timers and the cooperative game loop
//
// Every timer is a tokio task feeding one channel; the runner consumes
// timer events and user commands one at a time, so engine mutations never overlap.

use crate::clients::identity::IdentityProvider;
use crate::core::types::VoteDirection;
use crate::simulation::simulation_engine::SimulationEngine;
use chrono::Utc;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    PriceTick,
    Countdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEvent {
    pub kind: TimerKind,
    generation: u64,
}

/// Owns at most one live periodic handle per [`TimerKind`].
///
/// Rescheduling a kind aborts its previous task first, and events that
/// the old task had already queued are recognised as stale.
pub struct Scheduler {
    tx: mpsc::UnboundedSender<TimerEvent>,
    handles: HashMap<TimerKind, (u64, JoinHandle<()>)>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TimerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx,
            handles: HashMap::new(),
            next_generation: 0,
        };
        (scheduler, rx)
    }

    /// Start (or restart) the periodic timer `kind`; first fire after one `period`
    pub fn schedule_periodic(&mut self, kind: TimerKind, period: Duration) {
        self.cancel(kind);

        self.next_generation += 1;
        let generation = self.next_generation;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(TimerEvent { kind, generation }).is_err() {
                    break;
                }
            }
        });

        debug!("⏱️  Scheduled {:?} every {:?} (gen {})", kind, period, generation);
        self.handles.insert(kind, (generation, handle));
    }

    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.handles.remove(&kind) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, (_, handle)) in self.handles.drain() {
            handle.abort();
        }
    }

    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.handles.contains_key(&kind)
    }

    pub fn active_timers(&self) -> usize {
        self.handles.len()
    }

    /// Whether `event` came from the live handle of its kind
    pub fn is_current(&self, event: &TimerEvent) -> bool {
        self.handles
            .get(&event.kind)
            .map_or(false, |(generation, _)| *generation == event.generation)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

/// User actions fed into the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Connect,
    Vote(VoteDirection),
    Quit,
}

pub struct GameRunner<P: IdentityProvider> {
    engine: SimulationEngine,
    provider: P,
    commands: mpsc::Receiver<Command>,
}

impl<P: IdentityProvider> GameRunner<P> {
    pub fn new(engine: SimulationEngine, provider: P, commands: mpsc::Receiver<Command>) -> Self {
        Self { engine, provider, commands }
    }

    /// Drive the game until `Quit`, or until `shutdown` completes.
    /// Returns the engine for a final summary.
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) -> SimulationEngine {
        let (mut scheduler, mut timers) = Scheduler::new();
        let tick_period = Duration::from_millis(self.engine.config().engine.tick_interval_ms);
        let restart_countdown = self.engine.config().round.restart_timer_on_reset;

        scheduler.schedule_periodic(TimerKind::PriceTick, tick_period);
        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(1));
        info!("▶️  Game loop running ({} timers)", scheduler.active_timers());

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested");
                    break;
                }

                Some(command) = self.commands.recv() => {
                    if command == Command::Quit {
                        info!("👋 Quit");
                        break;
                    }
                    self.handle_command(command).await;
                }

                Some(event) = timers.recv() => {
                    if !scheduler.is_current(&event) {
                        debug!("Dropping stale {:?} event", event.kind);
                        continue;
                    }
                    match event.kind {
                        TimerKind::PriceTick => {
                            self.engine.price_tick(Utc::now());
                        }
                        TimerKind::Countdown => {
                            let resolved = self.engine.second_tick(Utc::now()).is_some();
                            if resolved && restart_countdown {
                                scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(1));
                            }
                        }
                    }
                }
            }
        }

        scheduler.cancel_all();
        self.engine
    }

    async fn handle_command(&mut self, command: Command) {
        // Failures are already surfaced on the render sink
        match command {
            Command::Connect => {
                let _ = self.engine.connect(&mut self.provider).await;
            }
            Command::Vote(direction) => {
                let _ = self.engine.cast_vote(direction, Utc::now());
            }
            Command::Quit => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_keeps_single_handle() {
        let (mut scheduler, mut rx) = Scheduler::new();

        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(1));
        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(1));
        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(1));
        assert_eq!(scheduler.active_timers(), 1);

        tokio::time::sleep(Duration::from_millis(3500)).await;

        let mut fired = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(scheduler.is_current(&event));
            fired += 1;
        }
        assert_eq!(fired, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_events() {
        let (mut scheduler, mut rx) = Scheduler::new();
        scheduler.schedule_periodic(TimerKind::PriceTick, Duration::from_millis(100));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(scheduler.cancel(TimerKind::PriceTick));
        assert!(!scheduler.cancel(TimerKind::PriceTick));
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(rx.try_recv().is_err());
        assert!(!scheduler.is_scheduled(TimerKind::PriceTick));
    }

    #[tokio::test]
    async fn test_stale_events_detected() {
        let (mut scheduler, _rx) = Scheduler::new();
        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(60));
        let stale = TimerEvent { kind: TimerKind::Countdown, generation: 1 };

        scheduler.schedule_periodic(TimerKind::Countdown, Duration::from_secs(60));

        assert!(!scheduler.is_current(&stale));
        assert!(scheduler.is_current(&TimerEvent { kind: TimerKind::Countdown, generation: 2 }));
    }
}
