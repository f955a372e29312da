// Simulation Engine Module
// Wires the core components to timers, user commands and a render sink

pub mod simulation_engine;
pub mod scheduler;
pub mod script;

pub use simulation_engine::{SimulationEngine, SimulationEngineBuilder, SimulationStats, VoteReceipt};
pub use scheduler::{Command, GameRunner, Scheduler, TimerEvent, TimerKind};
pub use script::VoterScript;
