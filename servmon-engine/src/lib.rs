//! servmon-engine - simulated server monitoring
//!
//! Generates plausible host metrics, keeps rolling history, raises alerts on
//! threshold breaches and maintains a capped log feed. The engine is pure
//! state: timers, transport and persistence belong to the consumer (see the
//! `servmon-kernel` crate).

pub mod engine;
pub mod error;
mod feed;
pub mod history;
pub mod ids;
pub mod models;
pub mod seed;
mod signal;
pub mod suggestions;
pub mod thresholds;

pub use engine::{EngineConfig, EngineStats, LogFilter, Monitor, SimulationEngine, TickReport};
pub use error::EngineError;
pub use history::History;
pub use models::*;
pub use thresholds::Breach;
