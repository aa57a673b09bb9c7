//! Tabular Q-learning for a side-scrolling obstacle game
//!
//! This crate provides:
//! - Discretization of raw game observations onto a 16-level lattice
//! - A value table with greedy and ε-greedy action selection
//! - The one-step Q-learning update
//! - CSV persistence of learned tables and MessagePack agent snapshots
//! - A seeded simulator, a training driver with observers, and policy maps

pub mod adapters;
pub mod analysis;
pub mod app;
pub mod cli;
pub mod discretizer;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod session;
pub mod types;

pub use discretizer::Discretizer;
pub use error::{Error, Result};
pub use q_learning::{QLearningAgent, QTable};
pub use session::SessionCounters;
pub use types::{Action, DiscreteKey, RawObservation};
