//! Ports (trait boundaries) for external collaborators.
//!
//! The engine owns these traits; the game, storage and progress reporting
//! are adapters that implement them.

pub mod agent;
pub mod environment;
pub mod observer;
pub mod repository;

pub use agent::FlappyAgent;
pub use environment::Environment;
pub use observer::{EpisodeSummary, Observer};
pub use repository::QTableRepository;
