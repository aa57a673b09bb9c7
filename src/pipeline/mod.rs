//! Training and evaluation pipeline
//!
//! This module provides:
//! - The episode loop driving an agent against an environment
//! - Observers for progress display, metrics and episode logs

pub mod observers;
pub mod training;

pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Milestone, MilestoneObserver,
    ProgressObserver, SharedObserver,
};
pub use training::{TrainingConfig, TrainingPipeline, TrainingResult};

pub use crate::ports::{Environment, FlappyAgent, Observer};
