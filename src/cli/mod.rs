//! Command-line interface for training, evaluating and exporting agents

pub mod commands;
pub mod output;
