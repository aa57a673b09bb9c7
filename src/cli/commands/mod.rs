//! CLI subcommands

pub mod evaluate;
pub mod export;
pub mod train;
