//! Per-run diagnostic counters.

use serde::{Deserialize, Serialize};

/// Episode and frame counters for a training or evaluation session.
///
/// Kept apart from the value table; nothing in the decision path reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    episodes: u64,
    frames: u64,
}

impl SessionCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of terminal transitions observed
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Number of environment steps taken
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn end_episode(&mut self) {
        self.episodes += 1;
    }

    pub fn record_frame(&mut self) {
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment_independently() {
        let mut counters = SessionCounters::new();
        counters.record_frame();
        counters.record_frame();
        counters.end_episode();
        assert_eq!(counters.frames(), 2);
        assert_eq!(counters.episodes(), 1);
    }
}
