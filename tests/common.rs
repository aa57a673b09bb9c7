//! Common test utilities for the flappy test suite.

use flappy::{
    Action, RawObservation,
    ports::Environment,
};

/// Environment that scripts a fixed number of frames per episode.
///
/// The player drops 20 pixels per frame toward a gap at a fixed height.
/// Every frame before the last yields `tick`; the last yields `crash`.
pub struct Corridor {
    pub length: usize,
    pub tick: f64,
    pub crash: f64,
    frame: usize,
}

impl Corridor {
    pub fn new(length: usize) -> Self {
        Self {
            length,
            tick: 1.0,
            crash: -5.0,
            frame: 0,
        }
    }
}

impl Environment for Corridor {
    fn observation(&self) -> RawObservation {
        RawObservation::new(100.0 + 20.0 * self.frame as f64, 250.0, 200.0, 2)
    }

    fn apply_action(&mut self, _action: Action) -> f64 {
        self.frame += 1;
        if self.is_terminal() {
            self.crash
        } else {
            self.tick
        }
    }

    fn is_terminal(&self) -> bool {
        self.frame >= self.length
    }

    fn reset_episode(&mut self) {
        self.frame = 0;
    }
}
