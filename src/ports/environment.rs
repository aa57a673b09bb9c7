//! Environment port - the game as seen by the driver loop.

use crate::types::{Action, RawObservation};

/// A single-player episodic game.
///
/// The driver loop is: read the observation, choose an action, apply it and
/// collect the reward, check for termination, reset when terminal.
pub trait Environment {
    /// Current raw game state.
    fn observation(&self) -> RawObservation;

    /// Advance one frame with the given action and return its reward.
    fn apply_action(&mut self, action: Action) -> f64;

    /// Whether the current episode has ended.
    fn is_terminal(&self) -> bool;

    /// Start a fresh episode.
    fn reset_episode(&mut self);
}
