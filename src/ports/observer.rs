//! Observer port - abstraction for training observation and data collection
//!
//! Observers let the pipeline report progress, metrics and logs without the
//! training loop knowing about any particular output format.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    types::{Action, RawObservation},
};

/// Summary of one finished episode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    /// Index of the episode (0-based)
    pub episode: usize,
    /// Sum of rewards collected during the episode
    pub score: f64,
    /// Frames played in the episode
    pub frames: usize,
    /// Whether the episode was cut off by the frame cap rather than a crash
    pub truncated: bool,
    /// Keys in the agent's table after the episode, if it keeps one
    pub table_size: Option<usize>,
}

/// Observer trait for monitoring training and evaluation
///
/// # Event Sequence
///
/// 1. `on_training_start(total_episodes)` - Once at the beginning
/// 2. For each episode:
///    - `on_episode_start(episode)`
///    - `on_step(...)` - For each frame
///    - `on_episode_end(summary)`
/// 3. `on_training_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use flappy::ports::{EpisodeSummary, Observer};
///
/// struct BestScore(f64);
///
/// impl Observer for BestScore {
///     fn on_episode_end(&mut self, summary: &EpisodeSummary) -> flappy::Result<()> {
///         self.0 = self.0.max(summary.score);
///         Ok(())
///     }
/// }
/// ```
pub trait Observer: Send {
    /// Called when training starts.
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        Ok(())
    }

    /// Called when an episode starts.
    fn on_episode_start(&mut self, _episode: usize) -> Result<()> {
        Ok(())
    }

    /// Called after every environment step.
    ///
    /// # Parameters
    ///
    /// * `episode` - Index of the current episode
    /// * `frame` - Frame number within the episode (0-based)
    /// * `state` - Observation the action was chosen from
    /// * `action` - Action taken
    /// * `reward` - Reward returned by the environment
    fn on_step(
        &mut self,
        _episode: usize,
        _frame: usize,
        _state: &RawObservation,
        _action: Action,
        _reward: f64,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when an episode ends, by crash or truncation.
    fn on_episode_end(&mut self, _summary: &EpisodeSummary) -> Result<()> {
        Ok(())
    }

    /// Called when training completes.
    ///
    /// Use this to finalize outputs, close files, or display summaries.
    fn on_training_end(&mut self) -> Result<()> {
        Ok(())
    }
}
