//! Agent port - abstraction over game-playing agents
//!
//! The training pipeline talks to agents only through this trait, so a
//! different value estimator can be dropped in without touching the driver.

use crate::{
    app::RewardValues,
    q_learning::QTable,
    session::SessionCounters,
    types::{Action, RawObservation},
};

/// Agent trait - the contract between the driver loop and a learner.
///
/// # Examples
///
/// ```no_run
/// use flappy::{
///     ports::{Environment, FlappyAgent},
///     types::Action,
/// };
///
/// fn play_one_frame<A: FlappyAgent, E: Environment>(agent: &A, env: &mut E) -> f64 {
///     let action = agent.policy(&env.observation());
///     env.apply_action(action)
/// }
/// ```
pub trait FlappyAgent: Send {
    /// Learn from one transition.
    ///
    /// Called on every training step: the game moved from `s1` via `action`
    /// to `s2` and yielded `reward`. `end` is true when `s2` is terminal.
    /// Unless `end` was set, the next call's `s1` is this call's `s2`.
    fn observe(
        &mut self,
        s1: &RawObservation,
        action: Action,
        reward: f64,
        s2: &RawObservation,
        end: bool,
    );

    /// Action to take while training. May explore.
    fn training_policy(&mut self, state: &RawObservation) -> Action;

    /// Action to take once training is complete.
    ///
    /// Runs once per rendered frame of real-time play, so it must be
    /// deterministic and cheap.
    fn policy(&self, state: &RawObservation) -> Action;

    /// Rewards the environment should emit while training this agent.
    ///
    /// Evaluation always scores 1 per obstacle passed and 0 otherwise,
    /// independent of this table.
    fn reward_values(&self) -> RewardValues {
        RewardValues::default()
    }

    /// Get the agent's name.
    fn name(&self) -> &str;

    /// Current episode and frame counters.
    fn counters(&self) -> SessionCounters;

    /// Count one environment step. Called by the driver once per frame.
    fn record_frame(&mut self);

    /// Seed the agent's internal random number generator.
    ///
    /// # Default Implementation
    ///
    /// Does nothing, for agents without randomness.
    fn set_rng_seed(&mut self, _seed: u64) {}

    /// Read-only view of the learned table, if the agent keeps one.
    ///
    /// Used by persistence and visualization, which must never hold the live
    /// mutable table.
    fn q_table_snapshot(&self) -> Option<&QTable> {
        None
    }
}
