//! Tabular Q-learning agent
//!
//! Discretizes raw observations, picks actions greedily or ε-greedily from
//! its [`QTable`], and applies the off-policy TD update on every observed
//! transition.

use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    app::{AgentConfig, Hyperparameters, RewardValues},
    discretizer::Discretizer,
    ports::FlappyAgent,
    q_learning::q_table::QTable,
    session::SessionCounters,
    types::{Action, DiscreteKey, RawObservation},
};

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Q-learning agent (off-policy TD control)
///
/// Learns Q* by always updating toward the best estimate of the successor
/// state, regardless of the action actually taken there.
#[derive(Debug, Clone)]
pub struct QLearningAgent {
    q_table: QTable,
    discretizer: Discretizer,
    hyperparameters: Hyperparameters,
    reward_values: RewardValues,
    counters: SessionCounters,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl QLearningAgent {
    /// Create a new Q-learning agent with the default discretizer
    ///
    /// # Arguments
    ///
    /// * `hyperparameters` - α, γ and ε for the run
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            q_table: QTable::new(),
            discretizer: Discretizer::default(),
            hyperparameters,
            reward_values: RewardValues::default(),
            counters: SessionCounters::new(),
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    pub fn from_config(config: &AgentConfig) -> Self {
        let agent = Self::new(config.hyperparameters)
            .with_discretizer(config.discretizer)
            .with_reward_values(config.reward_values);
        match config.seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_discretizer(mut self, discretizer: Discretizer) -> Self {
        self.discretizer = discretizer;
        self
    }

    pub fn with_reward_values(mut self, reward_values: RewardValues) -> Self {
        self.reward_values = reward_values;
        self
    }

    /// Start from a previously learned table
    pub fn with_q_table(mut self, q_table: QTable) -> Self {
        self.q_table = q_table;
        self
    }

    pub(crate) fn with_counters(mut self, counters: SessionCounters) -> Self {
        self.counters = counters;
        self
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    pub fn into_q_table(self) -> QTable {
        self.q_table
    }

    pub fn hyperparameters(&self) -> Hyperparameters {
        self.hyperparameters
    }

    pub fn discretizer(&self) -> &Discretizer {
        &self.discretizer
    }

    pub fn rng_seed(&self) -> Option<u64> {
        self.rng_seed
    }

    /// Lattice key for a raw observation
    pub fn discretize(&self, state: &RawObservation) -> DiscreteKey {
        self.discretizer.discretize(state)
    }

    /// Estimate for a raw state and action, 0.0 when never updated
    pub fn q_value(&self, state: &RawObservation, action: Action) -> f64 {
        self.q_table.get(&self.discretize(state), action)
    }

    /// ε-greedy action selection
    fn select_action_epsilon_greedy(&mut self, key: &DiscreteKey) -> Action {
        if self.rng.random::<f64>() < self.hyperparameters.epsilon {
            // Explore: uniformly random action
            Action::ALL[self.rng.random_range(0..Action::ALL.len())]
        } else {
            self.q_table.greedy_action(key)
        }
    }

    /// Clear learned values and counters, rewinding the generator to its seed
    pub fn reset(&mut self) {
        self.q_table.reset();
        self.counters = SessionCounters::new();
        self.rng = build_rng(self.rng_seed);
    }
}

impl FlappyAgent for QLearningAgent {
    fn observe(
        &mut self,
        s1: &RawObservation,
        action: Action,
        reward: f64,
        s2: &RawObservation,
        end: bool,
    ) {
        let key = self.discretize(s1);
        let next_key = self.discretize(s2);

        // The successor term is kept on terminal transitions too.
        let new_q = self.q_table.q_learning_update(
            key,
            action,
            reward,
            &next_key,
            self.hyperparameters.learning_rate,
            self.hyperparameters.discount_factor,
        );

        if end {
            self.counters.end_episode();
            debug!(
                "episode {} ended at {key} after {action}: q={new_q:.4}, table size {}",
                self.counters.episodes(),
                self.q_table.size()
            );
        }
    }

    fn training_policy(&mut self, state: &RawObservation) -> Action {
        let key = self.discretize(state);
        self.select_action_epsilon_greedy(&key)
    }

    fn policy(&self, state: &RawObservation) -> Action {
        self.q_table.greedy_action(&self.discretize(state))
    }

    fn reward_values(&self) -> RewardValues {
        self.reward_values
    }

    fn name(&self) -> &str {
        "Q-Learning"
    }

    fn counters(&self) -> SessionCounters {
        self.counters
    }

    fn record_frame(&mut self) {
        self.counters.record_frame();
    }

    fn set_rng_seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
    }

    fn q_table_snapshot(&self) -> Option<&QTable> {
        Some(&self.q_table)
    }
}
