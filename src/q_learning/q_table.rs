//! Q-table implementation for temporal difference learning

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Action, DiscreteKey};

/// Stored estimates for one key. `None` means never written, which is
/// distinct from an explicit `0.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionValues {
    pub flap: Option<f64>,
    pub noop: Option<f64>,
}

impl ActionValues {
    pub fn get(&self, action: Action) -> Option<f64> {
        match action {
            Action::Flap => self.flap,
            Action::NoOp => self.noop,
        }
    }

    pub fn set(&mut self, action: Action, value: f64) {
        match action {
            Action::Flap => self.flap = Some(value),
            Action::NoOp => self.noop = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.flap.is_none() && self.noop.is_none()
    }
}

/// Q-table mapping discrete keys to per-action value estimates
///
/// Entries are created lazily on first write and never removed during a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QTable {
    entries: HashMap<DiscreteKey, ActionValues>,
}

impl QTable {
    /// Create an empty Q-table
    pub fn new() -> Self {
        Self::default()
    }

    /// Get Q-value for a key-action pair, `0.0` when never written
    pub fn get(&self, key: &DiscreteKey, action: Action) -> f64 {
        self.entries
            .get(key)
            .and_then(|values| values.get(action))
            .unwrap_or(0.0)
    }

    /// Set Q-value for a key-action pair
    pub fn set(&mut self, key: DiscreteKey, action: Action, value: f64) {
        self.entries.entry(key).or_default().set(action, value);
    }

    /// Stored values for a key, if any were written
    pub fn entry(&self, key: &DiscreteKey) -> Option<ActionValues> {
        self.entries.get(key).copied()
    }

    /// Insert a full entry. Empty pairs are not stored.
    pub(crate) fn insert_entry(&mut self, key: DiscreteKey, values: ActionValues) {
        if !values.is_empty() {
            self.entries.insert(key, values);
        }
    }

    /// Get maximum Q-value over both actions in a state
    pub fn max_q(&self, key: &DiscreteKey) -> f64 {
        self.get(key, Action::Flap).max(self.get(key, Action::NoOp))
    }

    /// Select greedy action
    ///
    /// Flap wins only on a strictly greater estimate; ties and unseen keys
    /// resolve to `NoOp`.
    pub fn greedy_action(&self, key: &DiscreteKey) -> Action {
        if self.get(key, Action::Flap) > self.get(key, Action::NoOp) {
            Action::Flap
        } else {
            Action::NoOp
        }
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    ///
    /// The successor term is always included, terminal or not.
    pub fn q_learning_update(
        &mut self,
        key: DiscreteKey,
        action: Action,
        reward: f64,
        next_key: &DiscreteKey,
        learning_rate: f64,
        discount_factor: f64,
    ) -> f64 {
        let current_q = self.get(&key, action);
        let td_target = reward + discount_factor * self.max_q(next_key);
        let td_error = td_target - current_q;
        let new_q = current_q + learning_rate * td_error;
        self.set(key, action, new_q);
        new_q
    }

    /// Iterate over stored entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&DiscreteKey, &ActionValues)> {
        self.entries.iter()
    }

    /// Stored entries sorted by key
    pub fn sorted_entries(&self) -> Vec<(DiscreteKey, ActionValues)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Reset all Q-values
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Number of keys with at least one stored value
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
