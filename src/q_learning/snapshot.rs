//! Whole-agent snapshots in MessagePack.
//!
//! The CSV table format only carries values. A snapshot also keeps the
//! hyperparameters, discretizer, counters and seed so training can resume.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::{
    app::{Hyperparameters, RewardValues},
    discretizer::Discretizer,
    ports::FlappyAgent,
    q_learning::{
        agent::QLearningAgent,
        q_table::{ActionValues, QTable},
    },
    session::SessionCounters,
    types::DiscreteKey,
};

/// Metadata about the training process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetadata {
    /// Number of episodes trained
    pub episodes_trained: Option<usize>,
    /// Random seed used (if any)
    pub seed: Option<u64>,
    /// Best episode score seen during training
    pub best_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQAgent {
    pub version: u32,
    pub hyperparameters: Hyperparameters,
    pub reward_values: RewardValues,
    pub discretizer: Discretizer,
    pub counters: SessionCounters,
    pub rng_seed: Option<u64>,
    entries: Vec<(DiscreteKey, ActionValues)>,
    pub metadata: TrainingMetadata,
}

impl SavedQAgent {
    pub const VERSION: u32 = 1;

    pub fn from_agent(agent: &QLearningAgent, metadata: TrainingMetadata) -> Self {
        Self {
            version: Self::VERSION,
            hyperparameters: agent.hyperparameters(),
            reward_values: agent.reward_values(),
            discretizer: *agent.discretizer(),
            counters: agent.counters(),
            rng_seed: agent.rng_seed(),
            entries: agent.q_table().sorted_entries(),
            metadata,
        }
    }

    pub fn table_size(&self) -> usize {
        self.entries.len()
    }

    pub fn to_agent(&self) -> Result<QLearningAgent> {
        if self.version != Self::VERSION {
            return Err(anyhow!(crate::Error::UnsupportedSnapshotVersion {
                found: self.version,
                expected: Self::VERSION,
            }));
        }
        self.hyperparameters
            .validate()
            .context("Snapshot carries invalid hyperparameters")?;

        let mut table = QTable::new();
        for (key, values) in &self.entries {
            table.insert_entry(*key, *values);
        }

        let agent = QLearningAgent::new(self.hyperparameters)
            .with_discretizer(self.discretizer)
            .with_reward_values(self.reward_values)
            .with_counters(self.counters)
            .with_q_table(table);
        Ok(match self.rng_seed {
            Some(seed) => agent.with_seed(seed),
            None => agent,
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create file: {}", path.as_ref().display()))?;
        let mut writer = BufWriter::new(file);

        rmp_serde::encode::write(&mut writer, self).context("Failed to serialize Q-learning agent")?;

        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())
            .with_context(|| format!("Failed to open file: {}", path.as_ref().display()))?;
        let reader = BufReader::new(file);

        rmp_serde::decode::from_read(reader).context("Failed to deserialize Q-learning agent")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, RawObservation};

    fn trained_agent() -> QLearningAgent {
        let mut agent = QLearningAgent::new(Hyperparameters::new(0.5, 0.9, 0.2).unwrap()).with_seed(7);
        let s1 = RawObservation::new(100.0, 250.0, 140.0, -2);
        let s2 = RawObservation::new(104.0, 250.0, 136.0, -1);
        agent.observe(&s1, Action::Flap, 1.0, &s2, false);
        agent.observe(&s2, Action::NoOp, -5.0, &s1, true);
        agent.record_frame();
        agent
    }

    #[test]
    fn test_q_learning_roundtrip() -> Result<()> {
        let agent = trained_agent();
        assert!(agent.q_table().size() > 0);

        let saved = SavedQAgent::from_agent(&agent, TrainingMetadata::default());
        let bytes = rmp_serde::to_vec(&saved)?;
        let loaded: SavedQAgent = rmp_serde::from_slice(&bytes)?;
        let restored = loaded.to_agent()?;

        assert_eq!(restored.q_table(), agent.q_table());
        assert_eq!(restored.counters(), agent.counters());
        assert_eq!(restored.hyperparameters(), agent.hyperparameters());
        assert_eq!(restored.rng_seed(), Some(7));
        Ok(())
    }

    #[test]
    fn test_unknown_version_rejected() {
        let mut saved = SavedQAgent::from_agent(&trained_agent(), TrainingMetadata::default());
        saved.version = 99;
        assert!(saved.to_agent().is_err());
    }
}
