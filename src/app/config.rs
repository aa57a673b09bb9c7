//! Configuration types for agent creation and training runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, discretizer::Discretizer};

/// Learning hyperparameters, fixed for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// α, in (0, 1]
    pub learning_rate: f64,
    /// γ, in [0, 1]
    pub discount_factor: f64,
    /// ε, in [0, 1]
    pub epsilon: f64,
}

impl Hyperparameters {
    /// Create validated hyperparameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if any value is outside its range.
    pub fn new(learning_rate: f64, discount_factor: f64, epsilon: f64) -> Result<Self> {
        let params = Self {
            learning_rate,
            discount_factor,
            epsilon,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(Error::config(format!(
                "learning rate {} must lie in (0, 1]",
                self.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(Error::config(format!(
                "discount factor {} must lie in [0, 1]",
                self.discount_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(Error::config(format!(
                "epsilon {} must lie in [0, 1]",
                self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            discount_factor: 1.0,
            epsilon: 0.1,
        }
    }
}

/// Rewards emitted by the environment during training.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardValues {
    /// Passing an obstacle
    pub positive: f64,
    /// Any other frame
    pub tick: f64,
    /// Crashing
    pub loss: f64,
}

impl RewardValues {
    /// Rewards used when scoring a trained agent: one point per obstacle passed.
    pub fn evaluation() -> Self {
        Self {
            positive: 1.0,
            tick: 0.0,
            loss: 0.0,
        }
    }
}

impl Default for RewardValues {
    fn default() -> Self {
        Self {
            positive: 1.0,
            tick: 0.0,
            loss: -5.0,
        }
    }
}

/// Screen dimensions that define the discretizer's source ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
}

impl ScreenConfig {
    pub fn discretizer(&self) -> Result<Discretizer> {
        Discretizer::for_screen(self.width, self.height)
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: crate::discretizer::SCREEN_WIDTH,
            height: crate::discretizer::SCREEN_HEIGHT,
        }
    }
}

/// Settings for the training driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    /// Number of training episodes
    pub episodes: usize,
    /// Truncate episodes that run longer than this many frames
    pub max_frames_per_episode: Option<usize>,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Directory receiving q-value tables
    pub results_dir: PathBuf,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            episodes: 4000,
            max_frames_per_episode: None,
            seed: None,
            results_dir: PathBuf::from("results"),
        }
    }
}

/// File-level configuration, loadable from TOML.
///
/// Every table and field is optional; missing values take their defaults.
///
/// ```toml
/// [hyperparameters]
/// learning_rate = 0.1
/// discount_factor = 1.0
/// epsilon = 0.1
///
/// [rewards]
/// loss = -5.0
///
/// [training]
/// episodes = 4000
/// seed = 7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlappyConfig {
    pub hyperparameters: Hyperparameters,
    pub rewards: RewardValues,
    pub screen: ScreenConfig,
    pub training: TrainingSettings,
}

impl FlappyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| Error::SerializationContext {
            operation: "parse TOML configuration".to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            operation: format!("read configuration {path:?}"),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| Error::SerializationContext {
            operation: "serialize configuration to TOML".to_string(),
            message: e.to_string(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.hyperparameters.validate()?;
        self.screen.discretizer()?;
        if self.training.max_frames_per_episode == Some(0) {
            return Err(Error::config("max_frames_per_episode must be positive"));
        }
        Ok(())
    }

    /// Agent configuration derived from this file.
    pub fn agent_config(&self) -> Result<AgentConfig> {
        let mut config = AgentConfig::new(self.hyperparameters)
            .with_discretizer(self.screen.discretizer()?)
            .with_reward_values(self.rewards);
        if let Some(seed) = self.training.seed {
            config = config.with_seed(seed);
        }
        Ok(config)
    }
}

/// Configuration for creating a Q-learning agent.
///
/// # Examples
///
/// ```
/// use flappy::app::{AgentConfig, Hyperparameters};
///
/// let config = AgentConfig::new(Hyperparameters::new(0.2, 0.9, 0.05)?)
///     .with_seed(42);
/// # Ok::<(), flappy::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentConfig {
    pub hyperparameters: Hyperparameters,
    pub discretizer: Discretizer,
    pub reward_values: RewardValues,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl AgentConfig {
    pub fn new(hyperparameters: Hyperparameters) -> Self {
        Self {
            hyperparameters,
            discretizer: Discretizer::default(),
            reward_values: RewardValues::default(),
            seed: None,
        }
    }

    pub fn with_hyperparameters(mut self, hyperparameters: Hyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
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

    /// Set the random seed for deterministic behavior.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(Hyperparameters::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyperparameter_ranges() {
        assert!(Hyperparameters::new(1.0, 0.0, 0.0).is_ok());
        assert!(Hyperparameters::new(0.0, 0.5, 0.1).is_err());
        assert!(Hyperparameters::new(0.5, 1.5, 0.1).is_err());
        assert!(Hyperparameters::new(0.5, 0.5, -0.1).is_err());
        assert!(Hyperparameters::new(f64::NAN, 0.5, 0.1).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FlappyConfig::from_toml_str(
            "[hyperparameters]\nepsilon = 0.05\n\n[training]\nepisodes = 10\nseed = 3\n",
        )
        .unwrap();
        assert_eq!(config.hyperparameters.epsilon, 0.05);
        assert_eq!(config.hyperparameters.learning_rate, 0.1);
        assert_eq!(config.rewards, RewardValues::default());
        assert_eq!(config.training.episodes, 10);
        assert_eq!(config.agent_config().unwrap().seed, Some(3));
    }

    #[test]
    fn test_agent_config_builder() {
        let hyper = Hyperparameters::new(0.3, 0.8, 0.0).unwrap();
        let config = AgentConfig::default()
            .with_hyperparameters(hyper)
            .with_reward_values(RewardValues::evaluation())
            .with_seed(5);
        assert_eq!(config.hyperparameters, hyper);
        assert_eq!(config.reward_values.loss, 0.0);
        assert_eq!(config.seed, Some(5));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = FlappyConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(FlappyConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_values_rejected() {
        let err = FlappyConfig::from_toml_str("[hyperparameters]\nlearning_rate = 2.0\n");
        assert!(matches!(err, Err(Error::InvalidConfiguration { .. })));

        let err = FlappyConfig::from_toml_str("[screen]\nwidth = 0.0\n");
        assert!(matches!(err, Err(Error::InvalidConfiguration { .. })));

        let err = FlappyConfig::from_toml_str("hyperparameters = 3");
        assert!(matches!(err, Err(Error::SerializationContext { .. })));
    }
}
