//! Dependency injection container for the application.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use super::config::AgentConfig;
use crate::{
    Result,
    adapters::{CsvRepository, table_file_stem},
    ports::{FlappyAgent, QTableRepository},
    q_learning::{QLearningAgent, QTable},
};

/// Application with dependency injection.
///
/// Owns the table repository and creates agents with a shared default seed.
///
/// # Examples
///
/// ```no_run
/// use flappy::app::{AgentConfig, App};
/// use std::path::Path;
///
/// let app = App::new();
/// let agent = app.create_agent(AgentConfig::default().with_seed(42));
/// // Train the agent...
/// let path = app.save_table(&agent, Path::new("results"))?;
/// # Ok::<(), flappy::Error>(())
/// ```
pub struct App {
    /// Repository for q-table persistence
    table_repository: Arc<dyn QTableRepository + Send + Sync>,
    /// Default random seed (None = non-deterministic)
    default_seed: Option<u64>,
}

impl App {
    /// Create a new app writing tables as CSV files.
    pub fn new() -> Self {
        Self {
            table_repository: Arc::new(CsvRepository::new()),
            default_seed: None,
        }
    }

    /// Create a builder for constructing app with custom dependencies.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::new()
    }

    /// Get the table repository.
    pub fn table_repository(&self) -> Arc<dyn QTableRepository + Send + Sync> {
        Arc::clone(&self.table_repository)
    }

    /// Create a fresh agent. A seed in `config` wins over the app default.
    pub fn create_agent(&self, config: AgentConfig) -> QLearningAgent {
        let config = match config.seed.or(self.default_seed) {
            Some(seed) => config.with_seed(seed),
            None => config,
        };
        QLearningAgent::from_config(&config)
    }

    /// Create an agent starting from the table stored at `path`.
    pub fn load_agent(&self, path: &Path, config: AgentConfig) -> Result<QLearningAgent> {
        let table = self.load_table(path)?;
        Ok(self.create_agent(config).with_q_table(table))
    }

    pub fn load_table(&self, path: &Path) -> Result<QTable> {
        self.table_repository.load(path)
    }

    /// Save the agent's table into `dir` as `qvalues_<episodes>.csv`.
    ///
    /// Returns the path actually written, which carries a numeric suffix if
    /// the plain name was taken.
    pub fn save_table(&self, agent: &QLearningAgent, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(table_file_stem(agent.counters().episodes()));
        self.table_repository.save(agent.q_table(), &target)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing app with custom dependencies.
///
/// # Examples
///
/// ```
/// use flappy::app::AppBuilder;
/// use flappy::adapters::InMemoryRepository;
///
/// let app = AppBuilder::new()
///     .with_repository(InMemoryRepository::new())
///     .with_default_seed(42)
///     .build();
/// ```
pub struct AppBuilder {
    table_repository: Option<Arc<dyn QTableRepository + Send + Sync>>,
    default_seed: Option<u64>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            table_repository: None,
            default_seed: None,
        }
    }

    /// Set a custom table repository.
    pub fn with_repository<R: QTableRepository + Send + Sync + 'static>(mut self, repo: R) -> Self {
        self.table_repository = Some(Arc::new(repo));
        self
    }

    /// Set a default random seed for all agents created by this container.
    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    /// Build the app. Falls back to [`CsvRepository`] when no repository was set.
    pub fn build(self) -> App {
        App {
            table_repository: self
                .table_repository
                .unwrap_or_else(|| Arc::new(CsvRepository::new())),
            default_seed: self.default_seed,
        }
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapters::InMemoryRepository,
        types::{Action, RawObservation},
    };

    fn trained(app: &App) -> QLearningAgent {
        let mut agent = app.create_agent(AgentConfig::default());
        let s1 = RawObservation::new(200.0, 180.0, 100.0, 2);
        let s2 = RawObservation::new(230.0, 180.0, 96.0, 3);
        agent.observe(&s1, Action::NoOp, -5.0, &s2, true);
        agent
    }

    #[test]
    fn test_app_applies_default_seed() {
        let app = App::for_testing().with_default_seed(42).build();
        let agent = app.create_agent(AgentConfig::default());
        assert_eq!(agent.rng_seed(), Some(42));
    }

    #[test]
    fn test_config_seed_overrides_app_default() {
        let app = App::for_testing().with_default_seed(42).build();
        let agent = app.create_agent(AgentConfig::default().with_seed(123));
        assert_eq!(agent.rng_seed(), Some(123));
    }

    #[test]
    fn test_save_table_names_file_after_episodes() {
        let repo = InMemoryRepository::new();
        let app = App::for_testing().with_repository(repo.clone()).build();
        let agent = trained(&app);

        let first = app.save_table(&agent, Path::new("results")).unwrap();
        let second = app.save_table(&agent, Path::new("results")).unwrap();

        assert_eq!(first, PathBuf::from("results/qvalues_1.csv"));
        assert_eq!(second, PathBuf::from("results/qvalues_1_1.csv"));
        assert_eq!(repo.count(), 2);
    }

    #[test]
    fn test_load_agent_restores_table() {
        let app = App::for_testing()
            .with_repository(InMemoryRepository::new())
            .build();
        let agent = trained(&app);
        let path = app.save_table(&agent, Path::new("out")).unwrap();

        let restored = app.load_agent(&path, AgentConfig::default()).unwrap();
        assert_eq!(restored.q_table(), agent.q_table());
        assert_eq!(restored.counters().episodes(), 0);
    }
}
