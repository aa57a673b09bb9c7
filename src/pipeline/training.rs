//! Training and evaluation driver for game-playing agents

use std::path::Path;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    ports::{EpisodeSummary, Environment, FlappyAgent, Observer},
    q_learning::QTable,
    types::{Action, RawObservation},
};

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of episodes to play
    pub num_episodes: usize,

    /// Random seed handed to the agent before the first episode
    pub seed: Option<u64>,

    /// Truncate episodes that run longer than this many frames
    pub max_frames_per_episode: Option<usize>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            num_episodes: 4000,
            seed: None,
            max_frames_per_episode: None,
        }
    }
}

/// Result of a training or evaluation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Episodes played, including truncated ones
    pub episodes: usize,

    /// Episodes cut off by the frame cap
    pub truncated: usize,

    /// Frames played across all episodes
    pub frames: usize,

    /// Sum of all episode scores
    pub total_score: f64,

    /// Mean episode score
    pub mean_score: f64,

    /// Highest episode score
    pub best_score: f64,

    /// Keys in the agent's table at the end of the run
    pub table_size: Option<usize>,
}

impl TrainingResult {
    /// Aggregate per-episode summaries
    pub fn from_episodes(episodes: &[EpisodeSummary], table_size: Option<usize>) -> Self {
        let total_score: f64 = episodes.iter().map(|e| e.score).sum();
        let mean_score = if episodes.is_empty() {
            0.0
        } else {
            total_score / episodes.len() as f64
        };
        let best_score = episodes
            .iter()
            .map(|e| e.score)
            .reduce(f64::max)
            .unwrap_or(0.0);

        Self {
            episodes: episodes.len(),
            truncated: episodes.iter().filter(|e| e.truncated).count(),
            frames: episodes.iter().map(|e| e.frames).sum(),
            total_score,
            mean_score,
            best_score,
            table_size,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// How the pipeline drives the agent for one run.
enum Driver<'a> {
    /// ε-greedy actions, learning from every transition
    Train(&'a mut dyn FlappyAgent),
    /// Greedy actions, table untouched
    Evaluate(&'a dyn FlappyAgent),
}

impl Driver<'_> {
    fn act(&mut self, state: &RawObservation) -> Action {
        match self {
            Driver::Train(agent) => agent.training_policy(state),
            Driver::Evaluate(agent) => agent.policy(state),
        }
    }

    fn learn(
        &mut self,
        s1: &RawObservation,
        action: Action,
        reward: f64,
        s2: &RawObservation,
        end: bool,
    ) {
        if let Driver::Train(agent) = self {
            agent.observe(s1, action, reward, s2, end);
            agent.record_frame();
        }
    }

    fn table_size(&self) -> Option<usize> {
        let table = match self {
            Driver::Train(agent) => agent.q_table_snapshot(),
            Driver::Evaluate(agent) => agent.q_table_snapshot(),
        };
        table.map(QTable::size)
    }

    fn name(&self) -> &str {
        match self {
            Driver::Train(agent) => agent.name(),
            Driver::Evaluate(agent) => agent.name(),
        }
    }
}

/// Episode loop connecting an agent to an environment
///
/// # Examples
///
/// ```no_run
/// use flappy::{
///     adapters::FlappySim,
///     app::{Hyperparameters, RewardValues},
///     pipeline::{TrainingConfig, TrainingPipeline},
///     q_learning::QLearningAgent,
/// };
///
/// let mut agent = QLearningAgent::new(Hyperparameters::default());
/// let mut env = FlappySim::with_rewards(RewardValues::default(), Some(1));
/// let config = TrainingConfig {
///     num_episodes: 100,
///     seed: Some(1),
///     max_frames_per_episode: Some(10_000),
/// };
/// let result = TrainingPipeline::new(config).train(&mut agent, &mut env)?;
/// println!("best score {}", result.best_score);
/// # Ok::<(), flappy::Error>(())
/// ```
pub struct TrainingPipeline {
    config: TrainingConfig,
    observers: Vec<Box<dyn Observer>>,
}

impl TrainingPipeline {
    /// Create a new training pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Train `agent` against `env` for the configured number of episodes.
    ///
    /// Every transition is passed to [`FlappyAgent::observe`]; the successor
    /// state of one call is the predecessor of the next within an episode.
    pub fn train(
        &mut self,
        agent: &mut dyn FlappyAgent,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        if let Some(seed) = self.config.seed {
            agent.set_rng_seed(seed);
        }
        self.run(Driver::Train(agent), env)
    }

    /// Play greedy episodes without learning.
    pub fn evaluate(
        &mut self,
        agent: &dyn FlappyAgent,
        env: &mut dyn Environment,
    ) -> Result<TrainingResult> {
        self.run(Driver::Evaluate(agent), env)
    }

    fn run(&mut self, mut driver: Driver<'_>, env: &mut dyn Environment) -> Result<TrainingResult> {
        let total = self.config.num_episodes;
        info!("{}: playing {total} episodes", driver.name());

        for observer in &mut self.observers {
            observer.on_training_start(total)?;
        }

        if env.is_terminal() {
            env.reset_episode();
        }

        let mut summaries = Vec::with_capacity(total);
        for episode in 0..total {
            let summary = self.play_episode(episode, &mut driver, env)?;
            summaries.push(summary);
        }

        for observer in &mut self.observers {
            observer.on_training_end()?;
        }

        let result = TrainingResult::from_episodes(&summaries, driver.table_size());
        if result.truncated > 0 {
            warn!(
                "{} of {} episodes hit the frame cap and never terminated",
                result.truncated, result.episodes
            );
        }
        info!(
            "{}: {} episodes, {} frames, mean score {:.3}, best {}",
            driver.name(),
            result.episodes,
            result.frames,
            result.mean_score,
            result.best_score
        );
        Ok(result)
    }

    fn play_episode(
        &mut self,
        episode: usize,
        driver: &mut Driver<'_>,
        env: &mut dyn Environment,
    ) -> Result<EpisodeSummary> {
        for observer in &mut self.observers {
            observer.on_episode_start(episode)?;
        }

        let mut state = env.observation();
        let mut score = 0.0;
        let mut frames = 0;

        let truncated = loop {
            if env.is_terminal() {
                break false;
            }
            if self
                .config
                .max_frames_per_episode
                .is_some_and(|cap| frames >= cap)
            {
                break true;
            }

            let action = driver.act(&state);
            let reward = env.apply_action(action);
            let next = env.observation();
            driver.learn(&state, action, reward, &next, env.is_terminal());

            for observer in &mut self.observers {
                observer.on_step(episode, frames, &state, action, reward)?;
            }

            score += reward;
            frames += 1;
            state = next;
        };

        if truncated {
            debug!("episode {episode} truncated after {frames} frames");
        }

        let summary = EpisodeSummary {
            episode,
            score,
            frames,
            truncated,
            table_size: driver.table_size(),
        };
        for observer in &mut self.observers {
            observer.on_episode_end(&summary)?;
        }

        env.reset_episode();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        adapters::FlappySim,
        app::{Hyperparameters, RewardValues},
        q_learning::QLearningAgent,
    };

    /// Falls one unit per frame regardless of action; crashes after `length` frames.
    struct Corridor {
        length: usize,
        frame: usize,
    }

    impl Environment for Corridor {
        fn observation(&self) -> RawObservation {
            RawObservation::new(20.0 * self.frame as f64, 200.0, 100.0, 1)
        }

        fn apply_action(&mut self, _action: Action) -> f64 {
            self.frame += 1;
            if self.is_terminal() { -5.0 } else { 1.0 }
        }

        fn is_terminal(&self) -> bool {
            self.frame >= self.length
        }

        fn reset_episode(&mut self) {
            self.frame = 0;
        }
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<EpisodeSummary>>>);

    impl Observer for Recorder {
        fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
            self.0.lock().unwrap().push(*summary);
            Ok(())
        }
    }

    fn agent() -> QLearningAgent {
        QLearningAgent::new(Hyperparameters::new(0.1, 1.0, 0.1).unwrap())
    }

    fn config(num_episodes: usize, max_frames: Option<usize>) -> TrainingConfig {
        TrainingConfig {
            num_episodes,
            seed: Some(42),
            max_frames_per_episode: max_frames,
        }
    }

    #[test]
    fn test_training_counts_episodes_and_frames() {
        let mut agent = agent();
        let mut env = Corridor { length: 6, frame: 0 };
        let recorder = Recorder::default();

        let result = TrainingPipeline::new(config(4, None))
            .with_observer(Box::new(recorder.clone()))
            .train(&mut agent, &mut env)
            .unwrap();

        assert_eq!(result.episodes, 4);
        assert_eq!(result.frames, 24);
        assert_eq!(result.truncated, 0);
        assert_eq!(result.best_score, 0.0);
        assert_eq!(agent.counters().episodes(), 4);
        assert_eq!(agent.counters().frames(), 24);
        assert_eq!(result.table_size, Some(agent.q_table().size()));
        assert!(agent.q_table().size() > 0);

        let summaries = recorder.0.lock().unwrap();
        assert_eq!(summaries.len(), 4);
        assert!(summaries.iter().all(|s| s.frames == 6 && !s.truncated));
    }

    #[test]
    fn test_frame_cap_truncates_without_ending_agent_episodes() {
        let mut agent = agent();
        let mut env = Corridor {
            length: usize::MAX,
            frame: 0,
        };

        let result = TrainingPipeline::new(config(3, Some(10)))
            .train(&mut agent, &mut env)
            .unwrap();

        assert_eq!(result.episodes, 3);
        assert_eq!(result.truncated, 3);
        assert_eq!(result.frames, 30);
        assert_eq!(result.total_score, 30.0);
        assert_eq!(agent.counters().episodes(), 0);
    }

    #[test]
    fn test_evaluation_leaves_table_untouched() {
        let mut agent = agent();
        let mut env = Corridor { length: 5, frame: 0 };
        TrainingPipeline::new(config(3, None))
            .train(&mut agent, &mut env)
            .unwrap();
        let before = agent.q_table().clone();
        let counters = agent.counters();

        let result = TrainingPipeline::new(config(2, None))
            .evaluate(&agent, &mut env)
            .unwrap();

        assert_eq!(result.episodes, 2);
        assert_eq!(agent.q_table(), &before);
        assert_eq!(agent.counters(), counters);
    }

    #[test]
    fn test_training_against_simulator_is_reproducible() {
        let run = || {
            let mut agent = agent();
            let mut env = FlappySim::with_rewards(RewardValues::default(), Some(7));
            let result = TrainingPipeline::new(config(5, Some(2000)))
                .train(&mut agent, &mut env)
                .unwrap();
            (result, agent.into_q_table())
        };
        let (first, first_table) = run();
        let (second, second_table) = run();
        assert_eq!(first, second);
        assert_eq!(first_table, second_table);
    }

    #[test]
    fn test_result_json_roundtrip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("summary.json");
        let result = TrainingResult::from_episodes(
            &[
                EpisodeSummary {
                    episode: 0,
                    score: 2.0,
                    frames: 40,
                    truncated: false,
                    table_size: Some(3),
                },
                EpisodeSummary {
                    episode: 1,
                    score: -4.0,
                    frames: 20,
                    truncated: true,
                    table_size: Some(5),
                },
            ],
            Some(5),
        );
        assert_eq!(result.mean_score, -1.0);
        assert_eq!(result.best_score, 2.0);

        result.save(&path).unwrap();
        assert_eq!(TrainingResult::load(&path).unwrap(), result);
    }
}
