//! Observer pattern for training pipelines
//!
//! Observers allow composable data collection during training without coupling
//! training logic to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::{
    Error, Result,
    ports::{EpisodeSummary, Observer},
    types::{Action, RawObservation},
};

/// Progress bar observer - Shows training progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    best_score: f64,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            best_score: 0.0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        let pb = ProgressBar::new(total_episodes as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} episodes (best: {msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.best_score = self.best_score.max(summary.score);
        if let Some(pb) = &self.progress_bar {
            pb.set_position(summary.episode as u64 + 1);
            pb.set_message(format!("{}", self.best_score));
        }
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!("{}", self.best_score));
        }
        Ok(())
    }
}

/// Metrics observer - Tracks per-episode scores and lengths
#[derive(Debug, Default)]
pub struct MetricsObserver {
    scores: Vec<f64>,
    frames: Vec<usize>,
    truncated: usize,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self::default()
    }

    pub fn episodes(&self) -> usize {
        self.scores.len()
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Mean score, 0.0 before the first episode
    pub fn mean_score(&self) -> f64 {
        if self.scores.is_empty() {
            0.0
        } else {
            self.scores.iter().mean()
        }
    }

    /// Sample standard deviation of scores, 0.0 with fewer than two episodes
    pub fn score_std_dev(&self) -> f64 {
        if self.scores.len() < 2 {
            0.0
        } else {
            self.scores.iter().std_dev()
        }
    }

    pub fn best_score(&self) -> f64 {
        self.scores.iter().copied().reduce(f64::max).unwrap_or(0.0)
    }

    /// Get average episode length in frames
    pub fn avg_episode_length(&self) -> f64 {
        if self.frames.is_empty() {
            0.0
        } else {
            self.frames.iter().sum::<usize>() as f64 / self.frames.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            episodes: self.episodes(),
            truncated: self.truncated,
            mean_score: self.mean_score(),
            score_std_dev: self.score_std_dev(),
            best_score: self.best_score(),
            avg_episode_length: self.avg_episode_length(),
        }
    }
}

/// Summary of training metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub episodes: usize,
    pub truncated: usize,
    pub mean_score: f64,
    pub score_std_dev: f64,
    pub best_score: f64,
    pub avg_episode_length: f64,
}

impl Observer for MetricsObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.scores.push(summary.score);
        self.frames.push(summary.frames);
        if summary.truncated {
            self.truncated += 1;
        }
        Ok(())
    }
}

/// JSONL observer - Writes one JSON object per finished episode
pub struct JsonlObserver {
    writer: BufWriter<File>,
}

impl JsonlObserver {
    /// Create a new JSONL observer, truncating `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl Observer for JsonlObserver {
    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        serde_json::to_writer(&mut self.writer, summary)?;
        writeln!(&mut self.writer)?;
        Ok(())
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Milestone observer - Logs a progress line every `interval` episodes
///
/// Each line carries the elapsed wall time, the episode count, the best
/// score so far and the size of the agent's table.
pub struct MilestoneObserver {
    interval: usize,
    started: Option<Instant>,
    best_score: f64,
    milestones: Vec<Milestone>,
}

/// State of training at a milestone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    /// Episodes finished (1-based count)
    pub episodes: usize,
    pub elapsed_secs: f64,
    pub best_score: f64,
    pub table_size: Option<usize>,
}

impl MilestoneObserver {
    /// # Panics
    ///
    /// Panics if `interval` is zero.
    pub fn new(interval: usize) -> Self {
        assert!(interval > 0, "milestone interval must be a positive integer");
        Self {
            interval,
            started: None,
            best_score: 0.0,
            milestones: Vec::new(),
        }
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }
}

impl Observer for MilestoneObserver {
    fn on_training_start(&mut self, _total_episodes: usize) -> Result<()> {
        self.started = Some(Instant::now());
        Ok(())
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.best_score = self.best_score.max(summary.score);
        let episodes = summary.episode + 1;
        if !episodes.is_multiple_of(self.interval) {
            return Ok(());
        }

        let elapsed_secs = self
            .started
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or_default();
        let milestone = Milestone {
            episodes,
            elapsed_secs,
            best_score: self.best_score,
            table_size: summary.table_size,
        };
        match milestone.table_size {
            Some(size) => info!(
                "[{elapsed_secs:.1}s] episode {episodes}: best score {}, table size {size}",
                milestone.best_score
            ),
            None => info!(
                "[{elapsed_secs:.1}s] episode {episodes}: best score {}",
                milestone.best_score
            ),
        }
        self.milestones.push(milestone);
        Ok(())
    }
}

/// Observer whose state stays readable after the pipeline takes ownership
///
/// Clones share the inner observer.
pub struct SharedObserver<O> {
    inner: Arc<Mutex<O>>,
}

impl<O> SharedObserver<O> {
    pub fn new(observer: O) -> Self {
        Self {
            inner: Arc::new(Mutex::new(observer)),
        }
    }

    /// Lock the inner observer
    pub fn get(&self) -> MutexGuard<'_, O> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<O> Clone for SharedObserver<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Observer> Observer for SharedObserver<O> {
    fn on_training_start(&mut self, total_episodes: usize) -> Result<()> {
        self.get().on_training_start(total_episodes)
    }

    fn on_episode_start(&mut self, episode: usize) -> Result<()> {
        self.get().on_episode_start(episode)
    }

    fn on_step(
        &mut self,
        episode: usize,
        frame: usize,
        state: &RawObservation,
        action: Action,
        reward: f64,
    ) -> Result<()> {
        self.get().on_step(episode, frame, state, action, reward)
    }

    fn on_episode_end(&mut self, summary: &EpisodeSummary) -> Result<()> {
        self.get().on_episode_end(summary)
    }

    fn on_training_end(&mut self) -> Result<()> {
        self.get().on_training_end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(episode: usize, score: f64, frames: usize) -> EpisodeSummary {
        EpisodeSummary {
            episode,
            score,
            frames,
            truncated: false,
            table_size: Some(episode * 10),
        }
    }

    #[test]
    fn test_metrics_observer() {
        let mut observer = MetricsObserver::new();
        assert_eq!(observer.mean_score(), 0.0);
        assert_eq!(observer.score_std_dev(), 0.0);

        observer.on_episode_end(&summary(0, 2.0, 30)).unwrap();
        observer.on_episode_end(&summary(1, 4.0, 50)).unwrap();
        observer.on_episode_end(&summary(2, 6.0, 70)).unwrap();

        let metrics = observer.summary();
        assert_eq!(metrics.episodes, 3);
        assert!((metrics.mean_score - 4.0).abs() < 1e-12);
        assert!((metrics.score_std_dev - 2.0).abs() < 1e-12);
        assert_eq!(metrics.best_score, 6.0);
        assert!((metrics.avg_episode_length - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_milestone_observer() {
        let mut observer = MilestoneObserver::new(2);
        observer.on_training_start(5).unwrap();
        for episode in 0..5 {
            observer
                .on_episode_end(&summary(episode, episode as f64, 10))
                .unwrap();
        }

        let milestones = observer.milestones();
        assert_eq!(milestones.len(), 2);
        assert_eq!(milestones[0].episodes, 2);
        assert_eq!(milestones[0].best_score, 1.0);
        assert_eq!(milestones[1].episodes, 4);
        assert_eq!(milestones[1].table_size, Some(30));
    }

    #[test]
    #[should_panic(expected = "milestone interval")]
    fn test_milestone_interval_must_be_positive() {
        MilestoneObserver::new(0);
    }

    #[test]
    fn test_shared_observer_exposes_inner_state() {
        let shared = SharedObserver::new(MetricsObserver::new());
        let mut boxed: Box<dyn Observer> = Box::new(shared.clone());
        boxed.on_episode_end(&summary(0, 3.0, 10)).unwrap();
        assert_eq!(shared.get().episodes(), 1);
        assert_eq!(shared.get().best_score(), 3.0);
    }

    #[test]
    fn test_jsonl_observer_writes_one_line_per_episode() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("episodes.jsonl");
        {
            let mut observer = JsonlObserver::new(&path).unwrap();
            observer.on_episode_end(&summary(0, 1.0, 12)).unwrap();
            observer.on_episode_end(&summary(1, -5.0, 8)).unwrap();
            observer.on_training_end().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: EpisodeSummary = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second, summary(1, -5.0, 8));
    }
}
