//! Evaluate command - Play greedy episodes with a learned table

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use crate::{
    adapters::{FlappySim, SimConfig},
    app::{App, FlappyConfig, RewardValues},
    cli::output::{format_number, print_section, print_stats_table},
    pipeline::{
        MetricsObserver, MetricsSummary, ProgressObserver, SharedObserver, TrainingConfig,
        TrainingPipeline, TrainingResult,
    },
    q_learning::{QLearningAgent, SavedQAgent},
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate a learned q-value table")]
pub struct EvaluateArgs {
    /// Q-value table (CSV) or agent snapshot (.msgpack)
    pub table: PathBuf,

    /// TOML configuration file; its `[screen]` table must match the one
    /// used for training
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Number of evaluation episodes
    #[arg(long, short = 'n', default_value_t = 100)]
    pub episodes: usize,

    /// Seed for obstacle placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Truncate episodes longer than this many frames
    #[arg(long, default_value_t = 10_000)]
    pub max_frames: usize,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Export results to a JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EvaluationReport<'a> {
    table: &'a PathBuf,
    result: &'a TrainingResult,
    metrics: MetricsSummary,
}

fn is_snapshot(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("msgpack"))
}

fn load_config(path: Option<&std::path::Path>) -> Result<FlappyConfig> {
    match path {
        Some(path) => FlappyConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(FlappyConfig::default()),
    }
}

fn load_agent(app: &App, path: &std::path::Path, config: &FlappyConfig) -> Result<QLearningAgent> {
    if is_snapshot(path) {
        let agent = SavedQAgent::load_from_file(path)?.to_agent()?;
        if *agent.discretizer() != config.screen.discretizer()? {
            bail!(
                "snapshot {} was trained on a different screen than {}x{}; pass its --config",
                path.display(),
                config.screen.width,
                config.screen.height
            );
        }
        Ok(agent)
    } else {
        app.load_agent(path, config.agent_config()?)
            .with_context(|| format!("Failed to load q-values from {}", path.display()))
    }
}

pub fn execute(args: EvaluateArgs) -> Result<()> {
    println!("Loading trained agent from: {}", args.table.display());
    let app = App::new();
    let config = load_config(args.config.as_deref())?;
    let agent = load_agent(&app, &args.table, &config)?;

    let mut env = FlappySim::new(
        SimConfig::for_screen(&config.screen),
        RewardValues::evaluation(),
        args.seed,
    );
    let metrics = SharedObserver::new(MetricsObserver::new());

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_episodes: args.episodes,
        seed: None,
        max_frames_per_episode: Some(args.max_frames),
    })
    .with_observer(Box::new(metrics.clone()));
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    let result = pipeline.evaluate(&agent, &mut env)?;
    let summary = metrics.get().summary();

    print_section("Evaluation Results");
    print_stats_table(&[
        ("Table size", format_number(agent.q_table().size())),
        ("Episodes", format_number(result.episodes)),
        ("Truncated", format_number(result.truncated)),
        ("Mean score", format!("{:.3}", summary.mean_score)),
        ("Std dev", format!("{:.3}", summary.score_std_dev)),
        ("Best score", summary.best_score.to_string()),
        ("Mean length", format!("{:.1} frames", summary.avg_episode_length)),
    ]);

    if let Some(path) = &args.export {
        let report = EvaluationReport {
            table: &args.table,
            result: &result,
            metrics: summary,
        };
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)?;
        println!("\n✓ Results exported to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn test_snapshot_detection() {
        assert!(is_snapshot(Path::new("runs/agent.msgpack")));
        assert!(!is_snapshot(Path::new("results/qvalues_4000.csv")));
        assert!(!is_snapshot(Path::new("results/qvalues")));
    }

    #[test]
    fn test_table_uses_configured_screen() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("big.toml");
        std::fs::write(&config_path, "[screen]\nwidth = 576.0\nheight = 1024.0\n").unwrap();
        let table_path = temp_dir.path().join("qvalues_0.csv");
        std::fs::write(&table_path, "7,3,15,0,0.5,\n").unwrap();

        let config = load_config(Some(&config_path)).unwrap();
        let agent = load_agent(&App::new(), &table_path, &config).unwrap();

        assert_eq!(*agent.discretizer(), config.screen.discretizer().unwrap());
        assert_ne!(*agent.discretizer(), FlappyConfig::default().screen.discretizer().unwrap());
    }
}
