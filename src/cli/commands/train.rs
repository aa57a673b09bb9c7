//! Train command - Train a Q-learning agent against the simulator

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::{
    adapters::{FlappySim, SimConfig},
    app::{App, FlappyConfig, Hyperparameters, RewardValues},
    cli::output::{format_number, print_kv, print_section, print_stats_table},
    pipeline::{
        JsonlObserver, MilestoneObserver, ProgressObserver, TrainingConfig, TrainingPipeline,
        TrainingResult,
    },
    ports::FlappyAgent,
    q_learning::{QLearningAgent, SavedQAgent, TrainingMetadata},
};

#[derive(Parser, Debug)]
#[command(about = "Train a Q-learning agent", allow_negative_numbers = true)]
pub struct TrainArgs {
    /// Number of training episodes (overrides the config file)
    #[arg(long, short = 'n')]
    pub episodes: Option<usize>,

    /// TOML configuration file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Learning rate α, in (0, 1]
    #[arg(long, conflicts_with = "resume")]
    pub alpha: Option<f64>,

    /// Discount factor γ, in [0, 1]
    #[arg(long, conflicts_with = "resume")]
    pub gamma: Option<f64>,

    /// Exploration rate ε, in [0, 1]
    #[arg(long, conflicts_with = "resume")]
    pub epsilon: Option<f64>,

    /// Directory receiving the q-value table
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Truncate episodes longer than this many frames
    #[arg(long)]
    pub max_frames: Option<usize>,

    /// Continue training from an agent snapshot. The snapshot's
    /// hyperparameters and rewards are kept.
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Optional path for writing a summary JSON file
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Optional file for JSONL episode summaries
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for a MessagePack agent snapshot
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Log a progress line every N episodes (0 disables)
    #[arg(long, default_value_t = 100)]
    pub milestone_interval: usize,

    /// Show progress bar
    #[arg(long, default_value_t = false)]
    pub progress: bool,
}

/// Settings the agent actually trained with, which differ from the config
/// file when resuming from a snapshot.
#[derive(Debug, Serialize)]
struct AgentSettings {
    hyperparameters: Hyperparameters,
    rewards: RewardValues,
}

#[derive(Debug, Serialize)]
struct TrainingSummaryFile<'a> {
    training: &'a TrainingResult,
    config: &'a FlappyConfig,
    agent: AgentSettings,
    table: &'a Path,
    episodes_total: u64,
    frames_total: u64,
}

fn sanitize_summary_path(raw: &Path) -> PathBuf {
    let mut normalized = raw.to_path_buf();
    let raw_str = raw.as_os_str().to_string_lossy();

    // Trailing separator or no file name: treat as a directory
    if raw_str.ends_with(std::path::MAIN_SEPARATOR) || normalized.file_name().is_none() {
        normalized.push("training_summary.json");
        return normalized;
    }

    match normalized.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => normalized,
        _ => {
            normalized.set_extension("json");
            normalized
        }
    }
}

/// Merge the config file (or defaults) with command-line overrides.
pub fn resolve_config(args: &TrainArgs) -> Result<FlappyConfig> {
    let mut config = match &args.config {
        Some(path) => FlappyConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => FlappyConfig::default(),
    };

    let hyper = config.hyperparameters;
    config.hyperparameters = Hyperparameters {
        learning_rate: args.alpha.unwrap_or(hyper.learning_rate),
        discount_factor: args.gamma.unwrap_or(hyper.discount_factor),
        epsilon: args.epsilon.unwrap_or(hyper.epsilon),
    };
    if let Some(episodes) = args.episodes {
        config.training.episodes = episodes;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }
    if let Some(dir) = &args.results_dir {
        config.training.results_dir = dir.clone();
    }
    if args.max_frames.is_some() {
        config.training.max_frames_per_episode = args.max_frames;
    }

    config.validate().context("Invalid training configuration")?;
    Ok(config)
}

fn build_agent(app: &App, config: &FlappyConfig, resume: Option<&Path>) -> Result<QLearningAgent> {
    match resume {
        Some(path) => {
            let saved = SavedQAgent::load_from_file(path)?;
            let agent = saved.to_agent()?;
            if *agent.discretizer() != config.screen.discretizer()? {
                bail!(
                    "snapshot {} was trained on a different screen than {}x{}; pass its --config",
                    path.display(),
                    config.screen.width,
                    config.screen.height
                );
            }
            println!(
                "Resuming from {} ({} keys, {} episodes)",
                path.display(),
                saved.table_size(),
                saved.counters.episodes()
            );
            Ok(agent)
        }
        None => Ok(app.create_agent(config.agent_config()?)),
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    let settings = &config.training;
    let app = App::new();
    let mut agent = build_agent(&app, &config, args.resume.as_deref())?;

    // Offset so the game and the exploration draws use distinct streams
    let env_seed = settings.seed.map(|seed| seed.wrapping_add(1));
    let mut env = FlappySim::new(
        SimConfig::for_screen(&config.screen),
        agent.reward_values(),
        env_seed,
    );

    print_section("Q-Learning Training");
    let hyper = agent.hyperparameters();
    print_stats_table(&[
        ("Episodes", format_number(settings.episodes)),
        ("Learning rate", hyper.learning_rate.to_string()),
        ("Discount factor", hyper.discount_factor.to_string()),
        ("Epsilon", hyper.epsilon.to_string()),
        (
            "Seed",
            settings
                .seed
                .map_or_else(|| "random".to_string(), |seed| seed.to_string()),
        ),
    ]);

    let mut pipeline = TrainingPipeline::new(TrainingConfig {
        num_episodes: settings.episodes,
        seed: settings.seed,
        max_frames_per_episode: settings.max_frames_per_episode,
    });
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if args.milestone_interval > 0 {
        pipeline = pipeline.with_observer(Box::new(MilestoneObserver::new(args.milestone_interval)));
    }
    if let Some(path) = &args.observations {
        let observer = JsonlObserver::new(path)
            .with_context(|| format!("Failed to create observations file {}", path.display()))?;
        pipeline = pipeline.with_observer(Box::new(observer));
    }

    let result = pipeline.train(&mut agent, &mut env)?;

    print_section("Training Results");
    print_stats_table(&[
        ("Episodes", format_number(result.episodes)),
        ("Truncated", format_number(result.truncated)),
        ("Frames", format_number(result.frames)),
        ("Mean score", format!("{:.3}", result.mean_score)),
        ("Best score", result.best_score.to_string()),
        ("Table size", format_number(agent.q_table().size())),
    ]);

    let table_path = app
        .save_table(&agent, &settings.results_dir)
        .with_context(|| format!("Failed to save q-values under {}", settings.results_dir.display()))?;
    println!("\n✓ Q-values saved to: {}", table_path.display());

    if let Some(raw) = &args.summary {
        let path = sanitize_summary_path(raw);
        let counters = agent.counters();
        let summary = TrainingSummaryFile {
            training: &result,
            config: &config,
            agent: AgentSettings {
                hyperparameters: agent.hyperparameters(),
                rewards: agent.reward_values(),
            },
            table: &table_path,
            episodes_total: counters.episodes(),
            frames_total: counters.frames(),
        };
        let file = File::create(&path)
            .with_context(|| format!("Failed to create summary file {}", path.display()))?;
        to_writer_pretty(BufWriter::new(file), &summary)?;
        print_kv("Summary", &path.display().to_string());
    }

    if let Some(path) = &args.snapshot {
        let metadata = TrainingMetadata {
            episodes_trained: Some(result.episodes),
            seed: settings.seed,
            best_score: Some(result.best_score),
        };
        SavedQAgent::from_agent(&agent, metadata).save_to_file(path)?;
        print_kv("Snapshot", &path.display().to_string());
    }

    Ok(())
}
