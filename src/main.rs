#![recursion_limit = "256"]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use ml_minesweeper::ai::{new_agent, ModelType, RandomAgent, TrainableAgent};
use ml_minesweeper::browser::ChromePage;
use ml_minesweeper::checkpoint::CheckpointManager;
use ml_minesweeper::config::AppConfig;
use ml_minesweeper::driver::GameDriver;
use ml_minesweeper::env::MinesweeperEnv;
use ml_minesweeper::logging;
use ml_minesweeper::training::episode::{evaluate, evaluate_trainable, EvalReport};
use ml_minesweeper::training::metrics::EpisodeTally;

/// Play greedy episodes with the latest trained model.
#[derive(Parser)]
#[command(name = "ml_minesweeper", about = "Play Minesweeper with a trained agent")]
struct Cli {
    /// Model to load: PPO or DQN. Without one a random agent plays.
    #[arg(long)]
    model_type: Option<String>,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Episodes to play
    #[arg(long, default_value_t = 10)]
    episodes: usize,

    /// Override the per-episode step limit
    #[arg(long)]
    max_steps: Option<usize>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if cli.headless {
        app_config.game.headless = true;
    }
    let max_steps = cli
        .max_steps
        .unwrap_or(app_config.training.max_episode_steps);

    logging::init(&app_config.logging, true).context("initializing logging")?;

    let model = match cli.model_type.as_deref().map(ModelType::parse) {
        Some(Some(model)) => Some(model),
        Some(None) => {
            tracing::error!(model_type = ?cli.model_type, "unsupported model type (expected PPO or DQN)");
            return Ok(());
        }
        None => None,
    };
    let trained = model.and_then(|model| load_trained(&app_config, model));

    let driver = GameDriver::<ChromePage>::launch(app_config.game.clone())
        .context("launching browser")?;
    let mut env = MinesweeperEnv::new(driver, app_config.env.clone(), Arc::new(EpisodeTally::new()))
        .context("starting game")?;

    let res = match trained {
        Some(mut agent) => {
            println!("Playing {} episodes with {}", cli.episodes, agent.name());
            evaluate_trainable(&mut env, agent.as_mut(), cli.episodes, max_steps)
        }
        None => {
            println!("Playing {} episodes with a random agent", cli.episodes);
            evaluate(&mut env, &mut RandomAgent::default(), cli.episodes, max_steps)
        }
    };

    if let Err(e) = env.close() {
        tracing::warn!(error = %e, "closing environment");
    }
    let report = res.context("playing episodes")?;
    print_report(&report);
    Ok(())
}

/// Latest checkpoint for `model`, or `None` when there is nothing loadable.
fn load_trained(config: &AppConfig, model: ModelType) -> Option<Box<dyn TrainableAgent>> {
    let checkpoints = CheckpointManager::new(&config.checkpoint, model);
    let (agent, outcome) = checkpoints.resume_or_fresh(|| {
        new_agent(
            model,
            &config.pg,
            &config.dqn,
            config.game.height,
            config.game.width,
            config.training.mask_illegal_actions,
        )
    });
    if outcome.is_resumed() {
        Some(agent)
    } else {
        tracing::warn!(?outcome, "no usable checkpoint, falling back to random play");
        None
    }
}

fn print_report(report: &EvalReport) {
    println!(
        "Episodes: {} | Wins: {} | Losses: {} | Unfinished: {}",
        report.episodes,
        report.wins,
        report.losses,
        report.unfinished()
    );
    println!(
        "Win rate: {:.1}% | Avg reward: {:.1} | Avg length: {:.1}",
        report.win_rate() * 100.0,
        report.average_reward,
        report.average_length
    );
}
