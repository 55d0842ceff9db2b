#![recursion_limit = "256"]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use ml_minesweeper::ai::{new_agent, ModelType, TrainableAgent};
use ml_minesweeper::browser::ChromePage;
use ml_minesweeper::checkpoint::CheckpointManager;
use ml_minesweeper::config::AppConfig;
use ml_minesweeper::driver::GameDriver;
use ml_minesweeper::env::MinesweeperEnv;
use ml_minesweeper::logging;
use ml_minesweeper::training::metrics::EpisodeTally;
use ml_minesweeper::training::status_feed::status_channel;
use ml_minesweeper::training::trainer::Trainer;
use ml_minesweeper::ui::OverlayHandle;

/// Train a Minesweeper agent against a browser-rendered game.
#[derive(Parser)]
#[command(name = "train", about = "Train a Minesweeper RL agent in the browser")]
struct Cli {
    /// Algorithm to train: PPO or DQN
    #[arg(long, default_value = "PPO")]
    model_type: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Override timesteps per learning cycle
    #[arg(long)]
    total_timesteps: Option<u64>,

    /// Run the browser without a window
    #[arg(long)]
    headless: bool,

    /// Disable the terminal status overlay
    #[arg(long)]
    no_overlay: bool,

    /// Learning cycles to run; 0 repeats forever
    #[arg(long, default_value_t = 0)]
    cycles: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut app_config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(timesteps) = cli.total_timesteps {
        app_config.training.total_timesteps = timesteps;
    }
    if cli.headless {
        app_config.game.headless = true;
    }
    if cli.no_overlay {
        app_config.overlay.enabled = false;
    }
    app_config.validate().context("validating config")?;

    let model = ModelType::parse(&cli.model_type);
    logging::init(
        &app_config.logging,
        logging::wants_stderr(app_config.overlay.enabled, model.is_none()),
    )
    .context("initializing logging")?;
    if !cli.config.exists() {
        tracing::warn!(path = %cli.config.display(), "config file not found, using defaults");
    }

    let Some(model) = model else {
        tracing::error!(model_type = %cli.model_type, "unsupported model type (expected PPO or DQN)");
        return Ok(());
    };

    let checkpoints = CheckpointManager::new(&app_config.checkpoint, model);
    let (agent, _) = checkpoints.resume_or_fresh(|| {
        new_agent(
            model,
            &app_config.pg,
            &app_config.dqn,
            app_config.game.height,
            app_config.game.width,
            app_config.training.mask_illegal_actions,
        )
    });

    let tally = Arc::new(EpisodeTally::new());
    let driver = GameDriver::<ChromePage>::launch(app_config.game.clone())
        .context("launching browser")?;
    let mut env = MinesweeperEnv::new(driver, app_config.env.clone(), tally)
        .context("starting game")?;
    if app_config.overlay.enabled {
        let (tx, rx) = status_channel(app_config.overlay.queue_capacity);
        let overlay = OverlayHandle::spawn(rx, Duration::from_millis(app_config.overlay.refresh_ms));
        env = env.with_status_feed(tx).with_overlay(overlay);
    }

    let mut trainer = Trainer::new(app_config.training.clone(), checkpoints);
    let res = run_cycles(&mut trainer, &mut env, agent, cli.cycles);

    if let Err(e) = env.close() {
        tracing::warn!(error = %e, "closing environment");
    }
    res
}

fn run_cycles(
    trainer: &mut Trainer,
    env: &mut MinesweeperEnv<ChromePage>,
    mut agent: Box<dyn TrainableAgent>,
    cycles: u64,
) -> Result<()> {
    let mut cycle = 0u64;
    while cycles == 0 || cycle < cycles {
        cycle += 1;
        let summary = trainer
            .learn(env, agent.as_mut())
            .with_context(|| format!("learning cycle {cycle}"))?;
        tracing::info!(
            cycle,
            timesteps = summary.timesteps,
            episodes = summary.episodes,
            "cycle finished"
        );
        match trainer.save_final(agent.as_ref(), env.tally()) {
            Ok(path) => tracing::info!(path = %path.display(), "final snapshot saved"),
            Err(e) => tracing::error!(error = %e, "saving final snapshot"),
        }
    }
    Ok(())
}
