mod agent;
mod dqn;
mod draw;
mod error;
mod game;
mod play;
mod pos;
mod replay;
mod state;
mod trainer;

use agent::Agent;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dqn::QTrainer;
use game::{GameConfig, SnakeGame};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use trainer::ScoreLog;

/// Discount factor applied to estimated future reward.
const GAMMA: f32 = 0.9;

#[derive(Parser)]
#[command(name = "snake-dqn")]
#[command(version, about = "Grid snake with a DQN agent trained by experience replay")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train the agent, checkpointing whenever a new record score is reached
    Train {
        /// Where to save the model on a new record
        #[arg(long, default_value = "model.safetensors")]
        checkpoint: PathBuf,

        /// Optional JSON file receiving per-episode scores and running means
        #[arg(long)]
        scores: Option<PathBuf>,

        /// Stop after this many frames instead of running indefinitely
        #[arg(long)]
        frames: Option<u64>,

        /// Board width in pixels
        #[arg(long, default_value = "640")]
        width: i32,

        /// Board height in pixels
        #[arg(long, default_value = "480")]
        height: i32,
    },
    /// Play the game yourself with arrow keys / WASD
    Play {
        #[arg(long, default_value = "640")]
        width: i32,

        #[arg(long, default_value = "480")]
        height: i32,
    },
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = run(Cli::parse()) {
        tracing::error!("fatal: {err:?}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train {
            checkpoint,
            scores,
            frames,
            width,
            height,
        } => {
            let config = GameConfig {
                width,
                height,
                ..Default::default()
            };
            let mut game = SnakeGame::new(config).context("setting up the game")?;
            let learner = QTrainer::new(GAMMA).context("building the Q-network")?;
            let mut agent = Agent::new(learner);
            let mut telemetry = ScoreLog::new(scores);
            // never set from within the process: a supervisor is expected to
            // interrupt the run between frames
            let stop = AtomicBool::new(false);
            tracing::info!(checkpoint = %checkpoint.display(), "training started");
            trainer::run(
                &mut game,
                &mut agent,
                &mut telemetry,
                &checkpoint,
                &stop,
                frames,
            )
        }
        Command::Play { width, height } => {
            let config = GameConfig {
                width,
                height,
                ..Default::default()
            };
            play::run(config)
        }
    }
}
