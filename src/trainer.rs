use crate::agent::Agent;
use crate::dqn::Learner;
use crate::game::SnakeGame;
use crate::replay::Transition;
use crate::state;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Observer of episode summaries. Purely observational: implementations must
/// never alter training state.
pub trait Telemetry {
    fn record_episode(&mut self, episode: u32, score: u32, mean_score: f32);
}

#[derive(Serialize)]
struct EpisodeRow {
    episode: u32,
    score: u32,
    mean_score: f32,
}

/// Telemetry sink that logs each episode and mirrors the score history to a
/// JSON file. File write failures are reported and ignored; plotting must
/// not take a training run down.
pub struct ScoreLog {
    rows: Vec<EpisodeRow>,
    path: Option<PathBuf>,
}

impl ScoreLog {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            rows: Vec::new(),
            path,
        }
    }
}

impl Telemetry for ScoreLog {
    fn record_episode(&mut self, episode: u32, score: u32, mean_score: f32) {
        tracing::info!(episode, score, mean_score, "episode finished");
        self.rows.push(EpisodeRow {
            episode,
            score,
            mean_score,
        });
        if let Some(path) = &self.path {
            let write = File::create(path)
                .map_err(anyhow::Error::from)
                .and_then(|f| serde_json::to_writer(f, &self.rows).map_err(Into::into));
            if let Err(err) = write {
                tracing::warn!("failed to write score log {}: {err}", path.display());
            }
        }
    }
}

/// Run the training loop: encode, decide, step, learn, remember; at episode
/// boundaries reset, replay a batch, checkpoint on a new record and report.
/// The stop flag is checked at the top of every frame so a supervisor can
/// interrupt between frames without corrupting in-flight state. Learner
/// errors propagate unhandled and end the run.
pub fn run<L: Learner>(
    game: &mut SnakeGame,
    agent: &mut Agent<L>,
    telemetry: &mut dyn Telemetry,
    checkpoint: &Path,
    stop: &AtomicBool,
    max_frames: Option<u64>,
) -> Result<()> {
    let mut total_score: u64 = 0;
    let mut frames: u64 = 0;

    while !stop.load(Ordering::Relaxed) {
        if max_frames.is_some_and(|limit| frames >= limit) {
            break;
        }
        frames += 1;

        let state_old = state::encode(game);
        let action = agent.select_action(&state_old)?;
        let out = game.step(&action)?;
        let state_new = state::encode(game);

        let transition = Transition {
            state: state_old,
            action,
            reward: out.reward,
            next_state: state_new,
            done: out.done,
        };
        agent.train_short_memory(&transition)?;
        agent.remember(transition);

        if out.done {
            game.reset()?;
            agent.n_games += 1;
            agent.train_long_memory()?;

            if out.score > agent.record {
                agent.record = out.score;
                tracing::info!(record = agent.record, "new record, checkpointing");
                agent
                    .learner
                    .save(checkpoint)
                    .with_context(|| format!("saving checkpoint to {}", checkpoint.display()))?;
            }

            total_score += u64::from(out.score);
            let mean_score = total_score as f32 / agent.n_games as f32;
            telemetry.record_episode(agent.n_games, out.score, mean_score);
        }
    }
    Ok(())
}
