use crate::error::GameError;
use crate::pos::{Dir, Pos, Turn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Board geometry and reward constants. The block size is carried here and
/// shared with the state encoder through the game, never through a global.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GameConfig {
    /// Board width in pixels, a multiple of `block`.
    pub width: i32,
    /// Board height in pixels, a multiple of `block`.
    pub height: i32,
    /// Cell edge length in pixels.
    pub block: i32,
    pub food_reward: f32,
    pub death_penalty: f32,
    pub step_reward: f32,
    /// Bound on food placement attempts before the board is declared full.
    pub max_food_attempts: u32,
    /// An episode ends once more than `starvation_factor * body length`
    /// frames pass without eating.
    pub starvation_factor: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            block: 20,
            food_reward: 10.0,
            death_penalty: -10.0,
            step_reward: 0.0,
            max_food_attempts: 10_000,
            starvation_factor: 100,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Running,
    Terminated,
}

/// What one frame of simulation produced.
#[derive(Clone, Copy, Debug)]
pub struct StepOutcome {
    pub reward: f32,
    pub done: bool,
    pub score: u32,
}

/// The authoritative grid simulation. Index 0 of `snake` is the head.
pub struct SnakeGame {
    pub config: GameConfig,
    pub snake: VecDeque<Pos>,
    pub dir: Dir,
    pub food: Pos,
    pub score: u32,
    pub phase: Phase,
    frames_since_food: u32,
    rng: SmallRng,
}

impl SnakeGame {
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Construct with a caller-supplied RNG, for reproducible runs.
    pub fn with_rng(config: GameConfig, rng: SmallRng) -> Result<Self, GameError> {
        let mut game = Self {
            config,
            snake: VecDeque::new(),
            dir: Dir::Right,
            food: Pos::new(0, 0),
            score: 0,
            phase: Phase::Running,
            frames_since_food: 0,
            rng,
        };
        game.reset()?;
        Ok(game)
    }

    /// Recreate body, food and score; grid dimensions persist.
    pub fn reset(&mut self) -> Result<(), GameError> {
        let block = self.config.block;
        let head = Pos::new(
            self.config.width / block / 2 * block,
            self.config.height / block / 2 * block,
        );
        self.snake.clear();
        self.snake.push_back(head);
        self.snake.push_back(Pos::new(head.x - block, head.y));
        self.snake.push_back(Pos::new(head.x - 2 * block, head.y));
        self.dir = Dir::Right;
        self.score = 0;
        self.phase = Phase::Running;
        self.frames_since_food = 0;
        self.place_food()
    }

    pub fn head(&self) -> Pos {
        *self.snake.front().expect("snake body is never empty")
    }

    /// True if `p` lies outside the board or on a non-head body cell.
    /// Pure query; also used by the state encoder for look-ahead sensing.
    pub fn is_collision(&self, p: Pos) -> bool {
        if p.x < 0
            || p.x > self.config.width - self.config.block
            || p.y < 0
            || p.y > self.config.height - self.config.block
        {
            return true;
        }
        self.snake.iter().skip(1).any(|&s| s == p)
    }

    /// Advance one frame under a one-hot relative-turn action.
    pub fn step(&mut self, action: &[f32; 3]) -> Result<StepOutcome, GameError> {
        if self.phase == Phase::Terminated {
            return Err(GameError::NotReset);
        }
        let turn = Turn::from_one_hot(action)?;
        self.dir = turn.apply(self.dir);
        self.advance()
    }

    /// One frame of movement along the current direction. The human-playable
    /// variant drives this directly after `set_direction`.
    pub fn advance(&mut self) -> Result<StepOutcome, GameError> {
        if self.phase == Phase::Terminated {
            return Err(GameError::NotReset);
        }
        self.frames_since_food += 1;

        let new_head = self.head().advanced(self.dir, self.config.block);
        self.snake.push_front(new_head);

        let starved =
            self.frames_since_food > self.config.starvation_factor * self.snake.len() as u32;
        if self.is_collision(new_head) || starved {
            self.phase = Phase::Terminated;
            return Ok(StepOutcome {
                reward: self.config.death_penalty,
                done: true,
                score: self.score,
            });
        }

        if new_head == self.food {
            self.score += 1;
            self.frames_since_food = 0;
            self.place_food()?;
            // tail kept: the body grows by one
            Ok(StepOutcome {
                reward: self.config.food_reward,
                done: false,
                score: self.score,
            })
        } else {
            self.snake.pop_back();
            Ok(StepOutcome {
                reward: self.config.step_reward,
                done: false,
                score: self.score,
            })
        }
    }

    /// Request an absolute direction (human input). The exact opposite of the
    /// current direction is silently ignored.
    pub fn set_direction(&mut self, new_dir: Dir) {
        if new_dir != self.dir.opposite() {
            self.dir = new_dir;
        }
    }

    fn place_food(&mut self) -> Result<(), GameError> {
        let block = self.config.block;
        let cells_x = self.config.width / block;
        let cells_y = self.config.height / block;
        for _ in 0..self.config.max_food_attempts {
            let p = Pos::new(
                self.rng.gen_range(0..cells_x) * block,
                self.rng.gen_range(0..cells_y) * block,
            );
            if !self.snake.contains(&p) {
                self.food = p;
                return Ok(());
            }
        }
        Err(GameError::FoodPlacementExhausted {
            attempts: self.config.max_food_attempts,
        })
    }
}
