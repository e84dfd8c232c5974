use crate::draw;
use crate::game::{GameConfig, Phase, SnakeGame};
use crate::pos::Dir;
use anyhow::{Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit_input_helper::WinitInputHelper;

const TICK: Duration = Duration::from_millis(120);

/// Latest direction request since the previous movement frame. Key presses
/// land here instead of on the game, so at most one direction change is
/// applied per tick; without this, two 90-degree presses between ticks
/// compose into a full reversal onto the snake's own neck.
#[derive(Default)]
struct InputBuffer {
    pending: Option<Dir>,
}

impl InputBuffer {
    fn request(&mut self, dir: Dir) {
        self.pending = Some(dir);
    }

    /// Apply the buffered request, if any, immediately before a frame.
    fn apply(&mut self, game: &mut SnakeGame) {
        if let Some(dir) = self.pending.take() {
            game.set_direction(dir);
        }
    }
}

/// The human-playable variant: arrow keys or WASD steer, R restarts after a
/// crash, Escape quits. The training core never touches any of this; the
/// window, surface and game here are all owned by this function.
pub fn run(config: GameConfig) -> Result<()> {
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();

    let window = WindowBuilder::new()
        .with_title("snake")
        .with_inner_size(LogicalSize::new(config.width as u32, config.height as u32))
        .with_resizable(false)
        .build(&event_loop)
        .map_err(|e| anyhow!("creating window: {e}"))?;

    let mut pixels = {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(config.width as u32, config.height as u32, surface)?
    };

    let mut game = SnakeGame::new(config)?;
    let mut buffer = InputBuffer::default();
    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            draw::draw_frame(pixels.frame_mut(), &game);
            if pixels.render().is_err() {
                *control_flow = ControlFlow::Exit;
            }
        }

        if input.update(&event) {
            if input.key_pressed(VirtualKeyCode::Escape)
                || input.close_requested()
                || input.destroyed()
            {
                *control_flow = ControlFlow::Exit;
                return;
            }

            if input.key_pressed(VirtualKeyCode::Up) || input.key_pressed(VirtualKeyCode::W) {
                buffer.request(Dir::Up);
            }
            if input.key_pressed(VirtualKeyCode::Down) || input.key_pressed(VirtualKeyCode::S) {
                buffer.request(Dir::Down);
            }
            if input.key_pressed(VirtualKeyCode::Left) || input.key_pressed(VirtualKeyCode::A) {
                buffer.request(Dir::Left);
            }
            if input.key_pressed(VirtualKeyCode::Right) || input.key_pressed(VirtualKeyCode::D) {
                buffer.request(Dir::Right);
            }

            if game.phase == Phase::Terminated {
                window.set_title(&format!("snake - game over, score {} (R restarts)", game.score));
                if input.key_pressed(VirtualKeyCode::R) && game.reset().is_err() {
                    *control_flow = ControlFlow::Exit;
                    return;
                }
            } else if last_tick.elapsed() >= TICK {
                last_tick = Instant::now();
                buffer.apply(&mut game);
                match game.advance() {
                    Ok(out) => {
                        if !out.done {
                            window.set_title(&format!("snake - score {}", out.score));
                        }
                    }
                    Err(err) => {
                        tracing::error!("game stopped: {err}");
                        *control_flow = ControlFlow::Exit;
                        return;
                    }
                }
            }

            window.request_redraw();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pos::Pos;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn test_game() -> SnakeGame {
        let mut game =
            SnakeGame::with_rng(GameConfig::default(), SmallRng::seed_from_u64(6)).unwrap();
        game.food = Pos::new(0, 0); // out of the way
        game
    }

    #[test]
    fn buffered_request_is_applied_once_per_frame() {
        let mut game = test_game();
        let mut buffer = InputBuffer::default();
        buffer.request(Dir::Up);
        buffer.apply(&mut game);
        assert_eq!(game.dir, Dir::Up);
        // nothing pending any more: a second apply changes nothing
        game.dir = Dir::Right;
        buffer.apply(&mut game);
        assert_eq!(game.dir, Dir::Right);
    }

    #[test]
    fn two_quick_turns_in_one_tick_cannot_reverse_into_the_neck() {
        // heading Right, Up then Left arrive between ticks; only the latest
        // request survives and Left is rejected as the exact opposite
        let mut game = test_game();
        assert_eq!(game.dir, Dir::Right);
        let mut buffer = InputBuffer::default();
        buffer.request(Dir::Up);
        buffer.request(Dir::Left);
        buffer.apply(&mut game);
        assert_eq!(game.dir, Dir::Right);
        let out = game.advance().unwrap();
        assert!(!out.done);
        assert_eq!(game.snake.len(), 3);
    }
}
