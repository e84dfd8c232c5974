use crate::game::SnakeGame;
use crate::pos::{Dir, Pos};

/// Paint one RGBA frame of the board: checkered backdrop, red food, green
/// snake with a brighter head. The buffer is `width * height * 4` bytes.
pub fn draw_frame(frame: &mut [u8], game: &SnakeGame) {
    let width = game.config.width as u32;
    let block = game.config.block as u32;

    clear_rgba(frame, 20, 20, 30);
    for y in 0..(game.config.height / game.config.block) as u32 {
        for x in 0..(game.config.width / game.config.block) as u32 {
            if (x + y) % 2 == 0 {
                fill_cell(frame, width, block, x, y, 25, 25, 35);
            }
        }
    }

    fill_pos(frame, game, game.food, 220, 50, 50);

    for (i, &pos) in game.snake.iter().enumerate() {
        if i == 0 {
            fill_pos(frame, game, pos, 100, 255, 100);
            draw_eyes(frame, game, pos);
        } else {
            let brightness = 200 - (i * 10).min(100) as u8;
            fill_pos(frame, game, pos, 50, brightness, 50);
        }
    }
}

fn clear_rgba(frame: &mut [u8], r: u8, g: u8, b: u8) {
    for px in frame.chunks_exact_mut(4) {
        px[0] = r;
        px[1] = g;
        px[2] = b;
        px[3] = 255;
    }
}

fn set_pixel(frame: &mut [u8], width: u32, x: u32, y: u32, r: u8, g: u8, b: u8) {
    let idx = ((y * width + x) * 4) as usize;
    if idx + 3 < frame.len() {
        frame[idx] = r;
        frame[idx + 1] = g;
        frame[idx + 2] = b;
        frame[idx + 3] = 255;
    }
}

fn fill_cell(frame: &mut [u8], width: u32, block: u32, cell_x: u32, cell_y: u32, r: u8, g: u8, b: u8) {
    let x0 = cell_x * block;
    let y0 = cell_y * block;
    for py in y0..y0 + block {
        for px in x0..x0 + block {
            set_pixel(frame, width, px, py, r, g, b);
        }
    }
}

fn fill_pos(frame: &mut [u8], game: &SnakeGame, pos: Pos, r: u8, g: u8, b: u8) {
    let block = game.config.block;
    // after a crash the head can sit outside the board
    if pos.x < 0 || pos.y < 0 || pos.x >= game.config.width || pos.y >= game.config.height {
        return;
    }
    fill_cell(
        frame,
        game.config.width as u32,
        block as u32,
        (pos.x / block) as u32,
        (pos.y / block) as u32,
        r,
        g,
        b,
    );
}

fn draw_eyes(frame: &mut [u8], game: &SnakeGame, head: Pos) {
    // same guard as fill_pos: a crashed head can sit one cell off any edge,
    // and a head at x == width would wrap the eyes into the next row
    if head.x < 0 || head.y < 0 || head.x >= game.config.width || head.y >= game.config.height {
        return;
    }
    let width = game.config.width as u32;
    let bx = head.x as u32;
    let by = head.y as u32;
    let (e1x, e1y, e2x, e2y) = match game.dir {
        Dir::Right => (bx + 12, by + 5, bx + 12, by + 12),
        Dir::Left => (bx + 5, by + 5, bx + 5, by + 12),
        Dir::Up => (bx + 5, by + 5, bx + 12, by + 5),
        Dir::Down => (bx + 5, by + 12, bx + 12, by + 12),
    };
    set_pixel(frame, width, e1x, e1y, 0, 0, 0);
    set_pixel(frame, width, e2x, e2y, 0, 0, 0);
}
