use crate::game::SnakeGame;

pub const STATE_DIM: usize = 8;

/// Fixed-length feature vector fed to the Q-network.
pub type StateVec = [f32; STATE_DIM];

/// Encode a game snapshot into the 8 features the agent observes:
/// danger {straight, right, left} one block ahead, the current absolute
/// direction as a one-hot in the order LEFT, RIGHT, UP, DOWN, and the signed
/// bearing from head to food. Pure; never mutates the game.
pub fn encode(game: &SnakeGame) -> StateVec {
    use crate::pos::Dir;

    let head = game.head();
    let block = game.config.block;
    let dir = game.dir;

    let danger_straight = game.is_collision(head.advanced(dir, block));
    let danger_right = game.is_collision(head.advanced(dir.turned_right(), block));
    let danger_left = game.is_collision(head.advanced(dir.turned_left(), block));

    let bearing = ((game.food.y - head.y) as f32).atan2((game.food.x - head.x) as f32);

    [
        danger_straight as u8 as f32,
        danger_right as u8 as f32,
        danger_left as u8 as f32,
        (dir == Dir::Left) as u8 as f32,
        (dir == Dir::Right) as u8 as f32,
        (dir == Dir::Up) as u8 as f32,
        (dir == Dir::Down) as u8 as f32,
        bearing,
    ]
}
