use crate::error::GameError;

/// A point on the board, in pixels. Valid positions are multiples of the
/// block size inside the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one block away in `dir`.
    pub fn advanced(self, dir: Dir, block: i32) -> Pos {
        let (dx, dy) = dir.offset();
        Pos::new(self.x + dx * block, self.y + dy * block)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    /// Explicit opposite lookup; direction changes to the opposite are
    /// rejected by the game, never applied.
    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }

    pub fn turned_left(self) -> Dir {
        match self {
            Dir::Up => Dir::Left,
            Dir::Left => Dir::Down,
            Dir::Down => Dir::Right,
            Dir::Right => Dir::Up,
        }
    }

    pub fn turned_right(self) -> Dir {
        match self {
            Dir::Up => Dir::Right,
            Dir::Right => Dir::Down,
            Dir::Down => Dir::Left,
            Dir::Left => Dir::Up,
        }
    }

    /// Unit offset in grid cells; y grows downward.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }
}

/// The agent's action space: a turn relative to the current movement
/// direction. The wire encoding is a one-hot `[f32; 3]` with index 0 =
/// turn left, 1 = go straight, 2 = turn right.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Turn {
    Left,
    Straight,
    Right,
}

impl Turn {
    pub fn from_index(idx: usize) -> Turn {
        match idx {
            0 => Turn::Left,
            1 => Turn::Straight,
            _ => Turn::Right,
        }
    }

    /// Decode a strict one-hot action vector. Anything other than exactly
    /// one 1.0 and two 0.0 entries is rejected.
    pub fn from_one_hot(action: &[f32; 3]) -> Result<Turn, GameError> {
        let mut hot = None;
        for (i, &v) in action.iter().enumerate() {
            if v == 1.0 {
                if hot.is_some() {
                    return Err(GameError::InvalidAction(*action));
                }
                hot = Some(i);
            } else if v != 0.0 {
                return Err(GameError::InvalidAction(*action));
            }
        }
        match hot {
            Some(i) => Ok(Turn::from_index(i)),
            None => Err(GameError::InvalidAction(*action)),
        }
    }

    pub fn to_one_hot(self) -> [f32; 3] {
        let mut v = [0.0; 3];
        v[self as usize] = 1.0;
        v
    }

    /// Resolve the turn against the current movement direction.
    pub fn apply(self, dir: Dir) -> Dir {
        match self {
            Turn::Left => dir.turned_left(),
            Turn::Straight => dir,
            Turn::Right => dir.turned_right(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposites_are_symmetric() {
        for dir in [Dir::Up, Dir::Right, Dir::Down, Dir::Left] {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
    }

    #[test]
    fn four_left_turns_come_back_around() {
        let mut d = Dir::Up;
        for _ in 0..4 {
            d = d.turned_left();
        }
        assert_eq!(d, Dir::Up);
        assert_eq!(Dir::Up.turned_left(), Dir::Up.turned_right().opposite());
    }

    #[test]
    fn one_hot_round_trip() {
        for turn in [Turn::Left, Turn::Straight, Turn::Right] {
            assert_eq!(Turn::from_one_hot(&turn.to_one_hot()).unwrap(), turn);
        }
    }

    #[test]
    fn malformed_one_hot_is_rejected() {
        for bad in [
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.5, 0.5, 0.0],
            [0.0, 2.0, 0.0],
        ] {
            assert!(Turn::from_one_hot(&bad).is_err());
        }
    }

    #[test]
    fn relative_turns_resolve_against_heading() {
        assert_eq!(Turn::Left.apply(Dir::Up), Dir::Left);
        assert_eq!(Turn::Right.apply(Dir::Up), Dir::Right);
        assert_eq!(Turn::Straight.apply(Dir::Down), Dir::Down);
    }

    #[test]
    fn advanced_moves_one_block() {
        let p = Pos::new(100, 100);
        assert_eq!(p.advanced(Dir::Right, 20), Pos::new(120, 100));
        assert_eq!(p.advanced(Dir::Up, 20), Pos::new(100, 80));
    }
}
