/// Direction the snake can be steered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Movement dimension of a direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Direction {
    pub fn axis(&self) -> Axis {
        match self {
            Direction::Up | Direction::Down => Axis::Vertical,
            Direction::Left | Direction::Right => Axis::Horizontal,
        }
    }

    /// Unit velocity for this direction. Y grows downwards.
    pub fn velocity(&self) -> Velocity {
        match self {
            Direction::Up => Velocity::new(0, -1),
            Direction::Down => Velocity::new(0, 1),
            Direction::Left => Velocity::new(-1, 0),
            Direction::Right => Velocity::new(1, 0),
        }
    }
}

/// Per-tick displacement of the head
///
/// Zero only before the first direction is chosen; afterwards exactly one
/// component is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Velocity {
    pub dx: i32,
    pub dy: i32,
}

impl Velocity {
    pub const STILL: Velocity = Velocity { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_still(&self) -> bool {
        *self == Self::STILL
    }
}

impl From<Direction> for Velocity {
    fn from(direction: Direction) -> Self {
        direction.velocity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_velocity() {
        assert_eq!(Direction::Up.velocity(), Velocity::new(0, -1));
        assert_eq!(Direction::Down.velocity(), Velocity::new(0, 1));
        assert_eq!(Direction::Left.velocity(), Velocity::new(-1, 0));
        assert_eq!(Velocity::from(Direction::Right), Velocity::new(1, 0));
    }

    #[test]
    fn test_axis() {
        assert_eq!(Direction::Up.axis(), Axis::Vertical);
        assert_eq!(Direction::Down.axis(), Axis::Vertical);
        assert_eq!(Direction::Left.axis(), Axis::Horizontal);
        assert_eq!(Direction::Right.axis(), Axis::Horizontal);
    }

    #[test]
    fn test_still_velocity() {
        assert!(Velocity::default().is_still());
        assert!(!Direction::Left.velocity().is_still());
    }
}
