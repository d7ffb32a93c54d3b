use super::action::{Axis, Velocity};

/// A cell on the game grid. Coordinates are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by a velocity
    pub fn moved_by(&self, velocity: Velocity) -> Self {
        Self {
            x: self.x + velocity.dx,
            y: self.y + velocity.dy,
        }
    }

    /// Coordinate along the axis perpendicular to `axis`.
    ///
    /// Two segments share a row when moving horizontally, so the row (y) is
    /// what tells whether the snake currently travels along that axis.
    fn lane(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Horizontal => self.y,
            Axis::Vertical => self.x,
        }
    }
}

/// Fixed board dimensions; valid cells are `[1, width] x [1, height]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Check if a position is within the grid bounds
    pub fn contains(&self, pos: Position) -> bool {
        (1..=self.width).contains(&pos.x) && (1..=self.height).contains(&pos.y)
    }

    pub fn cell_count(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }
}

/// The snake in the game
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    /// Body segments, with head at index 0. Never empty.
    body: Vec<Position>,
}

impl Snake {
    /// Create a one-segment snake
    pub fn new(head: Position) -> Self {
        Self { body: vec![head] }
    }

    /// Build a snake from head-first segments, or `None` if there are none
    pub fn from_segments(body: Vec<Position>) -> Option<Self> {
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    /// Get the head position
    pub fn head(&self) -> Position {
        self.body[0]
    }

    /// The segment directly behind the head, if any
    pub fn neck(&self) -> Option<Position> {
        self.body.get(1).copied()
    }

    pub fn segments(&self) -> &[Position] {
        &self.body
    }

    /// Get body segments (excluding head)
    pub fn body_segments(&self) -> &[Position] {
        &self.body[1..]
    }

    /// Check if position collides with snake body (excluding head)
    pub fn collides_with_body(&self, pos: Position) -> bool {
        self.body_segments().contains(&pos)
    }

    /// Check if any segment, head included, sits on `pos`
    pub fn occupies(&self, pos: Position) -> bool {
        self.body.contains(&pos)
    }

    /// Whether the head and neck already share a lane on `axis`.
    ///
    /// A turn onto that axis would either repeat the current heading or
    /// reverse into the neck. A snake without a neck is never locked.
    pub fn travels_along(&self, axis: Axis) -> bool {
        self.neck()
            .is_some_and(|neck| neck.lane(axis) == self.head().lane(axis))
    }

    /// Append a segment at the tail end
    pub fn grow(&mut self, at: Position) {
        self.body.push(at);
    }

    /// Shift every segment into the slot of the one ahead of it, then move
    /// the head by `velocity`
    pub fn advance(&mut self, velocity: Velocity) {
        for index in (1..self.body.len()).rev() {
            self.body[index] = self.body[index - 1];
        }
        self.body[0] = self.body[0].moved_by(velocity);
    }

    /// Get the length of the snake
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Never true for a constructed snake
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// What ended a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collision {
    /// Head left the grid
    Wall,
    /// Head landed on its own body
    SelfCollision,
}

/// Complete state of one game
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub grid: Grid,
    pub snake: Snake,
    pub food: Position,
    pub velocity: Velocity,
    pub score: u32,
    pub game_over: bool,
}

impl GameState {
    /// Create a fresh, motionless game state
    pub fn new(grid: Grid, snake: Snake, food: Position) -> Self {
        Self {
            grid,
            snake,
            food,
            velocity: Velocity::STILL,
            score: 0,
            game_over: false,
        }
    }

    /// Check if a position is within the grid bounds
    pub fn is_in_bounds(&self, pos: Position) -> bool {
        self.grid.contains(pos)
    }

    pub fn snapshot(&self, high_score: u32) -> Snapshot {
        Snapshot {
            grid: self.grid,
            food: self.food,
            snake: self.snake.segments().to_vec(),
            score: self.score,
            high_score,
            game_over: self.game_over,
            store_warning: None,
        }
    }
}

/// Everything a renderer needs to draw one frame
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub grid: Grid,
    pub food: Position,
    /// Head-first segments
    pub snake: Vec<Position>,
    pub score: u32,
    pub high_score: u32,
    pub game_over: bool,
    /// Set while the high score store is failing
    pub store_warning: Option<String>,
}

impl Snapshot {
    pub fn head(&self) -> Option<Position> {
        self.snake.first().copied()
    }
}
