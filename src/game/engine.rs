use super::{
    action::Direction,
    config::GameConfig,
    random::RandomSource,
    state::{Collision, GameState, Grid, Position, Snake, Snapshot},
};
use crate::persistence::HighScoreStore;
use rand::rngs::ThreadRng;
use tracing::{debug, info, warn};

/// Result of a game step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The snake moved (or is still waiting for a first direction)
    Advanced {
        snapshot: Snapshot,
        /// Whether the snake ate food this step
        ate_food: bool,
    },
    /// This step ended the game
    GameOver { collision: Collision, score: u32 },
    /// The game was already over; nothing changed
    Halted,
}

impl StepOutcome {
    /// Whether the periodic driver should stop
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StepOutcome::Advanced { .. })
    }
}

/// The game engine that handles all game logic
///
/// Owns one game's state at a time. A host drives it by calling [`step`]
/// on a fixed cadence and [`set_direction`] on input, and restarts it with
/// [`reset`] once [`is_game_over`] reports true.
///
/// [`step`]: GameEngine::step
/// [`set_direction`]: GameEngine::set_direction
/// [`reset`]: GameEngine::reset
/// [`is_game_over`]: GameEngine::is_game_over
pub struct GameEngine<R = ThreadRng> {
    config: GameConfig,
    state: GameState,
    store: Box<dyn HighScoreStore>,
    /// Best score seen by this engine, kept even when the store fails
    high_score: u32,
    /// Last store failure, cleared by the next successful store call
    store_warning: Option<String>,
    rng: R,
}

impl GameEngine<ThreadRng> {
    /// Create a new game engine with the given configuration
    pub fn new(config: GameConfig, store: Box<dyn HighScoreStore>) -> Self {
        Self::with_rng(config, store, rand::thread_rng())
    }
}

impl<R: RandomSource> GameEngine<R> {
    /// Create an engine drawing positions from `rng`, with a freshly reset game
    pub fn with_rng(config: GameConfig, store: Box<dyn HighScoreStore>, mut rng: R) -> Self {
        let state = new_game(&config, &mut rng);
        let mut engine = Self {
            config,
            state,
            store,
            high_score: 0,
            store_warning: None,
            rng,
        };
        engine.high_score = engine.read_high_score();
        engine
    }

    /// Resume a prepared game state
    pub fn with_state(
        config: GameConfig,
        state: GameState,
        store: Box<dyn HighScoreStore>,
        rng: R,
    ) -> Self {
        let mut engine = Self {
            config,
            state,
            store,
            high_score: 0,
            store_warning: None,
            rng,
        };
        engine.high_score = engine.read_high_score();
        engine
    }

    /// Start a new game, discarding the current one
    pub fn reset(&mut self) -> Snapshot {
        self.state = new_game(&self.config, &mut self.rng);
        self.high_score = self.read_high_score();

        info!(
            head = ?self.state.snake.head(),
            food = ?self.state.food,
            high_score = self.high_score,
            "New game"
        );

        self.snapshot()
    }

    /// Steer the snake; returns false when the turn is refused.
    ///
    /// A turn onto the axis the head and neck already share is refused, which
    /// rules out reversing into the neck. Refusals leave the velocity as is.
    pub fn set_direction(&mut self, direction: Direction) -> bool {
        if self.state.snake.travels_along(direction.axis()) {
            debug!(?direction, "Ignoring turn along current axis");
            return false;
        }

        self.state.velocity = direction.velocity();
        true
    }

    /// Execute one step of the game
    ///
    /// While the velocity is still `(0,0)` the step is idle: the snake neither
    /// moves nor eats, even with food under its head. That food is eaten on
    /// the first step after a direction is chosen.
    pub fn step(&mut self) -> StepOutcome {
        if self.state.game_over {
            return StepOutcome::Halted;
        }

        // Nothing moves or eats until a direction has been chosen
        if self.state.velocity.is_still() {
            return StepOutcome::Advanced {
                snapshot: self.snapshot(),
                ate_food: false,
            };
        }

        let ate_food = self.state.snake.head() == self.state.food;

        if ate_food {
            let food = self.state.food;
            self.state.snake.grow(food);
            self.state.score += 1;
            self.record_score();
        }

        self.state.snake.advance(self.state.velocity);

        if ate_food {
            self.state.food = spawn_food(
                &mut self.rng,
                self.state.grid,
                self.config.food_avoids_snake,
                &self.state.snake,
            );
            debug!(score = self.state.score, food = ?self.state.food, "Food eaten");
        }

        if let Some(collision) = self.check_collision() {
            self.state.game_over = true;
            info!(?collision, score = self.state.score, "Game over");

            return StepOutcome::GameOver {
                collision,
                score: self.state.score,
            };
        }

        StepOutcome::Advanced {
            snapshot: self.snapshot(),
            ate_food,
        }
    }

    /// Renderable view of the current game
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            store_warning: self.store_warning.clone(),
            ..self.state.snapshot(self.high_score)
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.state.game_over
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Why the high score could not be read or saved, while that persists
    pub fn store_warning(&self) -> Option<&str> {
        self.store_warning.as_deref()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Check if the current head position is a collision
    fn check_collision(&self) -> Option<Collision> {
        let head = self.state.snake.head();

        // Check wall collision
        if !self.state.is_in_bounds(head) {
            return Some(Collision::Wall);
        }

        // Check self-collision
        if self.state.snake.collides_with_body(head) {
            return Some(Collision::SelfCollision);
        }

        None
    }

    /// Stored high score, falling back to the in-memory one on failure
    fn read_high_score(&mut self) -> u32 {
        self.load_stored().max(self.high_score)
    }

    fn load_stored(&mut self) -> u32 {
        match self.store.high_score() {
            Ok(stored) => {
                self.store_warning = None;
                stored
            }
            Err(err) => {
                warn!(error = %err, "Could not read high score, keeping in-memory value");
                self.store_warning = Some(format!("high score not loaded: {err}"));
                self.high_score
            }
        }
    }

    fn record_score(&mut self) {
        let score = self.state.score;
        let stored = self.load_stored();

        if score > stored {
            match self.store.set_high_score(score) {
                Ok(()) => self.store_warning = None,
                Err(err) => {
                    warn!(error = %err, score, "Could not persist high score");
                    self.store_warning = Some(format!("high score not saved: {err}"));
                }
            }
        }

        self.high_score = self.high_score.max(stored).max(score);
    }
}

/// Fresh game: a one-segment snake and food, each on an independent random cell
fn new_game<R: RandomSource>(config: &GameConfig, rng: &mut R) -> GameState {
    let grid = config.grid();
    let snake = Snake::new(random_cell(rng, grid));
    let food = spawn_food(rng, grid, config.food_avoids_snake, &snake);

    GameState::new(grid, snake, food)
}

fn random_cell<R: RandomSource>(rng: &mut R, grid: Grid) -> Position {
    let x = rng.uniform_int(1, grid.width);
    let y = rng.uniform_int(1, grid.height);
    Position::new(x, y)
}

/// Spawn food anywhere, or on a cell free of the snake when `avoid_snake`
/// is set and such a cell exists
fn spawn_food<R: RandomSource>(
    rng: &mut R,
    grid: Grid,
    avoid_snake: bool,
    snake: &Snake,
) -> Position {
    if !avoid_snake || snake.len() >= grid.cell_count() {
        return random_cell(rng, grid);
    }

    loop {
        let pos = random_cell(rng, grid);

        if !snake.occupies(pos) {
            return pos;
        }
    }
}
