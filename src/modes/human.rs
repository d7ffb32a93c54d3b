use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{Stderr, stderr};
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::game::{GameConfig, GameEngine, Snapshot, StepOutcome};
use crate::input::{InputHandler, KeyAction};
use crate::persistence::{HighScoreStore, JsonFileStore, MemoryStore};
use crate::render::Renderer;

/// Interactive keyboard play in the terminal
pub struct HumanMode {
    engine: GameEngine,
    /// Last frame handed to the renderer
    snapshot: Snapshot,
    renderer: Renderer,
    input_handler: InputHandler,
    /// Whether the tick driver is live; false once the game is over
    running: bool,
    /// Set when a new game starts so the driver restarts its period
    restarted: bool,
    should_quit: bool,
}

impl HumanMode {
    pub fn new(config: GameConfig) -> Self {
        let store = open_store(&config);
        let engine = GameEngine::new(config, store);
        let snapshot = engine.snapshot();

        Self {
            engine,
            snapshot,
            renderer: Renderer::new(),
            input_handler: InputHandler::new(),
            running: true,
            restarted: false,
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode().context("Failed to enable raw mode")?;
        let mut stderr = stderr();
        execute!(stderr, EnterAlternateScreen).context("Failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stderr);
        let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
        terminal.hide_cursor().context("Failed to hide cursor")?;
        terminal.clear().context("Failed to clear terminal")?;

        // Run game loop with cleanup
        let result = self.run_game_loop(&mut terminal).await;

        // Cleanup terminal
        self.cleanup_terminal(&mut terminal)?;

        result
    }

    async fn run_game_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        let mut event_stream = EventStream::new();

        let mut tick_timer = interval(self.engine.config().tick_interval());
        tick_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Render at 30 FPS (33ms per frame)
        let render_interval = Duration::from_millis(33);
        let mut render_timer = interval(render_interval);

        info!(
            width = self.snapshot.grid.width,
            height = self.snapshot.grid.height,
            tick = ?self.engine.config().tick_interval(),
            "Starting game loop"
        );

        loop {
            tokio::select! {
                // Handle terminal events
                maybe_event = event_stream.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_event(event);
                    }
                }

                // Game logic tick, only polled while the game runs
                _ = tick_timer.tick(), if self.running => {
                    self.update_game();
                }

                // Render frame
                _ = render_timer.tick() => {
                    terminal.draw(|frame| {
                        self.renderer.render(frame, &self.snapshot);
                    }).context("Failed to draw frame")?;
                }

                // Handle Ctrl+C
                _ = tokio::signal::ctrl_c() => {
                    self.should_quit = true;
                }
            }

            if std::mem::take(&mut self.restarted) {
                tick_timer.reset();
            }

            if self.should_quit {
                break;
            }
        }

        info!(high_score = self.engine.high_score(), "Leaving game loop");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            // Only process key press events, not release
            if key.kind != KeyEventKind::Press {
                return;
            }

            match self.input_handler.handle_key_event(key) {
                KeyAction::Turn(direction) => {
                    self.engine.set_direction(direction);
                }
                KeyAction::Restart => {
                    if self.engine.is_game_over() {
                        self.reset_game();
                    }
                }
                KeyAction::Quit => {
                    self.should_quit = true;
                }
                KeyAction::None => {}
            }
        }
    }

    fn update_game(&mut self) {
        match self.engine.step() {
            StepOutcome::Advanced { snapshot, .. } => {
                self.snapshot = snapshot;
            }
            StepOutcome::GameOver { collision, score } => {
                debug!(?collision, score, "Stopping tick driver");
                self.running = false;
                self.snapshot.score = score;
                self.snapshot.high_score = self.engine.high_score();
                self.snapshot.store_warning = self.engine.store_warning().map(str::to_owned);
                self.snapshot.game_over = true;
            }
            StepOutcome::Halted => {
                self.running = false;
            }
        }
    }

    fn reset_game(&mut self) {
        self.snapshot = self.engine.reset();
        self.running = true;
        self.restarted = true;
    }

    fn cleanup_terminal(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stderr>>,
    ) -> Result<()> {
        disable_raw_mode().context("Failed to disable raw mode")?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen")?;
        terminal.show_cursor().context("Failed to show cursor")?;
        Ok(())
    }
}

fn open_store(config: &GameConfig) -> Box<dyn HighScoreStore> {
    match &config.high_score_path {
        Some(path) => Box::new(JsonFileStore::new(path)),
        None => Box::new(MemoryStore::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Direction;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn play_until_over(mode: &mut HumanMode) {
        mode.handle_event(key(KeyCode::Left));
        for _ in 0..100 {
            if !mode.running {
                break;
            }
            mode.update_game();
        }
    }

    #[test]
    fn test_game_initialization() {
        let mode = HumanMode::new(GameConfig::default());
        assert!(mode.running);
        assert!(!mode.snapshot.game_over);
        assert_eq!(mode.snapshot.score, 0);
        assert_eq!(mode.snapshot.snake.len(), 1);
    }

    #[test]
    fn test_turn_keys_reach_engine() {
        let mut mode = HumanMode::new(GameConfig::default());
        mode.handle_event(key(KeyCode::Down));
        assert_eq!(mode.engine.state().velocity, Direction::Down.velocity());
    }

    #[test]
    fn test_game_over_stops_driver() {
        let mut mode = HumanMode::new(GameConfig::default());

        play_until_over(&mut mode);

        assert!(!mode.running);
        assert!(mode.snapshot.game_over);
        assert!(mode.engine.is_game_over());
    }

    #[test]
    fn test_restart_only_after_game_over() {
        let mut mode = HumanMode::new(GameConfig::default());
        let before = mode.snapshot.clone();

        mode.handle_event(key(KeyCode::Char('r')));
        assert_eq!(mode.snapshot, before);
        assert!(!mode.restarted);

        play_until_over(&mut mode);
        mode.handle_event(key(KeyCode::Char('r')));

        assert!(mode.running);
        assert!(mode.restarted);
        assert!(!mode.snapshot.game_over);
        assert_eq!(mode.snapshot.score, 0);
    }

    #[test]
    fn test_quit_key() {
        let mut mode = HumanMode::new(GameConfig::default());
        mode.handle_event(key(KeyCode::Char('q')));
        assert!(mode.should_quit);
    }

    #[test]
    fn test_store_failure_reaches_the_screen() {
        let dir = tempfile::TempDir::new().unwrap();
        // A directory cannot be read as a score file
        let config = GameConfig {
            high_score_path: Some(dir.path().to_path_buf()),
            ..GameConfig::small()
        };

        let mut mode = HumanMode::new(config);
        assert!(mode.snapshot.store_warning.is_some());

        play_until_over(&mut mode);

        assert!(mode.snapshot.game_over);
        assert!(mode.snapshot.store_warning.is_some());
    }

    #[test]
    fn test_memory_store_without_path() {
        let mode = HumanMode::new(GameConfig::default());
        assert!(mode.snapshot.store_warning.is_none());
        assert_eq!(mode.snapshot.high_score, 0);
    }
}
