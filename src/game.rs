use std::time::Duration;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::{Board, CellState};
use crate::error::ConfigError;
use crate::piece::{spawn_column, ActivePiece, PieceController};
use crate::shape::{ShapeCatalogue, ShapeKind};

// ============================================================================
// Configuration
// ============================================================================

pub const DEFAULT_WIDTH: usize = 10;
pub const DEFAULT_HEIGHT: usize = 20;
pub const DEFAULT_GRAVITY_MS: u64 = 1000;

/// Gravity steps a single `tick` may take; older backlog is dropped.
pub const MAX_STEPS_PER_TICK: u32 = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameConfig {
    pub width: usize,
    pub height: usize,
    /// Time between gravity steps.
    pub gravity_interval: Duration,
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.gravity_interval.is_zero() {
            return Err(ConfigError::ZeroGravityInterval);
        }
        Ok(())
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            gravity_interval: Duration::from_millis(DEFAULT_GRAVITY_MS),
        }
    }
}

// ============================================================================
// Types
// ============================================================================

/// A single player request. Repeat rate and debouncing belong to the caller.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    Playing,
    Paused,
    GameOver,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    PieceMoved,
    PieceRotated,
    PieceLocked,
    LinesCleared(usize),
    PieceSpawned(ShapeKind),
    Paused,
    Unpaused,
    GameRestarted,
    GameOver,
}

// ============================================================================
// Game
// ============================================================================

#[derive(Debug)]
pub struct Game<R: Rng = StdRng> {
    board: Board,
    controller: PieceController,
    catalogue: ShapeCatalogue,
    rng: R,
    gravity_interval: Duration,
    accumulated: Duration,
    lines_cleared: usize,
    pub state: GameState,
    events: Vec<GameEvent>,
}

impl Game<StdRng> {
    /// Standard catalogue with a deterministic piece sequence.
    pub fn seeded(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        Self::new(config, ShapeCatalogue::standard(), StdRng::seed_from_u64(seed))
    }

    /// Fixture game around an existing board and piece. Later spawns use the
    /// standard catalogue with a fixed seed.
    pub fn with_board(board: Board, piece: ActivePiece) -> Self {
        let controller = PieceController::with_piece(board.width(), piece);
        let mut game = Self {
            board,
            controller,
            catalogue: ShapeCatalogue::standard(),
            rng: StdRng::seed_from_u64(0),
            gravity_interval: Duration::from_millis(DEFAULT_GRAVITY_MS),
            accumulated: Duration::ZERO,
            lines_cleared: 0,
            state: GameState::Playing,
            events: Vec::new(),
        };
        if !game.controller.is_spawn_valid(&game.board) {
            game.enter_game_over();
        }
        game
    }
}

impl<R: Rng> Game<R> {
    pub fn new(
        config: GameConfig,
        catalogue: ShapeCatalogue,
        mut rng: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let board = Board::new(config.width, config.height)?;

        // Every shape must fit at the spawn column on an empty board
        let spawn_x = spawn_column(config.width) as usize;
        if let Some(shape) = catalogue
            .all_shapes()
            .iter()
            .find(|s| spawn_x + s.base().cols() > config.width)
        {
            return Err(ConfigError::ShapeTooWide {
                kind: shape.kind(),
                shape_width: shape.base().cols(),
                board_width: config.width,
            });
        }

        let first = catalogue.choose(&mut rng).clone();
        let controller = PieceController::new(config.width, first);

        let mut game = Self {
            board,
            controller,
            catalogue,
            rng,
            gravity_interval: config.gravity_interval,
            accumulated: Duration::ZERO,
            lines_cleared: 0,
            state: GameState::Playing,
            events: Vec::new(),
        };
        game.after_spawn();
        Ok(game)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> &ActivePiece {
        self.controller.active()
    }

    pub fn lines_cleared(&self) -> usize {
        self.lines_cleared
    }

    pub fn gravity_interval(&self) -> Duration {
        self.gravity_interval
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    /// Dispatches one command. Returns whether the piece changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::MoveLeft => self.move_piece(-1, 0),
            Command::MoveRight => self.move_piece(1, 0),
            Command::SoftDrop => self.move_piece(0, 1),
            Command::Rotate => self.rotate_piece(),
        }
    }

    pub fn move_piece(&mut self, dx: i16, dy: i16) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if self.controller.try_move(&self.board, dx, dy) {
            self.events.push(GameEvent::PieceMoved);
            true
        } else {
            false
        }
    }

    pub fn rotate_piece(&mut self) -> bool {
        if self.state != GameState::Playing {
            return false;
        }
        if self.controller.try_rotate(&self.board) {
            self.events.push(GameEvent::PieceRotated);
            true
        } else {
            false
        }
    }

    /// Advances the gravity clock by `elapsed`, taking one step per full
    /// interval, at most [`MAX_STEPS_PER_TICK`]. Returns the number of steps taken.
    pub fn tick(&mut self, elapsed: Duration) -> u32 {
        if self.state != GameState::Playing {
            return 0;
        }
        self.accumulated = self.accumulated.saturating_add(elapsed);
        let mut steps = 0;
        while self.accumulated >= self.gravity_interval && self.state == GameState::Playing {
            if steps == MAX_STEPS_PER_TICK {
                debug!("dropping {:?} of gravity backlog", self.accumulated);
                self.accumulated = Duration::ZERO;
                break;
            }
            self.accumulated -= self.gravity_interval;
            self.step();
            steps += 1;
        }
        if self.state != GameState::Playing {
            self.accumulated = Duration::ZERO;
        }
        steps
    }

    /// One gravity step: descend, or lock, clear and spawn when blocked.
    pub fn step(&mut self) {
        if self.state != GameState::Playing {
            return;
        }
        if !self.controller.try_move(&self.board, 0, 1) {
            self.lock_and_spawn();
        }
    }

    fn lock_and_spawn(&mut self) {
        let piece = self.controller.active();
        self.board
            .lock_piece(piece.matrix(), piece.position, piece.kind());
        self.events.push(GameEvent::PieceLocked);

        // Clear rows before the next piece looks at the board
        let cleared = self.board.clear_completed_rows();
        if cleared > 0 {
            self.lines_cleared += cleared;
            self.events.push(GameEvent::LinesCleared(cleared));
        }

        self.controller.spawn_next(&self.catalogue, &mut self.rng);
        self.after_spawn();
    }

    fn after_spawn(&mut self) {
        let kind = self.controller.active().kind();
        debug!("spawned {:?}", kind);
        self.events.push(GameEvent::PieceSpawned(kind));
        if !self.controller.is_spawn_valid(&self.board) {
            self.enter_game_over();
        }
    }

    fn enter_game_over(&mut self) {
        info!("game over after {} lines", self.lines_cleared);
        self.state = GameState::GameOver;
        self.events.push(GameEvent::GameOver);
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            GameState::Playing => {
                self.state = GameState::Paused;
                self.events.push(GameEvent::Paused);
            }
            GameState::Paused => {
                self.state = GameState::Playing;
                self.events.push(GameEvent::Unpaused);
            }
            GameState::GameOver => {}
        }
    }

    pub fn restart(&mut self) {
        info!("restarting");
        // Reset board and counters
        self.board.clear();
        self.lines_cleared = 0;
        self.accumulated = Duration::ZERO;
        self.state = GameState::Playing;
        self.events.clear();
        self.events.push(GameEvent::GameRestarted);

        self.controller.spawn_next(&self.catalogue, &mut self.rng);
        self.after_spawn();
    }

    /// The locked grid with the active piece drawn over it. Sub-cells above
    /// the top row are clipped.
    pub fn render_grid(&self) -> Vec<Vec<CellState>> {
        let mut visual_grid = self.board.rows().to_vec();

        // Overlay current piece
        let piece = self.controller.active();
        for block in piece.blocks() {
            if block.x < 0 || block.y < 0 {
                continue;
            }
            if let Some(cell) = visual_grid
                .get_mut(block.y as usize)
                .and_then(|row| row.get_mut(block.x as usize))
            {
                *cell = CellState::Filled(piece.kind());
            }
        }
        visual_grid
    }

    /// Takes and clears all pending events.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
