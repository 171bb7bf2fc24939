//! Game session: spawn, move/rotate, gravity, lock, line clear, score and level.

use crate::board::{Board, WIDTH};
use crate::highscores::ScoreStore;
use crate::input::Command;
use crate::pieces::{Piece, PieceGenerator};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Points per cleared row.
const ROW_POINTS: u32 = 100;
/// Extra points per row beyond the first in a single lock.
const MULTI_ROW_BONUS: u32 = 50;
/// Level goes up each time the score passes a multiple of this.
const LEVEL_UP_SCORE: u32 = 500;
const BASE_FALL_MS: u64 = 500;
const FALL_STEP_MS: u64 = 50;
const MIN_FALL_MS: u64 = 100;

/// Spawn column: centre of the board for a 4-wide box.
pub const SPAWN_X: i32 = WIDTH as i32 / 2 - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Falling,
    Paused,
    GameOver,
}

/// Whether the loop should keep running after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Things that happened during a call, for animations and logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Row indices (bottom-up, pre-clear) that were removed by one lock.
    RowsCleared { rows: Vec<usize> },
    Bonus(u32),
    LevelUp(u32),
    GameOver,
}

/// Read-only view handed to the renderer every frame.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub board: &'a Board,
    pub active: &'a Piece,
    pub next: &'a Piece,
    pub score: u32,
    pub high_score: u32,
    pub level: u32,
    pub paused: bool,
    pub game_over: bool,
}

#[derive(Debug)]
pub struct GameState {
    pub board: Board,
    pub active: Piece,
    pub next: Piece,
    pub score: u32,
    pub level: u32,
    pub high_score: u32,
    pub phase: Phase,
    generator: PieceGenerator,
    store: Box<dyn ScoreStore>,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(mut generator: PieceGenerator, store: Box<dyn ScoreStore>) -> Self {
        let high_score = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "could not load high score; starting from 0");
            0
        });
        let next = generator.next();
        let mut state = Self {
            board: Board::new(),
            active: next,
            next,
            score: 0,
            level: 1,
            high_score,
            phase: Phase::Falling,
            generator,
            store,
            events: Vec::new(),
        };
        state.spawn();
        info!(high_score, "session started");
        state
    }

    /// Gravity period for the current level.
    pub fn fall_interval(&self) -> Duration {
        let step = u64::from(self.level).saturating_mul(FALL_STEP_MS);
        Duration::from_millis(BASE_FALL_MS.saturating_sub(step).max(MIN_FALL_MS))
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: &self.board,
            active: &self.active,
            next: &self.next,
            score: self.score,
            high_score: self.high_score,
            level: self.level,
            paused: self.phase == Phase::Paused,
            game_over: self.phase == Phase::GameOver,
        }
    }

    /// Events recorded since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    /// Apply one command according to the current phase.
    pub fn apply(&mut self, command: Command) -> Flow {
        match self.phase {
            Phase::Paused => {
                if command == Command::Pause {
                    self.phase = Phase::Falling;
                    debug!("resumed");
                }
                Flow::Continue
            }
            Phase::GameOver => match command {
                Command::Restart | Command::Pause => {
                    self.restart();
                    Flow::Continue
                }
                Command::Quit => self.quit(),
                _ => Flow::Continue,
            },
            Phase::Falling => {
                match command {
                    Command::MoveLeft => {
                        self.try_move(-1, 0);
                    }
                    Command::MoveRight => {
                        self.try_move(1, 0);
                    }
                    Command::RotateCw => self.rotate_cw(),
                    Command::SoftDrop => self.step_down(),
                    Command::HardDrop => self.hard_drop(),
                    Command::Pause => {
                        self.phase = Phase::Paused;
                        debug!("paused");
                    }
                    Command::Restart => self.restart(),
                    Command::Quit => return self.quit(),
                }
                Flow::Continue
            }
        }
    }

    /// Gravity: one row down, or lock if blocked. Ignored unless falling.
    pub fn tick_gravity(&mut self) {
        if self.phase == Phase::Falling {
            self.step_down();
        }
    }

    fn try_move(&mut self, dx: i32, dy: i32) -> bool {
        let (x, y) = (self.active.x + dx, self.active.y + dy);
        if self.board.is_valid_position(&self.active.shape, x, y) {
            self.active.x = x;
            self.active.y = y;
            true
        } else {
            false
        }
    }

    fn rotate_cw(&mut self) {
        let rotated = self.active.shape.rotate();
        if self
            .board
            .is_valid_position(&rotated, self.active.x, self.active.y)
        {
            self.active.shape = rotated;
        }
    }

    fn step_down(&mut self) {
        if !self.try_move(0, 1) {
            self.lock_active();
        }
    }

    fn hard_drop(&mut self) {
        while self.try_move(0, 1) {}
        self.lock_active();
    }

    fn lock_active(&mut self) {
        let piece = self.active;
        self.board
            .lock(&piece.shape, piece.color_index(), piece.x, piece.y);
        debug!(kind = ?piece.kind, x = piece.x, y = piece.y, "locked");
        self.clear_rows();
        self.save_high_score();
        self.spawn();
    }

    fn clear_rows(&mut self) {
        let rows = self.board.completed_rows();
        let cleared = self.board.clear_completed_rows() as u32;
        if cleared == 0 {
            return;
        }
        for _ in 0..cleared {
            self.add_score(ROW_POINTS);
        }
        if cleared > 1 {
            let bonus = (cleared - 1) * MULTI_ROW_BONUS;
            self.add_score(bonus);
            self.events.push(GameEvent::Bonus(bonus));
        }
        info!(rows = cleared, score = self.score, "rows cleared");
        self.events.push(GameEvent::RowsCleared { rows });
    }

    /// Add points; one level per multiple of LEVEL_UP_SCORE passed.
    fn add_score(&mut self, points: u32) {
        let before = self.score / LEVEL_UP_SCORE;
        self.score = self.score.saturating_add(points);
        let crossed = self.score / LEVEL_UP_SCORE - before;
        if crossed > 0 {
            self.level += crossed;
            info!(level = self.level, "level up");
            self.events.push(GameEvent::LevelUp(self.level));
        }
    }

    /// Promote next to active, draw a new next, place at the spawn origin.
    fn spawn(&mut self) {
        let mut piece = std::mem::replace(&mut self.next, self.generator.next());
        piece.x = SPAWN_X;
        piece.y = 0;
        self.active = piece;
        if !self.board.is_valid_position(&piece.shape, piece.x, piece.y) {
            self.phase = Phase::GameOver;
            self.save_high_score();
            info!(score = self.score, "game over");
            self.events.push(GameEvent::GameOver);
        }
    }

    fn save_high_score(&mut self) {
        if self.score <= self.high_score {
            return;
        }
        self.high_score = self.score;
        match self.store.save(self.score) {
            Ok(true) => debug!(score = self.score, "high score saved"),
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not save high score"),
        }
    }

    /// New board and score, same store and generator.
    pub fn restart(&mut self) {
        self.save_high_score();
        info!(score = self.score, "restarting");
        self.board = Board::new();
        self.score = 0;
        self.level = 1;
        self.phase = Phase::Falling;
        self.events.clear();
        self.next = self.generator.next();
        self.spawn();
    }

    fn quit(&mut self) -> Flow {
        self.save_high_score();
        info!(score = self.score, high_score = self.high_score, "quit");
        Flow::Quit
    }
}
