//! App: terminal init, main loop, gravity clock and key handling.

use crate::GameConfig;
use crate::game::{Flow, GameState, Phase};
use crate::highscores::{FileScoreStore, MemoryScoreStore, ScoreStore};
use crate::input::{Command, key_to_command};
use crate::pieces::PieceGenerator;
use crate::theme::Theme;
use crate::ui::{self, Animations};
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use ratatui::backend::CrosstermBackend;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on one input poll; also the loop's idle sleep.
const POLL_INTERVAL_MS: u64 = 10;

/// The loop's own error wins; otherwise the first failed restore step.
fn first_error(
    result: Result<()>,
    restore: impl IntoIterator<Item = std::io::Result<()>>,
) -> Result<()> {
    result?;
    for step in restore {
        step.context("restoring terminal")?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Rules,
    Playing,
}

pub struct App {
    theme: Theme,
    state: GameState,
    screen: Screen,
    animations: Animations,
    last_fall: Instant,
}

impl App {
    pub fn new(config: &GameConfig, theme: Theme) -> Self {
        let generator = config
            .seed
            .map_or_else(PieceGenerator::from_entropy, PieceGenerator::seeded);
        let store: Box<dyn ScoreStore> = if config.persist {
            let store = FileScoreStore::new(&config.score_file);
            debug!(path = %store.path().display(), "high score file");
            Box::new(store)
        } else {
            Box::new(MemoryScoreStore::default())
        };
        let screen = if config.show_rules {
            Screen::Rules
        } else {
            Screen::Playing
        };
        Self {
            theme,
            state: GameState::new(generator, store),
            screen,
            animations: Animations::new(config.animations),
            last_fall: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            cursor::{Hide, Show},
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, Hide)?;

        let result = DefaultTerminal::new(CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| self.run_loop(&mut terminal));

        // Restore
        let raw = disable_raw_mode();
        let screen = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
        first_error(result, [raw, screen])
    }

    /// Read at most one key press, waiting no longer than `timeout`.
    fn poll_key(timeout: Duration) -> Result<Option<KeyEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            match self.screen {
                Screen::Rules => {
                    terminal.draw(|f| ui::draw_rules(f, &self.theme))?;
                    if Self::poll_key(Duration::from_millis(POLL_INTERVAL_MS))?.is_some() {
                        self.screen = Screen::Playing;
                        self.last_fall = Instant::now();
                        debug!("rules dismissed");
                    }
                    continue;
                }
                Screen::Playing => {}
            }

            let snapshot = self.state.snapshot();
            terminal.draw(|f| ui::draw(f, &snapshot, &self.theme, &mut self.animations, now))?;

            if let Some(key) = Self::poll_key(Duration::from_millis(POLL_INTERVAL_MS))? {
                if let Some(command) = key_to_command(key) {
                    let before = self.state.phase;
                    if self.state.apply(command) == Flow::Quit {
                        return Ok(());
                    }
                    let restarted = (command == Command::Restart && before == Phase::Falling)
                        || (before == Phase::GameOver && self.state.phase == Phase::Falling);
                    if restarted {
                        self.animations.reset();
                    }
                    if self.state.phase == Phase::Falling && (restarted || before == Phase::Paused) {
                        // Gravity starts a fresh interval.
                        self.last_fall = Instant::now();
                    }
                }
            }

            if self.state.phase == Phase::Falling
                && self.last_fall.elapsed() >= self.state.fall_interval()
            {
                self.state.tick_gravity();
                self.last_fall = Instant::now();
            }

            let now = Instant::now();
            for event in self.state.drain_events() {
                self.animations.on_event(&event, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::io;

    fn io_err(msg: &str) -> io::Result<()> {
        Err(io::Error::other(msg.to_owned()))
    }

    #[test]
    fn test_restore_failure_is_reported() {
        let err = first_error(Ok(()), [Ok(()), io_err("leave alternate screen")]).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("restoring terminal"));
        assert!(text.contains("leave alternate screen"));
    }

    #[test]
    fn test_loop_error_wins_over_restore_error() {
        let err = first_error(Err(anyhow!("draw failed")), [io_err("raw mode"), Ok(())])
            .unwrap_err();
        assert_eq!(err.to_string(), "draw failed");
    }

    #[test]
    fn test_clean_exit() {
        assert!(first_error(Ok(()), [Ok(()), Ok(())]).is_ok());
    }
}
