//! tetris-tui: classic single-player Tetris in the terminal.

mod app;
mod board;
mod game;
mod highscores;
mod input;
mod pieces;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;

/// Options derived from CLI that affect play (piece sequence, persistence, animations).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub seed: Option<u64>,
    pub score_file: PathBuf,
    pub persist: bool,
    pub animations: bool,
    pub show_rules: bool,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            seed: args.seed,
            score_file: args.score_file.clone(),
            persist: !args.no_save,
            animations: !args.no_animation,
            show_rules: !args.skip_rules,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(e) = init_logging(&args) {
        eprintln!("tetris-tui: {e:#}; continuing without logs");
    }
    let theme = theme::Theme::load_or_default(args.theme.as_deref(), args.palette);
    let config = GameConfig::from(&args);
    tracing::info!(?config, "starting");
    let mut app = App::new(&config, theme);
    app.run()?;
    Ok(())
}

/// The terminal belongs to the game, so logs only go to `--log-file` when given.
/// A log file that cannot be created is reported by the caller; the game still runs.
fn init_logging(args: &Args) -> Result<()> {
    let Some(path) = args.log_file.as_ref() else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

/// Classic Tetris in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tetris-tui",
    version,
    about = "Classic single-player Tetris in the terminal.",
    long_about = "Classic single-player Tetris in the terminal.\n\n\
        Clear full rows to score: 100 points per row plus a bonus of 50 for every extra row \
        cleared at once. The level goes up every 500 points and pieces fall faster.\n\n\
        CONTROLS:\n  A/Left  Move left    D/Right  Move right   S/Down  Soft drop\n  \
        W/Up    Rotate       Space    Hard drop    P       Pause\n  R       Restart      Q        Quit\n\n\
        The high score is kept in highscore.txt in the working directory."
)]
pub struct Args {
    /// High score file (a single decimal number).
    #[arg(long, default_value = highscores::DEFAULT_FILENAME, value_name = "FILE")]
    pub score_file: PathBuf,

    /// Do not read or write the high score file.
    #[arg(long)]
    pub no_save: bool,

    /// Seed for the piece sequence (reproducible games).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]="value"). Classic colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable the row-clear flash and bonus animations.
    #[arg(long)]
    pub no_animation: bool,

    /// Skip the rules screen and start immediately.
    #[arg(long)]
    pub skip_rules: bool,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for --log-file (error, warn, info, debug, trace).
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
