//! Colour table for the seven pieces plus UI colours; optional btop-style theme file.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Number of piece colours (one per catalog entry).
pub const PIECE_COLORS: usize = 7;

#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours by catalog index: I blue, T purple, O yellow, Z red, S green, L orange, J brown.
    pub pieces: [Color; PIECE_COLORS],
    /// Empty cell background.
    pub bg: Color,
    /// Empty cell glyph colour and borders.
    pub div_line: Color,
    /// Text (score, level, legend).
    pub main_fg: Color,
    /// Box titles.
    pub title: Color,
    /// Row-clear flash colour.
    pub flash: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("reading theme file: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0:?} is not a hex colour")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

const CLASSIC_PIECES: [Color; PIECE_COLORS] = [
    Color::Rgb(0x3B, 0x82, 0xF6),
    Color::Rgb(0xA8, 0x55, 0xF7),
    Color::Rgb(0xEA, 0xB3, 0x08),
    Color::Rgb(0xEF, 0x44, 0x44),
    Color::Rgb(0x22, 0xC5, 0x5E),
    Color::Rgb(0xF9, 0x73, 0x16),
    Color::Rgb(0x92, 0x40, 0x0E),
];

/// Theme-file keys for each piece colour, by catalog index.
const PIECE_KEYS: [&str; PIECE_COLORS] = [
    "piece_i", "piece_t", "piece_o", "piece_z", "piece_s", "piece_l", "piece_j",
];

impl Theme {
    /// Built-in colours, close to the emoji squares of the classic console version.
    pub fn classic() -> Self {
        Self {
            pieces: CLASSIC_PIECES,
            bg: Color::Rgb(0x1E, 0x22, 0x2A),
            div_line: Color::Rgb(0x4B, 0x52, 0x63),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            flash: Color::White,
        }
    }

    /// Classic colours overridden by the theme file (if it exists), then by the palette.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))?
            }
            _ => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Like [`Theme::load`], but a bad or unreadable theme file only logs a warning and
    /// leaves the classic colours (palette still applied).
    pub fn load_or_default(path: Option<&Path>, palette: crate::Palette) -> Self {
        Self::load(path, palette).unwrap_or_else(|e| {
            warn!(error = %e, "theme not loaded; using classic colours");
            let mut theme = Self::classic();
            theme.apply_palette(palette);
            theme
        })
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x88, 0x00),
                    Color::Rgb(0xFF, 0xFF, 0xFF),
                ];
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style: distinguishable without red/green.
                self.pieces = [
                    Color::Rgb(0x00, 0x72, 0xB2),
                    Color::Rgb(0xCC, 0x79, 0xA7),
                    Color::Rgb(0xF0, 0xE4, 0x42),
                    Color::Rgb(0xD5, 0x5E, 0x00),
                    Color::Rgb(0x00, 0x9E, 0x73),
                    Color::Rgb(0xE6, 0x9F, 0x00),
                    Color::Rgb(0x56, 0xB4, 0xE9),
                ];
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        let get = |key: &str| map.get(key).map(|v| parse_hex(v)).transpose();
        for (slot, key) in theme.pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(c) = get(key)? {
                *slot = c;
            }
        }
        if let Some(c) = get("main_bg")?.or(get("meter_bg")?) {
            theme.bg = c;
        }
        if let Some(c) = get("div_line")? {
            theme.div_line = c;
        }
        if let Some(c) = get("main_fg")? {
            theme.main_fg = c;
        }
        if let Some(c) = get("title")? {
            theme.title = c;
        }
        if let Some(c) = get("hi_fg")? {
            theme.flash = c;
        }
        Ok(theme)
    }

    /// Colour for a locked cell or piece (catalog index 0..7).
    #[inline]
    pub fn piece_color(&self, index: u8) -> Color {
        self.pieces[(index as usize) % PIECE_COLORS]
    }
}

/// `theme[key]="value"` lines to a map. Comments, blanks and empty values are skipped.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.strip_prefix("theme[")?.split_once(']')?;
            let value = value.trim().strip_prefix('=')?.trim();
            let value = value.trim_matches(|c| c == '"' || c == '\'');
            (!value.is_empty()).then(|| (key.trim().to_owned(), value.to_owned()))
        })
        .collect()
}

fn hex_byte(s: &str) -> Result<u8, ThemeError> {
    u8::from_str_radix(s, 16).map_err(|_| ThemeError::InvalidHex(s.to_owned()))
}

/// `#RRGGBB` or short `#RGB` to an RGB colour.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let digits = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.trim().to_owned());
    if !digits.is_ascii() {
        return Err(invalid());
    }
    let channels: Vec<u8> = match digits.len() {
        6 => (0..3)
            .map(|i| hex_byte(&digits[i * 2..i * 2 + 2]))
            .collect::<Result<_, _>>()?,
        3 => (0..3)
            .map(|i| hex_byte(&digits[i..=i]).map(|v| v * 17))
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(channels[0], channels[1], channels[2]))
}
