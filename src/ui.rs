//! Layout and drawing: rules screen, playfield, next preview, stat boxes, overlays.

use crate::board::{Cell, HEIGHT, WIDTH};
use crate::game::{GameEvent, Snapshot};
use crate::pieces::Piece;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Each board cell is two terminal columns wide so it looks square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 26;
/// Border + grid.
const BOARD_OUTER_WIDTH: u16 = WIDTH as u16 * CELL_WIDTH + 2;
const BOARD_OUTER_HEIGHT: u16 = HEIGHT as u16 + 2;

/// Row-clear flash fade in ms.
const ROW_FLASH_MS: u32 = 450;
/// Banner text: visible/hidden half-period and number of blinks.
const BANNER_BLINK_MS: u64 = 200;
const BANNER_BLINKS: u64 = 3;

const FILLED: &str = "██";
const EMPTY: &str = " ·";

/// Cosmetic animations driven by game events. Never touches game state.
#[derive(Default)]
pub struct Animations {
    enabled: bool,
    /// Rows waiting for a flash effect (built on the next draw, once the board rect is known).
    pending_rows: Vec<usize>,
    row_flash: Option<Effect>,
    row_flash_process_time: Option<Instant>,
    /// Blinking text over the top of the board ("BONUS +N", "LEVEL N").
    banner: Option<(String, Instant)>,
}

impl Animations {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn on_event(&mut self, event: &GameEvent, now: Instant) {
        if !self.enabled {
            return;
        }
        match event {
            GameEvent::RowsCleared { rows } => {
                self.pending_rows.clone_from(rows);
                self.row_flash = None;
                self.row_flash_process_time = None;
            }
            GameEvent::Bonus(points) => self.banner = Some((format!(" BONUS +{points} "), now)),
            // Events from one lock share `now`; a bonus from that lock keeps the banner.
            GameEvent::LevelUp(level) => {
                let same_lock = matches!(&self.banner, Some((_, started)) if *started == now);
                if !same_lock {
                    self.banner = Some((format!(" LEVEL {level} "), now));
                }
            }
            GameEvent::GameOver => self.reset(),
        }
    }

    pub fn reset(&mut self) {
        self.pending_rows.clear();
        self.row_flash = None;
        self.row_flash_process_time = None;
        self.banner = None;
    }

    #[cfg(test)]
    fn active(&self) -> bool {
        !self.pending_rows.is_empty() || self.row_flash.is_some() || self.banner.is_some()
    }
}

/// Board + sidebar, centred in `area`. Returns (board_outer, sidebar).
fn game_layout(area: Rect) -> (Rect, Rect) {
    let total_w = BOARD_OUTER_WIDTH + SIDEBAR_WIDTH;
    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(BOARD_OUTER_HEIGHT),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_OUTER_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(vert[1]);
    (inner[0], inner[1])
}

fn board_inner(board_outer: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(board_outer)
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

fn bordered<'a>(theme: &Theme, title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)))
}

/// Full frame: board, sidebar, and whichever overlay the snapshot calls for.
pub fn draw(
    frame: &mut Frame,
    snapshot: &Snapshot<'_>,
    theme: &Theme,
    animations: &mut Animations,
    now: Instant,
) {
    let area = frame.area();
    let (board_outer, sidebar) = game_layout(area);

    draw_board(frame.buffer_mut(), snapshot, theme, board_outer);
    draw_sidebar(frame, snapshot, theme, sidebar);

    let inner = board_inner(board_outer);
    apply_row_flash(frame, theme, animations, inner, now);
    draw_banner(frame.buffer_mut(), theme, animations, inner, now);

    if snapshot.paused {
        draw_pause_overlay(frame, theme, area);
    } else if snapshot.game_over {
        draw_game_over(frame, snapshot, theme, area);
    }
}

fn draw_board(buf: &mut Buffer, snapshot: &Snapshot<'_>, theme: &Theme, outer: Rect) {
    let block = bordered(theme, " Tetris ");
    let inner = block.inner(outer);
    block.render(outer, buf);

    let empty_style = Style::default().fg(theme.div_line).bg(theme.bg);
    for (y, row) in snapshot.board.rows().iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let color = if !snapshot.game_over && piece_covers(snapshot.active, x, y) {
                Some(theme.piece_color(snapshot.active.color_index()))
            } else {
                match cell {
                    Cell::Filled(i) => Some(theme.piece_color(*i)),
                    Cell::Empty => None,
                }
            };
            let rx = inner.x + x as u16 * CELL_WIDTH;
            let ry = inner.y + y as u16;
            if rx + CELL_WIDTH > inner.x + inner.width || ry >= inner.y + inner.height {
                continue;
            }
            match color {
                Some(c) => buf.set_string(rx, ry, FILLED, Style::default().fg(c).bg(theme.bg)),
                None => buf.set_string(rx, ry, EMPTY, empty_style),
            };
        }
    }
}

/// True if the piece has an occupied cell at board (x, y).
fn piece_covers(piece: &Piece, x: usize, y: usize) -> bool {
    let col = x as i32 - piece.x;
    let row = y as i32 - piece.y;
    (0..4).contains(&col) && (0..4).contains(&row) && piece.shape.is_filled(col as usize, row as usize)
}

fn draw_sidebar(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Next (border + 4x4 preview)
            Constraint::Length(3), // Score
            Constraint::Length(3), // High
            Constraint::Length(3), // Level
            Constraint::Length(6), // Controls
        ])
        .split(area);

    let next_block = bordered(theme, " Next ");
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], frame.buffer_mut());
    draw_next_preview(frame.buffer_mut(), snapshot.next, theme, next_inner);

    let fg = Style::default().fg(theme.main_fg).add_modifier(Modifier::BOLD);
    for (chunk, title, value) in [
        (chunks[1], " Score ", snapshot.score),
        (chunks[2], " High ", snapshot.high_score),
        (chunks[3], " Level ", snapshot.level),
    ] {
        Paragraph::new(Line::from(Span::styled(value.to_string(), fg)))
            .alignment(Alignment::Right)
            .block(bordered(theme, title))
            .render(chunk, frame.buffer_mut());
    }

    let key = Style::default().fg(theme.title);
    let text = Style::default().fg(theme.main_fg);
    let legend = vec![
        Line::from(vec![
            Span::styled("A/D ", key),
            Span::styled("move   ", text),
            Span::styled("W ", key),
            Span::styled("rotate", text),
        ]),
        Line::from(vec![
            Span::styled("S ", key),
            Span::styled("soft drop  ", text),
            Span::styled("Space ", key),
            Span::styled("hard", text),
        ]),
        Line::from(vec![
            Span::styled("P ", key),
            Span::styled("pause  ", text),
            Span::styled("R ", key),
            Span::styled("restart", text),
        ]),
        Line::from(vec![Span::styled("Q ", key), Span::styled("quit", text)]),
    ];
    Paragraph::new(legend)
        .block(bordered(theme, " Controls "))
        .render(chunks[4], frame.buffer_mut());
}

/// Draw the queued piece in its spawn orientation, 4x4 box.
fn draw_next_preview(buf: &mut Buffer, piece: &Piece, theme: &Theme, area: Rect) {
    let color = theme.piece_color(piece.color_index());
    let off_x = area.width.saturating_sub(4 * CELL_WIDTH) / 2;
    for row in 0..4u16 {
        for col in 0..4u16 {
            if !piece.shape.is_filled(col as usize, row as usize) {
                continue;
            }
            let rx = area.x + off_x + col * CELL_WIDTH;
            let ry = area.y + row;
            if rx + CELL_WIDTH <= area.x + area.width && ry < area.y + area.height {
                buf.set_string(rx, ry, FILLED, Style::default().fg(color).bg(theme.bg));
            }
        }
    }
}

/// Buffer positions covered by the given board rows.
fn row_positions(board_inner: Rect, rows: &[usize]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for &row in rows {
        let y = board_inner.y + row as u16;
        if y >= board_inner.y + board_inner.height {
            continue;
        }
        for x in board_inner.x..board_inner.x + board_inner.width {
            set.insert((x, y));
        }
    }
    set
}

/// Cleared rows flash in the flash colour and fade back to what is there now (TachyonFX).
fn apply_row_flash(
    frame: &mut Frame,
    theme: &Theme,
    animations: &mut Animations,
    board_inner: Rect,
    now: Instant,
) {
    if board_inner.intersection(frame.area()).is_empty() {
        animations.pending_rows.clear();
        animations.row_flash = None;
        animations.row_flash_process_time = None;
        return;
    }
    if !animations.pending_rows.is_empty() {
        let positions = row_positions(board_inner, &animations.pending_rows);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let effect = fx::fade_from(
            theme.flash,
            theme.flash,
            (ROW_FLASH_MS, Interpolation::Linear),
        )
        .with_filter(filter)
        .with_area(board_inner);
        animations.row_flash = Some(effect);
        animations.row_flash_process_time = None;
        animations.pending_rows.clear();
    }

    let delta = animations
        .row_flash_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    animations.row_flash_process_time = Some(now);

    if let Some(effect) = animations.row_flash.as_mut() {
        frame.render_effect(effect, board_inner, TfxDuration::from_millis(delta_ms));
        if effect.done() {
            animations.row_flash = None;
            animations.row_flash_process_time = None;
        }
    }
}

/// Banner blinking across the top row of the board.
fn draw_banner(
    buf: &mut Buffer,
    theme: &Theme,
    animations: &mut Animations,
    board_inner: Rect,
    now: Instant,
) {
    if board_inner.height == 0 || board_inner.y >= buf.area.bottom() {
        return;
    }
    let Some((label, started)) = animations.banner.as_ref() else {
        return;
    };
    let elapsed = now.saturating_duration_since(*started).as_millis() as u64;
    if elapsed >= BANNER_BLINK_MS * 2 * BANNER_BLINKS {
        animations.banner = None;
        return;
    }
    if (elapsed / BANNER_BLINK_MS) % 2 == 1 {
        return;
    }
    let w = label.chars().count() as u16;
    let x = board_inner.x + board_inner.width.saturating_sub(w) / 2;
    let style = Style::default()
        .fg(theme.bg)
        .bg(theme.title)
        .add_modifier(Modifier::BOLD);
    buf.set_stringn(x, board_inner.y, label, board_inner.width as usize, style);
}

fn draw_popup(frame: &mut Frame, theme: &Theme, area: Rect, lines: Vec<Line<'_>>, title: &str) {
    let w = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 4;
    let h = lines.len() as u16 + 2;
    let popup = centered(area, w, h);
    Clear.render(popup, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(theme.bg))
        .block(bordered(theme, title))
        .render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(theme.bg).bg(theme.title),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P to resume ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    draw_popup(frame, theme, area, lines, "");
}

fn draw_game_over(frame: &mut Frame, snapshot: &Snapshot<'_>, theme: &Theme, area: Rect) {
    let fg = Style::default().fg(theme.main_fg);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default()
                .fg(theme.bg)
                .bg(theme.piece_color(3))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", snapshot.score), fg)),
        Line::from(Span::styled(format!(" High: {} ", snapshot.high_score), fg)),
    ];
    if snapshot.score > 0 && snapshot.score >= snapshot.high_score {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(theme.title).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Press P to play again or Q to quit ",
        fg,
    )));
    draw_popup(frame, theme, area, lines, " Tetris ");
}

/// Rules and controls, shown once before the first game.
pub fn draw_rules(frame: &mut Frame, theme: &Theme) {
    let head = Style::default().fg(theme.title).add_modifier(Modifier::BOLD);
    let fg = Style::default().fg(theme.main_fg);
    let text = |s: &'static str| Line::from(Span::styled(s, fg));
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("CONTROLS", head)),
        text("A / ←      Move piece left"),
        text("D / →      Move piece right"),
        text("S / ↓      Soft drop"),
        text("W / ↑      Rotate clockwise"),
        text("Space      Hard drop"),
        text("P          Pause / resume"),
        text("R          Restart"),
        text("Q          Quit"),
        Line::from(""),
        Line::from(Span::styled("SCORING", head)),
        text("100 points for each line cleared"),
        text("Bonus: 2 lines +50, 3 lines +100, 4 lines +150"),
        Line::from(""),
        Line::from(Span::styled("LEVELS", head)),
        text("Start at level 1, level up every 500 points"),
        text("Pieces fall faster each level"),
        Line::from(""),
        Line::from(Span::styled("TIPS", head)),
        text("Keep the field flat, leave room for I pieces"),
        text("Use hard drop for quick placement"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to start the game...",
            Style::default().fg(theme.title),
        )),
    ];
    let area = frame.area();
    let popup = centered(area, 56, lines.len() as u16 + 2);
    Paragraph::new(lines)
        .alignment(Alignment::Left)
        .style(Style::default().bg(theme.bg))
        .block(bordered(theme, " Tetris Game Rules "))
        .render(popup, frame.buffer_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::pieces::ShapeKind;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn snapshot<'a>(board: &'a Board, active: &'a Piece, next: &'a Piece) -> Snapshot<'a> {
        Snapshot {
            board,
            active,
            next,
            score: 1450,
            high_score: 2000,
            level: 3,
            paused: false,
            game_over: false,
        }
    }

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut s = String::new();
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                s.push_str(buf[(x, y)].symbol());
            }
            s.push('\n');
        }
        s
    }

    #[test]
    fn test_piece_covers_uses_shape_offset() {
        let mut p = Piece::new(ShapeKind::O);
        p.x = 3;
        p.y = 5;
        assert!(piece_covers(&p, 4, 6));
        assert!(piece_covers(&p, 5, 7));
        assert!(!piece_covers(&p, 3, 5));
        assert!(!piece_covers(&p, 6, 6));
    }

    #[test]
    fn test_frame_shows_stats_and_next() {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let board = Board::new();
        let active = Piece::new(ShapeKind::T);
        let next = Piece::new(ShapeKind::I);
        let theme = Theme::default();
        let mut animations = Animations::new(true);
        terminal
            .draw(|f| {
                draw(f, &snapshot(&board, &active, &next), &theme, &mut animations, Instant::now());
            })
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        for needle in ["Score", "High", "Level", "Next", "1450", "2000", "Controls"] {
            assert!(text.contains(needle), "missing {needle}");
        }
        // I preview: one row of four filled cells.
        assert!(text.contains("████████"));
    }

    #[test]
    fn test_game_over_prompt() {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        let board = Board::new();
        let active = Piece::new(ShapeKind::T);
        let next = Piece::new(ShapeKind::I);
        let mut snap = snapshot(&board, &active, &next);
        snap.game_over = true;
        let theme = Theme::default();
        let mut animations = Animations::new(false);
        terminal
            .draw(|f| draw(f, &snap, &theme, &mut animations, Instant::now()))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Game Over"));
        assert!(text.contains("play again"));
    }

    #[test]
    fn test_rules_screen() {
        let backend = TestBackend::new(80, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw_rules(f, &Theme::default())).unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("CONTROLS"));
        assert!(text.contains("Press any key"));
    }

    #[test]
    fn test_disabled_animations_ignore_events() {
        let mut animations = Animations::new(false);
        let now = Instant::now();
        animations.on_event(&GameEvent::RowsCleared { rows: vec![19] }, now);
        animations.on_event(&GameEvent::Bonus(50), now);
        assert!(!animations.active());
    }

    #[test]
    fn test_bonus_banner_blinks_then_expires() {
        let mut animations = Animations::new(true);
        let start = Instant::now();
        animations.on_event(&GameEvent::LevelUp(2), start);
        animations.on_event(&GameEvent::Bonus(150), start);
        assert!(animations.active());
        let area = Rect::new(0, 0, 20, 5);

        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 5));
        draw_banner(&mut buf, &Theme::default(), &mut animations, area, start);
        assert!(buffer_text(&buf).contains("BONUS +150"));

        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 5));
        let hidden = start + Duration::from_millis(BANNER_BLINK_MS);
        draw_banner(&mut buf, &Theme::default(), &mut animations, area, hidden);
        assert!(!buffer_text(&buf).contains("BONUS"));

        let later = start + Duration::from_millis(BANNER_BLINK_MS * 2 * BANNER_BLINKS);
        draw_banner(&mut buf, &Theme::default(), &mut animations, area, later);
        assert!(!animations.active());
    }

    #[test]
    fn test_banner_on_one_row_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(40, 1)).unwrap();
        let board = Board::new();
        let active = Piece::new(ShapeKind::T);
        let next = Piece::new(ShapeKind::I);
        let theme = Theme::default();
        let mut animations = Animations::new(true);
        let now = Instant::now();
        animations.on_event(&GameEvent::Bonus(50), now);
        animations.on_event(&GameEvent::RowsCleared { rows: vec![19] }, now);
        terminal
            .draw(|f| draw(f, &snapshot(&board, &active, &next), &theme, &mut animations, now))
            .unwrap();
    }

    #[test]
    fn test_later_level_up_replaces_older_banner() {
        let mut animations = Animations::new(true);
        let start = Instant::now();
        animations.on_event(&GameEvent::Bonus(100), start);
        animations.on_event(&GameEvent::LevelUp(2), start);
        assert!(animations.banner.as_ref().is_some_and(|(l, _)| l.contains("BONUS")));

        let later = start + Duration::from_millis(BANNER_BLINK_MS);
        animations.on_event(&GameEvent::LevelUp(3), later);
        assert!(animations.banner.as_ref().is_some_and(|(l, _)| l.contains("LEVEL 3")));
        animations.on_event(&GameEvent::LevelUp(4), later + Duration::from_millis(1));
        assert!(animations.banner.as_ref().is_some_and(|(l, _)| l.contains("LEVEL 4")));
    }

    #[test]
    fn test_level_up_banner() {
        let mut animations = Animations::new(true);
        let start = Instant::now();
        animations.on_event(&GameEvent::LevelUp(4), start);
        let mut buf = Buffer::empty(Rect::new(0, 0, 30, 5));
        draw_banner(&mut buf, &Theme::default(), &mut animations, Rect::new(0, 0, 20, 5), start);
        assert!(buffer_text(&buf).contains("LEVEL 4"));
    }
}
