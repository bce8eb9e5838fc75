//! Terminal drawing.
//!
//! The logical playfield is in pixels; each terminal cell covers
//! `PX_PER_COL` × `PX_PER_ROW` of it. Frames are composed on a [`Canvas`]
//! and written in one go.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor,
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, SetForegroundColor},
    terminal::{self, ClearType},
};

use crate::game::{GameState, Motion, Pose, Variant};
use crate::physics::Rect;
use crate::toy::{Toy, BACKGROUND, LIGHT};

pub const PX_PER_COL: i32 = 10;
pub const PX_PER_ROW: i32 = 20;

const STAND: [&str; 3] = [" () ", "/||\\", " /\\ "];
const WALK: [[&str; 3]; 2] = [[" () ", "/||\\", " /| "], [" () ", "/||\\", " |\\ "]];
const ENEMY: [[&str; 2]; 2] = [["/oo\\", "^^^^"], ["\\oo/", "vvvv"]];
const BLOCKS: [char; 2] = ['=', '#'];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub color: Color,
}

const BLANK: Cell = Cell {
    ch: ' ',
    color: Color::Reset,
};

/// A frame of character cells.
pub struct Canvas {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Canvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            cells: vec![BLANK; cols * rows],
        }
    }

    /// A canvas covering a `width` × `height` pixel field plus a status line.
    pub fn for_field(width: i32, height: i32) -> Self {
        Self::new(
            (width / PX_PER_COL).max(1) as usize,
            (height / PX_PER_ROW).max(1) as usize + 1,
        )
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return;
        }
        self.cells[row as usize * self.cols + col as usize] = Cell { ch, color };
    }

    pub fn text(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (i, ch) in text.chars().enumerate() {
            if ch != ' ' {
                self.put(col + i as i32, row, ch, color);
            }
        }
    }

    pub fn centered(&mut self, row: i32, text: &str, color: Color) {
        let col = (self.cols as i32 - text.chars().count() as i32) / 2;
        self.text(col, row, text, color);
    }

    pub fn get(&self, col: usize, row: usize) -> Option<Cell> {
        (col < self.cols && row < self.rows).then(|| self.cells[row * self.cols + col])
    }

    pub fn row_string(&self, row: usize) -> String {
        self.cells[row * self.cols..(row + 1) * self.cols]
            .iter()
            .map(|c| c.ch)
            .collect()
    }

    /// Fills the cells covered by a pixel rectangle, shifted by `scroll_x`.
    pub fn fill_rect(&mut self, rect: Rect, scroll_x: i32, ch: char, color: Color) {
        let (col0, row0) = to_cell(rect.x - scroll_x, rect.y);
        let (col1, row1) = to_cell(rect.right() - scroll_x - 1, rect.bottom() - 1);
        for row in row0..=row1 {
            for col in col0..=col1 {
                self.put(col, row, ch, color);
            }
        }
    }

    fn sprite(&mut self, x: i32, y: i32, art: &[&str], color: Color) {
        let (col, row) = to_cell(x, y);
        for (i, line) in art.iter().enumerate() {
            self.text(col, row + i as i32, line, color);
        }
    }

    fn status_row(&self) -> i32 {
        self.rows as i32 - 1
    }
}

/// Pixel to cell coordinates, rounding toward negative infinity.
pub fn to_cell(x: i32, y: i32) -> (i32, i32) {
    (x.div_euclid(PX_PER_COL), y.div_euclid(PX_PER_ROW))
}

fn draw_boundaries(canvas: &mut Canvas) {
    let last = canvas.cols() as i32 - 1;
    for row in 0..canvas.status_row() {
        canvas.put(0, row, '|', Color::DarkGrey);
        canvas.put(last, row, '|', Color::DarkGrey);
    }
}

fn draw_background(canvas: &mut Canvas, scroll_x: i32) {
    // Sparse stars drift past slower than the level does.
    let offset = scroll_x / 2;
    for row in 0..canvas.status_row() {
        for col in 0..canvas.cols() as i32 {
            let wx = col * PX_PER_COL + offset;
            if (wx / PX_PER_COL * 7 + row * 13) % 37 == 0 {
                canvas.put(col, row, '.', Color::DarkBlue);
            }
        }
    }
}

fn draw_platforms(canvas: &mut Canvas, state: &GameState) {
    for p in &state.platforms {
        let (ch, color) = match p.motion {
            Motion::Static => (BLOCKS[p.skin % BLOCKS.len()], Color::DarkYellow),
            Motion::Horizontal { .. } => ('~', Color::Blue),
            Motion::Vertical { .. } => ('-', Color::DarkRed),
        };
        canvas.fill_rect(p.rect, state.scroll_x, ch, color);
    }
}

fn draw_enemies(canvas: &mut Canvas, state: &GameState) {
    for e in &state.enemies {
        let art = ENEMY[e.image() % ENEMY.len()];
        canvas.sprite(e.rect.x - state.scroll_x, e.rect.y, &art, Color::Red);
    }
}

fn draw_player(canvas: &mut Canvas, state: &GameState) {
    let player = &state.player;
    let art = match player.pose {
        Pose::Standing => STAND,
        Pose::Walking(i) => WALK[i % WALK.len()],
    };
    canvas.sprite(player.rect.x - state.scroll_x, player.rect.y, &art, Color::White);
}

fn draw_status(canvas: &mut Canvas, state: &GameState, connected: bool, said: Option<&str>) {
    let row = canvas.status_row();
    let nao = if connected { "NAO: on" } else { "NAO: off" };
    let status = match said {
        Some(line) => format!("Level {} | {} | \"{}\"", state.level + 1, nao, line),
        None => format!("Level {} | {}", state.level + 1, nao),
    };
    canvas.text(0, row, &status, Color::Grey);
}

/// Composes one game frame.
pub fn draw_game(canvas: &mut Canvas, state: &GameState, connected: bool, said: Option<&str>) {
    canvas.cells.fill(BLANK);
    if state.variant == Variant::Scroller {
        draw_background(canvas, state.scroll_x);
    } else {
        draw_boundaries(canvas);
    }
    draw_platforms(canvas, state);
    draw_enemies(canvas, state);
    draw_player(canvas, state);
    draw_status(canvas, state, connected, said);
}

/// Start/quit menu with the current choice highlighted.
pub fn draw_select_menu(canvas: &mut Canvas, title: &str, options: &[&str], selected: usize) {
    canvas.cells.fill(BLANK);
    let mid = canvas.rows() as i32 / 2;
    canvas.centered(mid - 4, title, Color::Yellow);
    for (i, option) in options.iter().enumerate() {
        let color = if i == selected { Color::Blue } else { Color::White };
        let label = if i == selected {
            format!("> {option} <")
        } else {
            option.to_string()
        };
        canvas.centered(mid + i as i32 * 2, &label, color);
    }
}

/// Title screen listing key bindings.
pub fn draw_key_menu(canvas: &mut Canvas, title: &str, keys: &str) {
    canvas.cells.fill(BLANK);
    let mid = canvas.rows() as i32 / 2;
    canvas.centered(mid - 2, title, Color::White);
    canvas.centered(mid + 1, keys, Color::White);
}

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

/// Composes one toy frame: the light spot as a dim disc, insects on top.
pub fn draw_toy(canvas: &mut Canvas, toy: &Toy) {
    canvas.cells.fill(Cell {
        ch: ' ',
        color: rgb(BACKGROUND),
    });

    let spot = &toy.light;
    let (c0, r0) = to_cell((spot.x - spot.radius) as i32, (spot.y - spot.radius) as i32);
    let (c1, r1) = to_cell((spot.x + spot.radius) as i32, (spot.y + spot.radius) as i32);
    for row in r0..=r1 {
        for col in c0..=c1 {
            let dx = (col * PX_PER_COL + PX_PER_COL / 2) as f32 - spot.x;
            let dy = (row * PX_PER_ROW + PX_PER_ROW / 2) as f32 - spot.y;
            let d = (dx * dx + dy * dy).sqrt() / spot.radius;
            let ch = match d {
                d if d < 0.4 => '@',
                d if d < 0.7 => ':',
                d if d <= 1.0 => '.',
                _ => continue,
            };
            canvas.put(col, row, ch, rgb(LIGHT));
        }
    }

    for insect in &toy.insects {
        let (col, row) = to_cell(insect.x as i32, insect.y as i32);
        let color = rgb(insect.kind.color);
        canvas.put(col - 1, row, '(', color);
        canvas.put(col, row, if insect.pause > 0 { 'o' } else { '*' }, color);
        canvas.put(col + 1, row, ')', color);
    }
}

/// Status panel for the LED routine.
pub fn draw_leds(canvas: &mut Canvas, counter: u32, phase: &str, said: Option<&str>) {
    canvas.cells.fill(BLANK);
    let mid = canvas.rows() as i32 / 2;
    canvas.centered(mid - 2, "NAO LED test", Color::Yellow);
    canvas.centered(mid, &format!("{phase}  ({counter:>2}/30)"), Color::White);
    canvas.centered(mid + 2, "[T] touch head to stop", Color::DarkGrey);
    if let Some(line) = said {
        canvas.text(0, canvas.status_row(), &format!("\"{line}\""), Color::Grey);
    }
}

/// Raw-mode alternate screen, restored on drop.
pub struct TerminalSession {
    out: Stdout,
    release_events: bool,
}

impl TerminalSession {
    pub fn enter() -> io::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            out,
            terminal::EnterAlternateScreen,
            terminal::Clear(ClearType::All),
            cursor::Hide
        )?;
        let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                out,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        tracing::debug!(release_events, "terminal ready");
        Ok(Self {
            out,
            release_events,
        })
    }

    pub fn release_events(&self) -> bool {
        self.release_events
    }

    pub fn present(&mut self, canvas: &Canvas) -> io::Result<()> {
        let mut color = None;
        for row in 0..canvas.rows() {
            queue!(self.out, cursor::MoveTo(0, row as u16))?;
            for col in 0..canvas.cols() {
                let cell = canvas.cells[row * canvas.cols() + col];
                if color != Some(cell.color) {
                    queue!(self.out, SetForegroundColor(cell.color))?;
                    color = Some(cell.color);
                }
                queue!(self.out, Print(cell.ch))?;
            }
        }
        self.out.flush()
    }

    fn leave(&mut self) -> io::Result<()> {
        if self.release_events {
            execute!(self.out, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.out,
            SetForegroundColor(Color::Reset),
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = self.leave() {
            tracing::error!(error = %e, "failed to restore terminal");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Playfield;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pixels_map_to_cells() {
        assert_eq!(to_cell(0, 0), (0, 0));
        assert_eq!(to_cell(799, 599), (79, 29));
        assert_eq!(to_cell(-1, 25), (-1, 1));
    }

    #[test]
    fn out_of_bounds_writes_are_dropped() {
        let mut canvas = Canvas::new(4, 2);
        canvas.put(-1, 0, 'x', Color::White);
        canvas.put(4, 1, 'x', Color::White);
        canvas.text(2, 1, "abc", Color::White);
        assert_eq!(canvas.row_string(0), "    ");
        assert_eq!(canvas.row_string(1), "  ab");
    }

    #[test]
    fn game_frame_shows_ground_player_and_status() {
        let mut rng = StdRng::seed_from_u64(3);
        let field = Playfield::default();
        let state = GameState::new(Variant::Classic, field, &mut rng);
        let mut canvas = Canvas::for_field(field.width, field.height);
        assert_eq!((canvas.cols(), canvas.rows()), (80, 31));

        draw_game(&mut canvas, &state, false, None);

        // Ground occupies the last two playfield rows.
        assert!(canvas.row_string(28).contains("========"));
        // Player art at (100, 400) -> column 10, row 20.
        assert_eq!(canvas.get(11, 20).map(|c| c.ch), Some('('));
        assert!(canvas.row_string(30).starts_with("Level 1 | NAO: off"));
    }

    #[test]
    fn toy_frame_draws_insects_over_the_light() {
        let mut rng = StdRng::seed_from_u64(8);
        let field = Playfield::default();
        let toy = Toy::new(field, &mut rng);
        let mut canvas = Canvas::for_field(field.width, field.height);
        draw_toy(&mut canvas, &toy);

        // Light spot starts centred on (400, 300).
        let centre = canvas.get(40, 15).map(|c| c.ch);
        assert!(matches!(centre, Some('@' | '*' | 'o' | '(' | ')')));
        for insect in &toy.insects {
            let (col, row) = to_cell(insect.x as i32, insect.y as i32);
            let ch = canvas.get(col as usize, row as usize).map(|c| c.ch);
            assert!(matches!(ch, Some('*' | '(' | ')')));
        }
    }

    #[test]
    fn menu_highlights_selection() {
        let mut canvas = Canvas::new(40, 12);
        draw_select_menu(&mut canvas, "Nao Game", &["Start Game", "Quit Game"], 1);
        let text: Vec<String> = (0..12).map(|r| canvas.row_string(r)).collect();
        assert!(text.iter().any(|r| r.contains("> Quit Game <")));
        assert!(text.iter().any(|r| r.contains("Start Game") && !r.contains('>')));
    }
}
