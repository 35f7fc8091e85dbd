/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Each tile is two terminal columns wide. The renderer owns the camera,
/// so it is also the one that maps mouse positions back to grid cells.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::entity::{AnimState, Facing};
use crate::domain::grid::{Cell as GridCell, TileGrid};
use crate::domain::tile::{char_for_id, TileId};
use crate::sim::edit::HoverView;
use crate::sim::game::{Game, Phase};
use crate::sim::level::PackSource;
use crate::sim::session::{budget_for, LevelSession, SessionState};
use super::camera::Camera;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 8],
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for every "empty" terminal cell, so row gaps
    /// on VTE terminals match the cell colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 8],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel used to invalidate the back buffer: differs from any real cell.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0, 0, 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, bg: Color) -> Self {
        let mut cell = Self::from_char(c, Color::Reset, bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Repaint the background of an existing cell, keeping its glyph.
    fn tint(&mut self, x: usize, y: usize, bg: Color) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x].bg = bg;
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::from_char(ch, fg, bg));
        }
    }

    /// Fill a whole row with `bg`, then write `s` from column 0.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::from_char(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Palette ──

const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const HOVER_BG: Color = Color::Rgb { r: 90, g: 90, b: 30 };
const PREVIEW_BG: Color = Color::Rgb { r: 20, g: 90, b: 50 };
const SELECT_BG: Color = Color::Rgb { r: 110, g: 30, b: 110 };
const ALERT_BG: Color = Color::Rgb { r: 150, g: 20, b: 20 };
const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };

/// Two-column glyph and colours for a tile id.
fn tile_glyph(id: TileId, solid: bool) -> (char, char, Color, Color) {
    match char_for_id(id) {
        Some('#') => ('▓', '▓', Color::Rgb { r: 110, g: 160, b: 70 }, Color::Rgb { r: 60, g: 45, b: 25 }),
        Some('=') => ('█', '█', Color::Rgb { r: 120, g: 120, b: 120 }, Color::Rgb { r: 70, g: 70, b: 70 }),
        Some('%') => ('░', '░', Color::Rgb { r: 180, g: 120, b: 60 }, Color::Rgb { r: 100, g: 65, b: 30 }),
        Some('o') => ('[', ']', Color::Rgb { r: 220, g: 170, b: 90 }, Color::Rgb { r: 90, g: 60, b: 20 }),
        Some('"') => ('"', '"', Color::Rgb { r: 80, g: 200, b: 80 }, Color::Reset),
        Some('*') => ('*', ' ', Color::Rgb { r: 240, g: 120, b: 200 }, Color::Reset),
        Some('[') => ('╞', '═', Color::Rgb { r: 100, g: 220, b: 255 }, Color::Rgb { r: 20, g: 50, b: 70 }),
        Some('|') => ('═', '═', Color::Rgb { r: 100, g: 220, b: 255 }, Color::Rgb { r: 20, g: 50, b: 70 }),
        Some(']') => ('═', '╡', Color::Rgb { r: 100, g: 220, b: 255 }, Color::Rgb { r: 20, g: 50, b: 70 }),
        Some('G') => ('▐', '▌', GOLD, Color::Rgb { r: 80, g: 60, b: 0 }),
        Some('S') => ('▁', '▁', Color::DarkGrey, Color::Reset),
        _ if solid => ('▒', '▒', Color::Grey, Color::Rgb { r: 50, g: 50, b: 50 }),
        _ => ('·', ' ', Color::DarkGrey, Color::Reset),
    }
}

fn player_glyph(facing: Facing, anim: AnimState) -> (char, char) {
    match (facing, anim) {
        (Facing::Left, AnimState::Idle) => ('◀', '█'),
        (Facing::Left, AnimState::Run) => ('◀', '≡'),
        (Facing::Right, AnimState::Idle) => ('█', '▶'),
        (Facing::Right, AnimState::Run) => ('≡', '▶'),
    }
}

// ── Renderer ──

/// Terminal columns per grid cell.
const CELL_W: usize = 2;

const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;
/// HUD + gap above the map, message + gap + help below.
const RESERVED_ROWS: usize = MAP_ROW + 4;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    camera: Camera,
    last_phase: Option<Phase>,
    last_level: Option<usize>,
    enhanced_keys: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            camera: Camera::new(),
            last_phase: None,
            last_level: None,
            enhanced_keys: false,
        }
    }

    /// Enter raw mode, the alternate screen and mouse capture.
    /// Returns whether the terminal will report key releases.
    pub fn init(&mut self) -> io::Result<bool> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
            self.enhanced_keys = true;
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.cells.fill(Cell::INVALID);

        Ok(self.enhanced_keys)
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    /// Terminal position → grid cell under it, using last frame's camera.
    /// None when the position is outside the map area.
    pub fn pick(&self, column: u16, row: u16) -> Option<GridCell> {
        let (column, row) = (column as usize, row as usize);
        if row < MAP_ROW {
            return None;
        }
        let (vx, vy) = (column / CELL_W, row - MAP_ROW);
        if vx >= self.camera.view_w || vy >= self.camera.view_h {
            return None;
        }
        Some(self.camera.view_to_world(vx, vy))
    }

    pub fn render(&mut self, game: &Game) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        if self.last_phase != Some(game.phase()) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(game.phase());
            self.last_level = None;
        }

        self.front.clear();
        match game.phase() {
            Phase::Playing => {
                self.update_camera(game.session());
                self.compose_game(game);
            }
            Phase::Won => self.compose_game_won(game),
        }

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    /// Size the viewport to the terminal, then snap on level start or
    /// restart and follow otherwise.
    fn update_camera(&mut self, s: &LevelSession) {
        let grid = s.grid();
        let max_view_h = self.term_h.saturating_sub(RESERVED_ROWS).max(1);
        self.camera.view_w = (self.term_w / CELL_W).min(grid.width()).max(1);
        self.camera.view_h = max_view_h.min(grid.height()).max(1);

        let target = s.body()
            .map(|b| {
                let (cx, cy) = b.center();
                grid.world_to_cell(cx, cy)
            })
            .unwrap_or((0, 0));

        let fresh = self.last_level != Some(s.level()) || s.state() == SessionState::Restarted;
        if fresh {
            self.camera.center_on(target, grid.width(), grid.height());
            self.last_level = Some(s.level());
        } else {
            self.camera.follow(target, grid.width(), grid.height());
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    last_x = x + 1;
                    x += 2;
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, game: &Game) {
        let s = game.session();
        let grid = s.grid();

        self.compose_hud(game);

        // Map (camera viewport)
        for vy in 0..self.camera.view_h {
            let row = MAP_ROW + vy;
            if row >= self.front.height { break; }
            for vx in 0..self.camera.view_w {
                let col = vx * CELL_W;
                if col + 1 >= self.front.width { break; }
                let cell = self.camera.view_to_world(vx, vy);
                self.compose_tile(grid, cell, col, row);
            }
        }

        // Overlays, bottom to top: selection, hover, player.
        if let Some(sel) = s.selection() {
            self.tint_cell(sel.cell, SELECT_BG);
        }
        match s.hover_view() {
            HoverView::None => {}
            HoverView::Marker(cell) => self.tint_cell(cell, HOVER_BG),
            HoverView::Preview(cell, id) => {
                if let Some((col, row)) = self.screen_pos(cell) {
                    let (c0, c1, fg, _) = tile_glyph(id, grid.rules().collidable(id));
                    self.front.set(col, row, Cell::from_char(c0, fg, PREVIEW_BG));
                    self.front.set(col + 1, row, Cell::from_char(c1, fg, PREVIEW_BG));
                }
            }
        }
        self.compose_player(s);

        if s.out_of_budget() {
            self.compose_banner(s.tick());
        }

        // Message bar
        let msg_row = MAP_ROW + self.camera.view_h + 1;
        if msg_row < self.front.height {
            if let Some(msg) = game.message() {
                self.front.put_bar(msg_row, &format!(" ◈ {msg} "), Color::Black, MSG_BG);
            }
        }

        // Help bar
        let help_row = MAP_ROW + self.camera.view_h + 3;
        if help_row < self.front.height {
            let help = " ←→/AD:Move  ↑/W/Space:Jump  Click/Enter:Select  C:Copy  V:Paste  IJKL:Cursor  F:Restart  Q:Quit";
            self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset);
        }
    }

    fn compose_hud(&mut self, game: &Game) {
        let s = game.session();
        let copied = s.copy_buffer()
            .map(|id| {
                let (c0, c1, _, _) = tile_glyph(id, s.grid().rules().collidable(id));
                format!("{c0}{c1}")
            })
            .unwrap_or_else(|| "--".to_string());
        let selected = s.selection()
            .map(|sel| format!("({},{})", sel.cell.0, sel.cell.1))
            .unwrap_or_else(|| "-".to_string());
        let mode = if s.pending_paste() { "  PASTE" } else { "" };
        let pack = match game.pack_source() {
            PackSource::Embedded => "built-in".to_string(),
            PackSource::Directory(dir) => dir.display().to_string(),
        };

        let hud = format!(
            " Lv {}/{} {:<16} Edits {}/{}  Copy [{}]  Sel {}  Cleared {}/{}  Pack {}{} ",
            s.level(), s.max_level(), s.name(),
            s.remaining_budget(), budget_for(s.level()),
            copied, selected,
            game.profile().cleared.len(), game.level_count(),
            pack, mode,
        );
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);
    }

    fn compose_tile(&mut self, grid: &TileGrid, cell: GridCell, col: usize, row: usize) {
        let (c0, c1, fg, bg) = match grid.cell_at(cell.0, cell.1) {
            Some(t) => tile_glyph(t.type_id, t.collidable),
            None => (' ', ' ', Color::Reset, Color::Reset),
        };
        self.front.set(col, row, Cell::from_char(c0, fg, bg));
        self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
    }

    fn compose_player(&mut self, s: &LevelSession) {
        let body = match s.body() {
            Some(b) => b,
            None => return,
        };
        let (cx, cy) = body.center();
        let cell = s.grid().world_to_cell(cx, cy);
        if let Some((col, row)) = self.screen_pos(cell) {
            let (c0, c1) = player_glyph(s.facing(), s.anim());
            let bg = self.front.get(col, row).bg;
            let fg = Color::Rgb { r: 255, g: 255, b: 255 };
            self.front.set(col, row, Cell::from_char(c0, fg, bg));
            self.front.set(col + 1, row, Cell::from_char(c1, fg, bg));
        }
    }

    /// Blinking warning across the top of the map.
    fn compose_banner(&mut self, tick: u64) {
        let text = " ⚠ Out of Control! ⚠ ";
        let view_cols = self.camera.view_w * CELL_W;
        let x = view_cols.saturating_sub(text.chars().count()) / 2;
        let fg = if (tick / 20) % 2 == 0 { Color::White } else { GOLD };
        self.front.put_str(x, MAP_ROW, text, fg, ALERT_BG);
    }

    fn screen_pos(&self, cell: GridCell) -> Option<(usize, usize)> {
        self.camera.world_to_view(cell)
            .map(|(vx, vy)| (vx * CELL_W, MAP_ROW + vy))
    }

    fn tint_cell(&mut self, cell: GridCell, bg: Color) {
        if let Some((col, row)) = self.screen_pos(cell) {
            self.front.tint(col, row, bg);
            self.front.tint(col + 1, row, bg);
        }
    }

    // ── Win screen ──

    fn compose_game_won(&mut self, game: &Game) {
        let box_art = [
            "╔══════════════════════════════════════╗",
            "║    ★  YOU TOOK BACK CONTROL!  ★      ║",
            "╚══════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset);
        }
        let levels = format!("◈ All {} levels cleared", game.level_count());
        self.front.put_str(6, 9, &levels, Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
        self.front.set(6, 11, Cell::from_char_wide('🏆', Color::Reset));
        self.front.set(7, 11, Cell::WIDE_CONT);
        self.front.put_str(9, 11, "Thanks for playing!", Color::White, Color::Reset);
        self.front.put_str(6, 13, "▸ ENTER: Play again   ESC/Q: Quit", Color::Rgb { r: 80, g: 255, b: 80 }, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::LEGEND;

    #[test]
    fn every_legend_tile_has_a_glyph() {
        for &(ch, id) in LEGEND {
            let (c0, c1, _, _) = tile_glyph(id, true);
            assert!(c0 != '▒' || c1 != '▒', "'{ch}' falls back to the unknown glyph");
        }
        assert_eq!(tile_glyph(999, true).0, '▒');
        assert_eq!(tile_glyph(999, false).0, '·');
    }

    #[test]
    fn cell_text_round_trips_multibyte() {
        let c = Cell::from_char('═', Color::White, Color::Reset);
        assert_eq!(c.as_str(), "═");
        assert_eq!(c.bg, Cell::BASE_BG);
        assert_eq!(Cell::WIDE_CONT.as_str(), "");
    }

    #[test]
    fn put_bar_fills_and_clips() {
        let mut fb = FrameBuffer::new(6, 2);
        fb.put_bar(1, "abcdefgh", Color::White, HUD_BG);
        assert_eq!(fb.get(5, 1).as_str(), "f");
        assert_eq!(fb.get(0, 1).bg, HUD_BG);
        assert_eq!(fb.get(0, 0).bg, Cell::BASE_BG);
    }

    #[test]
    fn pick_maps_terminal_cells_through_camera() {
        let mut r = Renderer::new();
        r.camera = Camera { x: 5, y: -1, view_w: 10, view_h: 8 };
        assert_eq!(r.pick(0, 1), None);
        assert_eq!(r.pick(0, MAP_ROW as u16), Some((5, -1)));
        assert_eq!(r.pick(3, MAP_ROW as u16 + 2), Some((6, 1)));
        assert_eq!(r.pick(20, MAP_ROW as u16), None);
        assert_eq!(r.pick(0, (MAP_ROW + 8) as u16), None);
    }
}
