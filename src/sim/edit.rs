/// EditSession: the copy-one-tile / paste-one-tile mechanic.
///
/// ## Protocol
///
///   hover(x, y)      pointer moved; tracks the cell under it
///   select()         remember the hovered tile (free)
///   copy()           selection → copy buffer        (costs 1)
///   begin_paste()    arm a paste of the copy buffer (costs 1, at intent time)
///   commit_paste()   place the buffer into an EMPTY cell, forced solid
///
/// `remaining_budget` is unsigned and only ever decremented after a
/// `> 0` check, so it cannot underflow. Failed operations change nothing,
/// except that a rejected commit keeps the paste armed.

use crate::domain::grid::{Cell, TileGrid};
use crate::domain::tile::TileId;

/// A tile picked with the pointer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Selection {
    pub cell: Cell,
    pub type_id: TileId,
}

/// What the renderer draws at the pointer. The two modes never coexist.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HoverView {
    None,
    /// Outline over an existing tile.
    Marker(Cell),
    /// Ghost of the tile that a commit would place here.
    Preview(Cell, TileId),
}

/// Result of one edit operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EditOutcome {
    Applied,
    NoBudget,
    NothingHovered,
    NothingSelected,
    NothingCopied,
    NotArmed,
    Occupied,
    OutOfBounds,
}

impl EditOutcome {
    pub fn applied(self) -> bool {
        self == EditOutcome::Applied
    }
}

#[derive(Clone, Debug)]
pub struct EditSession {
    hovered: Option<Cell>,
    selection: Option<Selection>,
    copy_buffer: Option<TileId>,
    remaining_budget: u32,
    pending_paste: bool,
}

impl EditSession {
    pub fn new(budget: u32) -> Self {
        EditSession {
            hovered: None,
            selection: None,
            copy_buffer: None,
            remaining_budget: budget,
            pending_paste: false,
        }
    }

    pub fn selection(&self) -> Option<Selection> { self.selection }
    pub fn copy_buffer(&self) -> Option<TileId> { self.copy_buffer }
    pub fn remaining_budget(&self) -> u32 { self.remaining_budget }
    pub fn pending_paste(&self) -> bool { self.pending_paste }

    pub fn out_of_budget(&self) -> bool {
        self.remaining_budget == 0
    }

    fn spend(&mut self) -> bool {
        if self.remaining_budget == 0 { return false; }
        self.remaining_budget -= 1;
        true
    }

    // ── Pointer ──

    pub fn hover(&mut self, grid: &TileGrid, world_x: f32, world_y: f32) {
        self.hovered = Some(grid.world_to_cell(world_x, world_y));
    }

    /// Pointer left the play area.
    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    pub fn hover_view(&self, grid: &TileGrid) -> HoverView {
        let cell = match self.hovered {
            Some(c) => c,
            None => return HoverView::None,
        };
        if grid.cell_at(cell.0, cell.1).is_some() {
            return HoverView::Marker(cell);
        }
        match self.copy_buffer {
            Some(id) if self.pending_paste && grid.in_bounds(cell.0, cell.1) => {
                HoverView::Preview(cell, id)
            }
            _ => HoverView::None,
        }
    }

    // ── Edge operations ──

    pub fn select(&mut self, grid: &TileGrid) -> EditOutcome {
        let cell = match self.hovered {
            Some(c) => c,
            None => return EditOutcome::NothingHovered,
        };
        match grid.type_at(cell.0, cell.1) {
            Some(type_id) => {
                self.selection = Some(Selection { cell, type_id });
                EditOutcome::Applied
            }
            None => EditOutcome::NothingHovered,
        }
    }

    pub fn copy(&mut self) -> EditOutcome {
        if self.remaining_budget == 0 { return EditOutcome::NoBudget; }
        let sel = match self.selection {
            Some(s) => s,
            None => return EditOutcome::NothingSelected,
        };
        self.spend();
        self.copy_buffer = Some(sel.type_id);
        EditOutcome::Applied
    }

    /// Arms a paste. Charged immediately, even if a paste is already armed.
    pub fn begin_paste(&mut self) -> EditOutcome {
        if self.remaining_budget == 0 { return EditOutcome::NoBudget; }
        if self.copy_buffer.is_none() { return EditOutcome::NothingCopied; }
        self.spend();
        self.pending_paste = true;
        EditOutcome::Applied
    }

    /// Place the copy buffer at the world point. Empty, in-bounds cells only;
    /// the placed tile always blocks, whatever its type's rule says.
    pub fn commit_paste(&mut self, grid: &mut TileGrid, world_x: f32, world_y: f32) -> EditOutcome {
        if !self.pending_paste { return EditOutcome::NotArmed; }
        let type_id = match self.copy_buffer {
            Some(id) => id,
            None => return EditOutcome::NothingCopied,
        };
        let (col, row) = grid.world_to_cell(world_x, world_y);
        if !grid.in_bounds(col, row) { return EditOutcome::OutOfBounds; }
        if !grid.is_empty(col, row) { return EditOutcome::Occupied; }

        grid.set_cell_type(col, row, type_id);
        grid.set_collidable(col, row, true);
        self.pending_paste = false;
        EditOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;

    /// Centre of a cell in world units (tile size 16).
    fn at(col: i32, row: i32) -> (f32, f32) {
        (col as f32 * 16.0 + 8.0, row as f32 * 16.0 + 8.0)
    }

    fn grid() -> TileGrid {
        grid_from(&[
            "    ",
            "o  \"",
            "####",
        ])
    }

    fn select_at(e: &mut EditSession, g: &TileGrid, col: i32, row: i32) -> EditOutcome {
        let (x, y) = at(col, row);
        e.hover(g, x, y);
        e.select(g)
    }

    #[test]
    fn full_copy_paste_scenario() {
        let mut g = grid();
        let mut e = EditSession::new(3);

        assert!(select_at(&mut e, &g, 0, 1).applied());
        assert_eq!(e.selection(), Some(Selection { cell: (0, 1), type_id: 5 }));
        assert_eq!(e.remaining_budget(), 3, "select is free");

        assert!(e.copy().applied());
        assert_eq!(e.remaining_budget(), 2);
        assert!(e.begin_paste().applied());
        assert_eq!(e.remaining_budget(), 1);

        let (x, y) = at(2, 0);
        assert!(e.commit_paste(&mut g, x, y).applied());
        assert_eq!(g.type_at(2, 0), Some(5));
        assert!(g.is_solid(2, 0));
        assert!(!e.pending_paste());

        assert!(e.begin_paste().applied());
        assert_eq!(e.remaining_budget(), 0);
        assert!(e.out_of_budget());

        assert_eq!(e.begin_paste(), EditOutcome::NoBudget);
        assert_eq!(e.copy(), EditOutcome::NoBudget);
        assert_eq!(e.remaining_budget(), 0);
    }

    #[test]
    fn copy_without_selection_changes_nothing() {
        let mut e = EditSession::new(3);
        assert_eq!(e.copy(), EditOutcome::NothingSelected);
        assert_eq!(e.remaining_budget(), 3);
        assert_eq!(e.copy_buffer(), None);
    }

    #[test]
    fn begin_paste_needs_copy_buffer() {
        let mut e = EditSession::new(3);
        assert_eq!(e.begin_paste(), EditOutcome::NothingCopied);
        assert_eq!(e.remaining_budget(), 3);
        assert!(!e.pending_paste());
    }

    #[test]
    fn double_begin_paste_charges_twice() {
        let g = grid();
        let mut e = EditSession::new(4);
        select_at(&mut e, &g, 0, 1);
        e.copy();
        assert!(e.begin_paste().applied());
        assert!(e.begin_paste().applied());
        assert_eq!(e.remaining_budget(), 1);
        assert!(e.pending_paste());
    }

    #[test]
    fn paste_onto_occupied_cell_is_rejected() {
        let mut g = grid();
        let mut e = EditSession::new(3);
        select_at(&mut e, &g, 0, 1);
        e.copy();
        e.begin_paste();

        let (x, y) = at(1, 2);
        assert_eq!(e.commit_paste(&mut g, x, y), EditOutcome::Occupied);
        assert_eq!(g.type_at(1, 2), Some(1));
        assert!(e.pending_paste(), "rejection keeps the paste armed");

        let (x, y) = at(9, 0);
        assert_eq!(e.commit_paste(&mut g, x, y), EditOutcome::OutOfBounds);
        assert!(e.pending_paste());
    }

    #[test]
    fn commit_without_arming_is_noop() {
        let mut g = grid();
        let mut e = EditSession::new(3);
        select_at(&mut e, &g, 0, 1);
        e.copy();
        let (x, y) = at(1, 0);
        assert_eq!(e.commit_paste(&mut g, x, y), EditOutcome::NotArmed);
        assert!(g.is_empty(1, 0));
    }

    #[test]
    fn pasted_walkable_type_still_blocks() {
        let mut g = grid();
        let mut e = EditSession::new(3);
        select_at(&mut e, &g, 3, 1); // grass, walkable by rule
        assert!(!g.is_solid(3, 1));
        e.copy();
        e.begin_paste();
        let (x, y) = at(1, 1);
        assert!(e.commit_paste(&mut g, x, y).applied());
        assert_eq!(g.type_at(1, 1), Some(92));
        assert!(g.is_solid(1, 1));
    }

    #[test]
    fn copy_buffer_persists_across_pastes() {
        let mut g = grid();
        let mut e = EditSession::new(5);
        select_at(&mut e, &g, 0, 1);
        e.copy();
        for col in 1..3 {
            e.begin_paste();
            let (x, y) = at(col, 0);
            assert!(e.commit_paste(&mut g, x, y).applied());
        }
        assert_eq!(e.copy_buffer(), Some(5));
        assert_eq!(e.remaining_budget(), 2);
    }

    #[test]
    fn selecting_empty_cell_keeps_previous_selection() {
        let g = grid();
        let mut e = EditSession::new(3);
        select_at(&mut e, &g, 0, 1);
        assert_eq!(select_at(&mut e, &g, 1, 0), EditOutcome::NothingHovered);
        assert_eq!(e.selection().map(|s| s.type_id), Some(5));
    }

    #[test]
    fn hover_view_modes_are_exclusive() {
        let g = grid();
        let mut e = EditSession::new(3);
        assert_eq!(e.hover_view(&g), HoverView::None);

        let (x, y) = at(0, 2);
        e.hover(&g, x, y);
        assert_eq!(e.hover_view(&g), HoverView::Marker((0, 2)));

        let (x, y) = at(1, 0);
        e.hover(&g, x, y);
        assert_eq!(e.hover_view(&g), HoverView::None, "nothing armed");

        select_at(&mut e, &g, 0, 1);
        e.copy();
        e.begin_paste();
        e.hover(&g, x, y);
        assert_eq!(e.hover_view(&g), HoverView::Preview((1, 0), 5));

        let (x, y) = at(0, 1);
        e.hover(&g, x, y);
        assert_eq!(e.hover_view(&g), HoverView::Marker((0, 1)), "tile wins over preview");

        e.hover(&g, -20.0, 8.0);
        assert_eq!(e.hover_view(&g), HoverView::None);
        e.clear_hover();
        assert_eq!(e.hovered, None);
    }
}
