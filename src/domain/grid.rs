/// TileGrid: the collision layer of a level.
///
/// Row-major `Vec<Option<TileCell>>`; `None` = no tile. Coordinates are
/// signed so world→cell conversion can land outside the map; every query
/// treats out-of-bounds as "no tile" instead of failing.
///
/// All mutations go through `set_cell_type()` / `set_collidable()`.
/// The collidable flag is a cache of `TileRules::collidable(type_id)`,
/// recomputed on every type change.

use super::tile::{TileCell, TileId, TileRules};

/// Integer cell address `(col, row)`.
pub type Cell = (i32, i32);

#[derive(Clone, Debug)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tile_size: f32,
    cells: Vec<Option<TileCell>>,
    rules: TileRules,
}

impl TileGrid {
    /// Build a grid from authored type ids (row-major, `width * height` long).
    /// Missing trailing entries become empty cells.
    pub fn from_ids(
        width: usize,
        height: usize,
        tile_size: f32,
        ids: &[Option<TileId>],
        rules: &TileRules,
    ) -> Self {
        let cells = (0..width * height)
            .map(|i| ids.get(i).copied().flatten().map(|id| rules.cell(id)))
            .collect();
        TileGrid { width, height, tile_size, cells, rules: rules.clone() }
    }

    #[inline]
    pub fn width(&self) -> usize { self.width }
    #[inline]
    pub fn height(&self) -> usize { self.height }
    #[inline]
    pub fn tile_size(&self) -> f32 { self.tile_size }
    pub fn pixel_width(&self) -> f32 { self.width as f32 * self.tile_size }
    pub fn pixel_height(&self) -> f32 { self.height as f32 * self.tile_size }
    pub fn rules(&self) -> &TileRules { &self.rules }

    #[inline]
    fn index(&self, col: i32, row: i32) -> Option<usize> {
        if col < 0 || row < 0 { return None; }
        let (c, r) = (col as usize, row as usize);
        if c < self.width && r < self.height {
            Some(r * self.width + c)
        } else {
            None
        }
    }

    /// Cell contents, or `None` for empty / out of bounds.
    #[inline]
    pub fn cell_at(&self, col: i32, row: i32) -> Option<TileCell> {
        self.index(col, row).and_then(|i| self.cells[i])
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        self.index(col, row).is_some()
    }

    /// Does this cell block movement? Out of bounds never does.
    #[inline]
    pub fn is_solid(&self, col: i32, row: i32) -> bool {
        self.cell_at(col, row).map_or(false, |c| c.collidable)
    }

    /// In bounds and holding no tile.
    pub fn is_empty(&self, col: i32, row: i32) -> bool {
        self.index(col, row).map_or(false, |i| self.cells[i].is_none())
    }

    pub fn type_at(&self, col: i32, row: i32) -> Option<TileId> {
        self.cell_at(col, row).map(|c| c.type_id)
    }

    // ── Coordinate conversion ──

    pub fn world_to_cell(&self, x: f32, y: f32) -> Cell {
        (
            (x / self.tile_size).floor() as i32,
            (y / self.tile_size).floor() as i32,
        )
    }

    /// Top-left world position of a cell (snaps to the cell origin).
    pub fn cell_to_world(&self, col: i32, row: i32) -> (f32, f32) {
        (col as f32 * self.tile_size, row as f32 * self.tile_size)
    }

    // ── Mutation ──

    /// Replace a cell's type and recompute its collidable flag.
    /// Returns false (and changes nothing) when out of bounds.
    pub fn set_cell_type(&mut self, col: i32, row: i32, type_id: TileId) -> bool {
        match self.index(col, row) {
            Some(i) => {
                self.cells[i] = Some(self.rules.cell(type_id));
                true
            }
            None => false,
        }
    }

    /// Override the cached collidable flag of an existing tile.
    pub fn set_collidable(&mut self, col: i32, row: i32, collidable: bool) -> bool {
        match self.index(col, row).and_then(|i| self.cells[i].as_mut()) {
            Some(cell) => {
                cell.collidable = collidable;
                true
            }
            None => false,
        }
    }

    /// First cell holding `type_id`, scanning rows top to bottom.
    pub fn find_first(&self, type_id: TileId) -> Option<Cell> {
        self.cells.iter()
            .position(|c| c.map_or(false, |c| c.type_id == type_id))
            .map(|i| ((i % self.width) as i32, (i / self.width) as i32))
    }
}
