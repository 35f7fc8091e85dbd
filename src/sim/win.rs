/// WinConditionDetector: goal contact + one-shot pattern triggers.
///
/// Goal: the cell under the body centre holds the goal id.
///
/// Pattern trigger: a list of `(cell, id)` requirements and a target cell.
/// When every requirement holds, the goal tile is written to the target
/// once. The `fired` flag is never cleared by grid changes, only by a
/// level restart.
///
/// Text form (level files):  `60,34 61,34 62,34 = 104,105,106 -> 61,33`

use tracing::info;

use crate::domain::entity::Body;
use crate::domain::grid::{Cell, TileGrid};
use crate::domain::tile::TileId;
use crate::error::LevelError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatternTrigger {
    pattern: Vec<(Cell, TileId)>,
    target: Cell,
    fired: bool,
}

impl PatternTrigger {
    pub fn new(pattern: Vec<(Cell, TileId)>, target: Cell) -> Self {
        PatternTrigger { pattern, target, fired: false }
    }

    /// Parse `c,r c,r ... = id,id,... -> c,r`.
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let bad = |reason: &str| LevelError::BadTrigger {
            text: text.trim().to_string(),
            reason: reason.to_string(),
        };

        let (lhs, target) = text.split_once("->").ok_or_else(|| bad("missing `->`"))?;
        let (cells, ids) = lhs.split_once('=').ok_or_else(|| bad("missing `=`"))?;

        let cells = cells.split_whitespace()
            .map(parse_cell)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| bad("cells must be `col,row`"))?;
        let ids = ids.split(',')
            .map(|s| s.trim().parse::<TileId>().ok())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| bad("ids must be integers"))?;
        let target = parse_cell(target.trim()).ok_or_else(|| bad("target must be `col,row`"))?;

        if cells.is_empty() {
            return Err(bad("no cells"));
        }
        if cells.len() != ids.len() {
            return Err(bad("cell and id counts differ"));
        }
        Ok(PatternTrigger::new(cells.into_iter().zip(ids).collect(), target))
    }

    fn matches(&self, grid: &TileGrid) -> bool {
        self.pattern.iter()
            .all(|&((c, r), id)| grid.type_at(c, r) == Some(id))
    }
}

// ── Inspection (tests) ──

#[cfg(test)]
impl PatternTrigger {
    pub(crate) fn pattern(&self) -> &[(Cell, TileId)] { &self.pattern }
    pub(crate) fn target(&self) -> Cell { self.target }
    pub(crate) fn fired(&self) -> bool { self.fired }
}

#[cfg(test)]
impl WinConditionDetector {
    pub(crate) fn triggers(&self) -> &[PatternTrigger] { &self.triggers }
}

fn parse_cell(s: &str) -> Option<Cell> {
    let (c, r) = s.split_once(',')?;
    Some((c.trim().parse().ok()?, r.trim().parse().ok()?))
}

#[derive(Clone, Debug)]
pub struct WinConditionDetector {
    goal: TileId,
    triggers: Vec<PatternTrigger>,
}

impl WinConditionDetector {
    pub fn new(goal: TileId, triggers: Vec<PatternTrigger>) -> Self {
        WinConditionDetector { goal, triggers }
    }

    /// Is the body's centre inside a goal tile?
    pub fn reached_goal(&self, grid: &TileGrid, body: &Body) -> bool {
        let (x, y) = body.center();
        let (col, row) = grid.world_to_cell(x, y);
        grid.type_at(col, row) == Some(self.goal)
    }

    /// Fire every matching trigger that has not fired yet.
    /// Returns the cells that received the goal tile.
    pub fn run_triggers(&mut self, grid: &mut TileGrid) -> Vec<Cell> {
        let mut revealed = vec![];
        for t in self.triggers.iter_mut().filter(|t| !t.fired) {
            if !t.matches(grid) { continue; }
            t.fired = true;
            let (col, row) = t.target;
            if grid.set_cell_type(col, row, self.goal) {
                info!(col, row, "exit_revealed");
                revealed.push(t.target);
            }
        }
        revealed
    }

    pub fn reset(&mut self) {
        for t in &mut self.triggers {
            t.fired = false;
        }
    }
}
