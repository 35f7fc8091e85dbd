/// LevelSession: one attempt at one level.
///
/// ## State machine
///
///   Running ──goal (level < max)──▶ LevelComplete(NextLevel(level + 1))
///   Running ──goal (level = max)──▶ LevelComplete(GameWon)
///   Running ──restart / fell out──▶ Restarted ──next step──▶ Running
///
/// `LevelComplete` is terminal: `step` keeps returning it and does nothing.
///
/// ## Tile layers
///
///   - `base`: the grid as authored. **Never mutated.**
///   - `grid`: the live grid (pastes, trigger injections).
///
/// Restart copies `base` back over `grid`.

use tracing::info;

use crate::config::GameConfig;
use crate::domain::entity::{AnimState, Body, Facing};
use crate::domain::grid::TileGrid;
use crate::domain::player::PlayerController;
use crate::domain::tile::{TileId, TileRules};
use crate::error::LevelError;
use super::edit::{EditSession, HoverView, Selection};
use super::event::GameEvent;
use super::level::LevelDef;
use super::win::WinConditionDetector;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Completion {
    NextLevel(usize),
    GameWon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Running,
    LevelComplete(Completion),
    /// Reported for the tick the restart happened on.
    Restarted,
}

/// Outcome of one `step`.
#[derive(Clone, Debug, PartialEq)]
pub struct StepReport {
    pub state: SessionState,
    pub events: Vec<GameEvent>,
}

/// Edit budget for a 1-based level number.
pub fn budget_for(level: usize) -> u32 {
    u32::try_from(level).unwrap_or(u32::MAX).saturating_add(2)
}

pub struct LevelSession {
    pub(super) level: usize,
    pub(super) max_level: usize,
    pub(super) name: String,
    pub(super) base: TileGrid,
    pub(super) grid: TileGrid,
    pub(super) player: PlayerController,
    pub(super) edit: EditSession,
    pub(super) detector: WinConditionDetector,
    pub(super) state: SessionState,
    pub(super) dt: f32,
    pub(super) tick: u64,
}

// ── Construction / restart ──

impl LevelSession {
    /// Start `level` (1-based) of a pack with `max_level` levels.
    pub fn new(def: &LevelDef, level: usize, max_level: usize, config: &GameConfig) -> Result<Self, LevelError> {
        let rules = TileRules::from_config(&config.tiles);
        let base = def.grid(config.physics.tile_size, &rules);
        let spawn = PlayerController::spawn_point(&base, rules.spawn, &config.physics)
            .ok_or(LevelError::MissingSpawn { level })?;

        let mut player = PlayerController::new(spawn, &config.physics);
        player.place();

        info!(level, name = %def.name, budget = budget_for(level), "level_started");

        Ok(LevelSession {
            level,
            max_level,
            name: def.name.clone(),
            grid: base.clone(),
            base,
            player,
            edit: EditSession::new(budget_for(level)),
            detector: WinConditionDetector::new(rules.goal, def.triggers.clone()),
            state: SessionState::Running,
            dt: config.dt(),
            tick: 0,
        })
    }

    /// Back to the authored state: grid, body, budget, copy buffer, triggers.
    pub fn restart(&mut self) {
        self.grid = self.base.clone();
        self.player.place();
        self.edit = EditSession::new(budget_for(self.level));
        self.detector.reset();
        self.state = SessionState::Restarted;
        info!(level = self.level, "level_restarted");
    }
}

// ── Read-only views for presentation ──

impl LevelSession {
    pub fn level(&self) -> usize { self.level }
    pub fn max_level(&self) -> usize { self.max_level }
    pub fn name(&self) -> &str { &self.name }
    pub fn grid(&self) -> &TileGrid { &self.grid }
    pub fn state(&self) -> SessionState { self.state }
    pub fn tick(&self) -> u64 { self.tick }

    pub fn body(&self) -> Option<&Body> { self.player.body() }
    pub fn facing(&self) -> Facing { self.player.facing() }
    pub fn anim(&self) -> AnimState { self.player.anim() }

    pub fn hover_view(&self) -> HoverView { self.edit.hover_view(&self.grid) }
    pub fn selection(&self) -> Option<Selection> { self.edit.selection() }
    pub fn copy_buffer(&self) -> Option<TileId> { self.edit.copy_buffer() }
    pub fn pending_paste(&self) -> bool { self.edit.pending_paste() }
    pub fn remaining_budget(&self) -> u32 { self.edit.remaining_budget() }
    pub fn out_of_budget(&self) -> bool { self.edit.out_of_budget() }
}
