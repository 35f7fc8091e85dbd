/// The step function: advances a level session by one tick.
///
/// Processing order:
///   1. Restart request
///   2. Player movement (integration + collision)
///   3. Fall-out check (body below the grid → restart)
///   4. Edit: pointer hover, then edges in order
///      select → copy → begin_paste → commit_paste
///   5. Win: goal contact, then pattern triggers
///
/// Edges in `FrameInput` are consumed here exactly once.

use tracing::info;

use crate::domain::entity::{EditIntent, FrameInput, MoveIntent};
use super::edit::EditOutcome;
use super::event::GameEvent;
use super::session::{Completion, LevelSession, SessionState, StepReport};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(s: &mut LevelSession, input: FrameInput) -> StepReport {
    if let SessionState::LevelComplete(_) = s.state {
        return report(s, vec![]);
    }
    s.state = SessionState::Running;

    let mut events: Vec<GameEvent> = Vec::new();
    s.tick += 1;

    if input.restart {
        restart_level(s, &mut events);
        return report(s, events);
    }

    resolve_player(s, input.movement, &mut events);
    if fell_out(s) {
        restart_level(s, &mut events);
        return report(s, events);
    }
    resolve_edit(s, input.pointer, input.edit, &mut events);
    resolve_win(s, &mut events);

    report(s, events)
}

fn report(s: &LevelSession, events: Vec<GameEvent>) -> StepReport {
    StepReport { state: s.state, events }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player(s: &mut LevelSession, movement: MoveIntent, events: &mut Vec<GameEvent>) {
    let ev = s.player.step(&s.grid, movement, s.dt);
    if ev.jumped { events.push(GameEvent::Jumped); }
    if ev.landed { events.push(GameEvent::Landed); }
}

/// Body's top edge is below the grid's bottom edge.
fn fell_out(s: &LevelSession) -> bool {
    s.player.body().map_or(false, |b| b.y > s.grid.pixel_height())
}

// ══════════════════════════════════════════════════════════════
// Edit
// ══════════════════════════════════════════════════════════════

fn resolve_edit(
    s: &mut LevelSession,
    pointer: Option<(f32, f32)>,
    edit: EditIntent,
    events: &mut Vec<GameEvent>,
) {
    match pointer {
        Some((x, y)) => s.edit.hover(&s.grid, x, y),
        None => s.edit.clear_hover(),
    }
    if !edit.any() { return; }

    let had_budget = !s.edit.out_of_budget();

    if edit.select && s.edit.select(&s.grid).applied() {
        if let Some(sel) = s.edit.selection() {
            events.push(GameEvent::Selected { cell: sel.cell, type_id: sel.type_id });
        }
    }

    if edit.copy && s.edit.copy().applied() {
        if let Some(type_id) = s.edit.copy_buffer() {
            events.push(GameEvent::Copied { type_id });
        }
    }

    if edit.begin_paste && s.edit.begin_paste().applied() {
        events.push(GameEvent::PasteArmed);
    }

    if edit.commit_paste {
        if let Some((x, y)) = pointer {
            match s.edit.commit_paste(&mut s.grid, x, y) {
                EditOutcome::Applied => {
                    let cell = s.grid.world_to_cell(x, y);
                    let type_id = s.grid.type_at(cell.0, cell.1).unwrap_or_default();
                    info!(col = cell.0, row = cell.1, type_id, "tile_pasted");
                    events.push(GameEvent::Pasted { cell, type_id });
                }
                EditOutcome::Occupied | EditOutcome::OutOfBounds => {
                    events.push(GameEvent::PasteRejected);
                }
                _ => {}
            }
        }
    }

    if had_budget && s.edit.out_of_budget() {
        events.push(GameEvent::OutOfBudget);
    }
}

// ══════════════════════════════════════════════════════════════
// Win
// ══════════════════════════════════════════════════════════════

fn resolve_win(s: &mut LevelSession, events: &mut Vec<GameEvent>) {
    let reached = match s.player.body() {
        Some(body) => s.detector.reached_goal(&s.grid, body),
        None => false,
    };

    if reached {
        let completion = if s.level < s.max_level {
            Completion::NextLevel(s.level + 1)
        } else {
            Completion::GameWon
        };
        s.state = SessionState::LevelComplete(completion);
        info!(level = s.level, ?completion, "level_complete");
        events.push(GameEvent::LevelComplete { level: s.level });
        if completion == Completion::GameWon {
            events.push(GameEvent::GameWon);
        }
        return;
    }

    for cell in s.detector.run_triggers(&mut s.grid) {
        events.push(GameEvent::ExitRevealed { cell });
    }
}

// ══════════════════════════════════════════════════════════════
// Restart
// ══════════════════════════════════════════════════════════════

fn restart_level(s: &mut LevelSession, events: &mut Vec<GameEvent>) {
    s.restart();
    events.push(GameEvent::Restarted);
}
