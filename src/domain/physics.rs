/// Collision resolver: moves a rectangular body through the tile grid.
///
/// ## Axis order
///
/// Horizontal first, then vertical (using the post-horizontal x).
/// Each axis is resolved independently:
///
///   1. Sweep the body's LEADING edge across every cell boundary between
///      the old and new positions.
///   2. At each boundary, test every cell the body's rectangle spans on the
///      other axis (not just its center).
///   3. First collidable cell hit: clamp the leading edge to that cell's
///      boundary, zero velocity on this axis, record `blocked`.
///
/// ## Invariants
///
///   - Cells the body already overlaps never block it. A tile pasted into
///     the body's own space cannot trap or teleport it.
///   - The sweep covers the whole path, so speed never causes tunnelling.
///   - `blocked` is reset at the start of every resolve.

use super::entity::{Blocked, Body};
use super::grid::TileGrid;

/// Cell indices covered by the span `[start, start + len)` on one axis.
#[inline]
fn span(start: f32, len: f32, ts: f32) -> (i32, i32) {
    ((start / ts).floor() as i32, ((start + len) / ts).ceil() as i32 - 1)
}

/// Move `body` by `(dx, dy)` against the grid, updating `blocked`.
pub fn move_and_collide(grid: &TileGrid, body: &mut Body, dx: f32, dy: f32) {
    body.blocked = Blocked::default();
    sweep_x(grid, body, dx);
    sweep_y(grid, body, dy);
}

fn sweep_x(grid: &TileGrid, body: &mut Body, dx: f32) {
    if dx == 0.0 { return; }
    let ts = grid.tile_size();
    let (r0, r1) = span(body.y, body.h, ts);
    let column_blocks = |c: i32| (r0..=r1).any(|r| grid.is_solid(c, r));

    if dx > 0.0 {
        let old_right = body.x + body.w;
        let first = (old_right / ts).ceil() as i32;
        let last = ((old_right + dx) / ts).ceil() as i32 - 1;
        for c in first..=last {
            if column_blocks(c) {
                body.x = c as f32 * ts - body.w;
                body.vx = 0.0;
                body.blocked.right = true;
                return;
            }
        }
    } else {
        let old_left = body.x;
        let first = (old_left / ts).floor() as i32 - 1;
        let last = ((old_left + dx) / ts).floor() as i32;
        for c in (last..=first).rev() {
            if column_blocks(c) {
                body.x = (c + 1) as f32 * ts;
                body.vx = 0.0;
                body.blocked.left = true;
                return;
            }
        }
    }
    body.x += dx;
}

fn sweep_y(grid: &TileGrid, body: &mut Body, dy: f32) {
    if dy == 0.0 { return; }
    let ts = grid.tile_size();
    let (c0, c1) = span(body.x, body.w, ts);
    let row_blocks = |r: i32| (c0..=c1).any(|c| grid.is_solid(c, r));

    if dy > 0.0 {
        let old_bottom = body.y + body.h;
        let first = (old_bottom / ts).ceil() as i32;
        let last = ((old_bottom + dy) / ts).ceil() as i32 - 1;
        for r in first..=last {
            if row_blocks(r) {
                body.y = r as f32 * ts - body.h;
                body.vy = 0.0;
                body.blocked.down = true;
                return;
            }
        }
    } else {
        let old_top = body.y;
        let first = (old_top / ts).floor() as i32 - 1;
        let last = ((old_top + dy) / ts).floor() as i32;
        for r in (last..=first).rev() {
            if row_blocks(r) {
                body.y = (r + 1) as f32 * ts;
                body.vy = 0.0;
                body.blocked.up = true;
                return;
            }
        }
    }
    body.y += dy;
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;

    fn body_at(x: f32, y: f32) -> Body {
        Body::new(x, y, 12.0, 16.0)
    }

    #[test]
    fn lands_on_floor() {
        let g = grid_from(&[
            "    ",
            "    ",
            "####",
        ]);
        let mut b = body_at(2.0, 10.0);
        b.vy = 300.0;
        move_and_collide(&g, &mut b, 0.0, 12.0);
        assert_eq!(b.y, 16.0);
        assert_eq!(b.vy, 0.0);
        assert!(b.blocked.down);
        assert!(!b.blocked.up && !b.blocked.left && !b.blocked.right);
    }

    #[test]
    fn resting_body_stays_grounded() {
        let g = grid_from(&[
            "  ",
            "##",
        ]);
        let mut b = body_at(0.0, 0.0);
        b.vy = 30.0;
        move_and_collide(&g, &mut b, 0.0, 0.5);
        assert_eq!(b.y, 0.0);
        assert!(b.blocked.down);
    }

    #[test]
    fn wall_stops_rightward_motion() {
        let g = grid_from(&[
            "  #",
            "  #",
        ]);
        let mut b = body_at(10.0, 0.0);
        b.vx = 200.0;
        move_and_collide(&g, &mut b, 15.0, 0.0);
        assert_eq!(b.x + b.w, 32.0);
        assert_eq!(b.vx, 0.0);
        assert!(b.blocked.right);
    }

    #[test]
    fn wall_stops_leftward_motion() {
        let g = grid_from(&["#  "]);
        let mut b = body_at(20.0, 0.0);
        b.vx = -200.0;
        move_and_collide(&g, &mut b, -10.0, 0.0);
        assert_eq!(b.x, 16.0);
        assert!(b.blocked.left);
    }

    #[test]
    fn ceiling_stops_upward_motion() {
        let g = grid_from(&[
            "##",
            "  ",
            "  ",
        ]);
        let mut b = body_at(0.0, 24.0);
        b.vy = -500.0;
        move_and_collide(&g, &mut b, 0.0, -20.0);
        assert_eq!(b.y, 16.0);
        assert_eq!(b.vy, 0.0);
        assert!(b.blocked.up);
    }

    #[test]
    fn partial_overlap_checks_every_spanned_row() {
        // Body straddles rows 0 and 1; only the lower row has a wall.
        let g = grid_from(&[
            "   ",
            "  #",
        ]);
        let mut b = body_at(4.0, 8.0);
        move_and_collide(&g, &mut b, 30.0, 0.0);
        assert_eq!(b.x + b.w, 32.0);
        assert!(b.blocked.right);
    }

    #[test]
    fn walkable_tiles_do_not_block() {
        let g = grid_from(&["  G\"S*"]);
        let mut b = body_at(0.0, 0.0);
        move_and_collide(&g, &mut b, 60.0, 0.0);
        assert_eq!(b.x, 60.0);
        assert!(!b.blocked.right);
    }

    #[test]
    fn no_tunnelling_at_high_speed() {
        let g = grid_from(&["          #  "]);
        let mut b = body_at(0.0, 0.0);
        move_and_collide(&g, &mut b, 500.0, 0.0);
        assert_eq!(b.x + b.w, 160.0);
        assert!(b.blocked.right);
    }

    #[test]
    fn overlapped_cell_does_not_trap() {
        // A solid tile where the body already stands (e.g. pasted under it).
        let g = grid_from(&[
            "#  ",
            "###",
        ]);
        let mut b = body_at(4.0, 0.0);
        move_and_collide(&g, &mut b, 6.0, 0.0);
        assert_eq!(b.x, 10.0);
        assert!(!b.blocked.right);
    }

    #[test]
    fn horizontal_then_vertical() {
        // Moving diagonally into a corner: x clamps on the wall, then y on the floor.
        let g = grid_from(&[
            "  #",
            "  #",
            "###",
        ]);
        let mut b = body_at(10.0, 10.0);
        move_and_collide(&g, &mut b, 20.0, 20.0);
        assert_eq!(b.x + b.w, 32.0);
        assert_eq!(b.y + b.h, 32.0);
        assert!(b.blocked.right && b.blocked.down);
    }

    #[test]
    fn out_of_bounds_is_open_space() {
        let g = grid_from(&["  "]);
        let mut b = body_at(0.0, 0.0);
        move_and_collide(&g, &mut b, -40.0, 100.0);
        assert_eq!((b.x, b.y), (-40.0, 100.0));
        assert_eq!(b.blocked, Blocked::default());
    }
}
