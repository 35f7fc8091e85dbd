/// Camera: a viewport into the level, in grid cells.
///
/// `(x, y)` is the cell shown in the top-left corner of the map area.
/// Either can be negative when the level is smaller than the viewport,
/// which centres it. The renderer sets `view_w` / `view_h` from the
/// terminal size every frame, then maps:
///
///   view(vx, vy) = cell(camera.x + vx, camera.y + vy)
///
/// Mouse picking runs the same mapping backwards via `view_to_world`.

use crate::domain::grid::Cell;

#[derive(Clone, Debug, Default)]
pub struct Camera {
    pub x: i32,
    pub y: i32,
    pub view_w: usize,
    pub view_h: usize,
}

/// Centre offset for an axis the level fits inside.
fn centred(view: usize, world: usize) -> i32 {
    -((view as i32 - world as i32) / 2)
}

fn clamp_axis(pos: i32, view: usize, world: usize) -> i32 {
    pos.max(0).min((world as i32 - view as i32).max(0))
}

/// Dead-zone scroll on one axis: the inner 60% of the view is free.
fn follow_axis(pos: i32, target: i32, view: usize, world: usize) -> i32 {
    if world <= view {
        return centred(view, world);
    }
    let margin = view as i32 / 5;
    let low = pos + margin;
    let high = pos + view as i32 - margin - 1;
    let moved = if target < low {
        target - margin
    } else if target > high {
        target - view as i32 + margin + 1
    } else {
        pos
    };
    clamp_axis(moved, view, world)
}

impl Camera {
    pub fn new() -> Self {
        Camera::default()
    }

    fn ready(&self) -> bool {
        self.view_w > 0 && self.view_h > 0
    }

    /// Scroll only when the target nears the viewport edge.
    pub fn follow(&mut self, target: Cell, world_w: usize, world_h: usize) {
        if !self.ready() { return; }
        self.x = follow_axis(self.x, target.0, self.view_w, world_w);
        self.y = follow_axis(self.y, target.1, self.view_h, world_h);
    }

    /// Snap so the target is centred. Used on level start and restart.
    pub fn center_on(&mut self, target: Cell, world_w: usize, world_h: usize) {
        if !self.ready() { return; }
        self.x = if world_w <= self.view_w {
            centred(self.view_w, world_w)
        } else {
            clamp_axis(target.0 - self.view_w as i32 / 2, self.view_w, world_w)
        };
        self.y = if world_h <= self.view_h {
            centred(self.view_h, world_h)
        } else {
            clamp_axis(target.1 - self.view_h as i32 / 2, self.view_h, world_h)
        };
    }

    /// Cell to viewport position, or None when off screen.
    pub fn world_to_view(&self, cell: Cell) -> Option<(usize, usize)> {
        let vx = cell.0 - self.x;
        let vy = cell.1 - self.y;
        if vx >= 0 && vx < self.view_w as i32 && vy >= 0 && vy < self.view_h as i32 {
            Some((vx as usize, vy as usize))
        } else {
            None
        }
    }

    /// Viewport position to cell. May land outside the level.
    pub fn view_to_world(&self, vx: usize, vy: usize) -> Cell {
        (self.x + vx as i32, self.y + vy as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cam(w: usize, h: usize) -> Camera {
        Camera { view_w: w, view_h: h, ..Camera::default() }
    }

    #[test]
    fn small_levels_are_centred() {
        let mut c = cam(40, 20);
        c.center_on((3, 3), 20, 10);
        assert_eq!((c.x, c.y), (-10, -5));
        assert_eq!(c.world_to_view((0, 0)), Some((10, 5)));
        assert_eq!(c.view_to_world(10, 5), (0, 0));
    }

    #[test]
    fn center_on_clamps_to_level_edges() {
        let mut c = cam(20, 10);
        c.center_on((0, 0), 64, 36);
        assert_eq!((c.x, c.y), (0, 0));
        c.center_on((63, 35), 64, 36);
        assert_eq!((c.x, c.y), (44, 26));
    }

    #[test]
    fn follow_holds_still_inside_dead_zone() {
        let mut c = cam(20, 10);
        c.center_on((30, 18), 64, 36);
        let before = (c.x, c.y);
        c.follow((31, 18), 64, 36);
        assert_eq!((c.x, c.y), before);

        // Right edge of the dead zone is x + 20 - 4 - 1.
        c.follow((before.0 + 16, 18), 64, 36);
        assert_eq!(c.x, before.0 + 1);
    }

    #[test]
    fn unsized_camera_does_nothing() {
        let mut c = Camera::new();
        c.follow((10, 10), 64, 36);
        assert_eq!((c.x, c.y), (0, 0));
        assert_eq!(c.world_to_view((0, 0)), None);
    }
}
