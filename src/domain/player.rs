/// PlayerController: arcade-style integration + Idle/Run state machine.
///
/// Step order (fixed, once per tick):
///   1. Acceleration magnitude: ground value when `blocked.down`, air value otherwise
///   2. Sign from held intent (left wins ties); none → zero, drag takes over
///   3. Integrate velocity (accel or linear drag on x, gravity on y), clamp per axis
///   4. Jump: only when grounded → `vy = -jump_velocity`
///   5. Move through the collision resolver, refresh `blocked`
///   6. Anim = Run iff `vx != 0`; facing follows the sign of `vx`
///
/// Before the body is placed every step is a no-op.

use crate::config::PhysicsConfig;
use super::entity::{AnimState, Body, Facing, MoveIntent};
use super::grid::TileGrid;
use super::physics;
use super::tile::TileId;

/// What happened to the player this tick (for sound / presentation).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlayerEvents {
    pub jumped: bool,
    pub landed: bool,
}

#[derive(Clone, Debug)]
pub struct PlayerController {
    body: Option<Body>,
    spawn: (f32, f32),
    anim: AnimState,
    facing: Facing,
    tuning: PhysicsConfig,
}

impl PlayerController {
    /// Unplaced controller. `place()` attaches the body.
    pub fn new(spawn: (f32, f32), tuning: &PhysicsConfig) -> Self {
        PlayerController {
            body: None,
            spawn,
            anim: AnimState::Idle,
            facing: Facing::Right,
            tuning: tuning.clone(),
        }
    }

    /// Spawn position for the first `marker` cell: body centred horizontally,
    /// feet on the cell's bottom edge. `None` when the marker is absent.
    pub fn spawn_point(grid: &TileGrid, marker: TileId, tuning: &PhysicsConfig) -> Option<(f32, f32)> {
        let (col, row) = grid.find_first(marker)?;
        let ts = grid.tile_size();
        let (cx, cy) = grid.cell_to_world(col, row);
        Some((
            cx + (ts - tuning.body_width) * 0.5,
            cy + ts - tuning.body_height,
        ))
    }

    /// Attach the body at the spawn point, at rest.
    pub fn place(&mut self) {
        let (x, y) = self.spawn;
        self.body = Some(Body::new(x, y, self.tuning.body_width, self.tuning.body_height));
        self.anim = AnimState::Idle;
        self.facing = Facing::Right;
    }

    pub fn body(&self) -> Option<&Body> { self.body.as_ref() }
    pub fn anim(&self) -> AnimState { self.anim }
    pub fn facing(&self) -> Facing { self.facing }

    pub fn step(&mut self, grid: &TileGrid, intent: MoveIntent, dt: f32) -> PlayerEvents {
        let mut ev = PlayerEvents::default();
        let t = &self.tuning;
        let body = match self.body.as_mut() {
            Some(b) => b,
            None => return ev,
        };

        // 1-2. Acceleration
        let was_grounded = body.grounded();
        let accel = if was_grounded { t.ground_accel } else { t.air_accel };
        body.ax = if intent.left {
            -accel
        } else if intent.right {
            accel
        } else {
            0.0
        };

        // 3. Velocity
        if body.ax != 0.0 {
            body.vx += body.ax * dt;
        } else {
            let drag = t.drag_x * dt;
            if body.vx.abs() <= drag {
                body.vx = 0.0;
            } else {
                body.vx -= body.vx.signum() * drag;
            }
        }
        body.vy += t.gravity * dt;
        body.vx = body.vx.clamp(-t.max_vx, t.max_vx);
        body.vy = body.vy.clamp(-t.max_vy, t.max_vy);

        // 4. Jump
        if was_grounded && intent.jump {
            body.vy = -t.jump_velocity;
            ev.jumped = true;
        }

        // 5. Move + collide
        let (dx, dy) = (body.vx * dt, body.vy * dt);
        physics::move_and_collide(grid, body, dx, dy);
        ev.landed = body.grounded() && !was_grounded;

        // 6. Animation / facing
        self.anim = if body.vx != 0.0 { AnimState::Run } else { AnimState::Idle };
        if body.vx < 0.0 {
            self.facing = Facing::Left;
        } else if body.vx > 0.0 {
            self.facing = Facing::Right;
        }

        ev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::grid::tests::grid_from;

    const DT: f32 = 1.0 / 60.0;

    fn flat() -> TileGrid {
        grid_from(&[
            "                    ",
            "                    ",
            "                    ",
            "                    ",
            "  S                 ",
            "####################",
        ])
    }

    fn placed(grid: &TileGrid) -> PlayerController {
        let tuning = PhysicsConfig::default();
        let spawn = PlayerController::spawn_point(grid, 152, &tuning).unwrap();
        let mut p = PlayerController::new(spawn, &tuning);
        p.place();
        p
    }

    fn settle(p: &mut PlayerController, g: &TileGrid) {
        p.step(g, MoveIntent::default(), DT);
        assert!(p.body().unwrap().grounded());
    }

    fn held(left: bool, right: bool, jump: bool) -> MoveIntent {
        MoveIntent { left, right, jump }
    }

    #[test]
    fn spawn_sits_in_marker_cell() {
        let g = flat();
        let tuning = PhysicsConfig::default();
        let (x, y) = PlayerController::spawn_point(&g, 152, &tuning).unwrap();
        assert_eq!((x, y), (34.0, 64.0));
    }

    #[test]
    fn missing_marker_has_no_spawn() {
        let g = grid_from(&["   ", "###"]);
        assert!(PlayerController::spawn_point(&g, 152, &PhysicsConfig::default()).is_none());
    }

    #[test]
    fn unplaced_step_is_noop() {
        let g = flat();
        let mut p = PlayerController::new((0.0, 0.0), &PhysicsConfig::default());
        let ev = p.step(&g, held(false, true, true), DT);
        assert_eq!(ev, PlayerEvents::default());
        assert!(p.body().is_none());
        assert_eq!(p.anim(), AnimState::Idle);
    }

    #[test]
    fn ground_traction_beats_air_control() {
        let g = flat();
        let mut ground = placed(&g);
        settle(&mut ground, &g);
        ground.step(&g, held(false, true, false), DT);

        let mut air = placed(&g);
        air.step(&g, held(false, true, false), DT); // first tick: not yet grounded

        let vg = ground.body().unwrap().vx;
        let va = air.body().unwrap().vx;
        assert!((vg - 600.0 * DT).abs() < 1e-4);
        assert!((va - 200.0 * DT).abs() < 1e-4);
    }

    #[test]
    fn horizontal_speed_is_clamped() {
        let g = flat();
        let mut p = placed(&g);
        for i in 0..600 {
            let intent = if i < 300 { held(false, true, false) } else { held(true, false, false) };
            p.step(&g, intent, DT);
            assert!(p.body().unwrap().vx.abs() <= 200.0);
        }
    }

    #[test]
    fn drag_brings_body_to_rest() {
        let g = flat();
        let mut p = placed(&g);
        settle(&mut p, &g);
        for _ in 0..10 {
            p.step(&g, held(true, false, false), DT);
        }
        assert_eq!(p.anim(), AnimState::Run);
        assert_eq!(p.facing(), Facing::Left);
        for _ in 0..30 {
            p.step(&g, MoveIntent::default(), DT);
        }
        assert_eq!(p.body().unwrap().vx, 0.0);
        assert_eq!(p.anim(), AnimState::Idle);
        assert_eq!(p.facing(), Facing::Left, "facing held over at rest");
    }

    #[test]
    fn grounded_jump_sets_upward_velocity() {
        let g = flat();
        let mut p = placed(&g);
        settle(&mut p, &g);
        let ev = p.step(&g, held(false, false, true), DT);
        assert!(ev.jumped);
        let b = p.body().unwrap();
        assert_eq!(b.vy, -500.0);
        assert!(!b.grounded());
    }

    #[test]
    fn airborne_jump_never_changes_vy() {
        let g = flat();
        let mut a = placed(&g);
        settle(&mut a, &g);
        a.step(&g, held(false, false, true), DT);
        let mut b = a.clone();

        for _ in 0..5 {
            let ea = a.step(&g, held(false, false, true), DT);
            b.step(&g, MoveIntent::default(), DT);
            assert!(!ea.jumped);
            assert_eq!(a.body().unwrap().vy, b.body().unwrap().vy);
        }
    }

    #[test]
    fn jump_lands_again() {
        let g = flat();
        let mut p = placed(&g);
        settle(&mut p, &g);
        p.step(&g, held(false, false, true), DT);
        let mut landed = false;
        for _ in 0..120 {
            if p.step(&g, MoveIntent::default(), DT).landed {
                landed = true;
                break;
            }
        }
        assert!(landed);
        assert_eq!(p.body().unwrap().y, 64.0);
    }

    #[test]
    fn running_into_wall_goes_idle() {
        let g = grid_from(&[
            "      ",
            " S  # ",
            "######",
        ]);
        let mut p = placed(&g);
        for _ in 0..60 {
            p.step(&g, held(false, true, false), DT);
        }
        let b = p.body().unwrap();
        assert_eq!(b.x + b.w, 64.0);
        assert!(b.blocked.right);
        assert_eq!(p.anim(), AnimState::Idle);
        assert_eq!(p.facing(), Facing::Right);
    }
}
