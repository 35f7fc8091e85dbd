/// Player body, animation state and per-tick input intents.
///
/// Movement intents are HELD state (true while the key is down).
/// Edit intents are EDGES (true only on the tick after a fresh press),
/// collected between ticks and consumed exactly once by the step.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Derived each step from horizontal velocity. No hidden sub-states.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AnimState {
    Idle,
    Run,
}

/// Contact record, recomputed every physics step.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Blocked {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Axis-aligned rectangle with arcade-style motion state.
/// `(x, y)` is the top-left corner in world units.
#[derive(Clone, Debug)]
pub struct Body {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub vx: f32,
    pub vy: f32,
    pub ax: f32,
    pub blocked: Blocked,
}

impl Body {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Body {
            x, y, w, h,
            vx: 0.0,
            vy: 0.0,
            ax: 0.0,
            blocked: Blocked::default(),
        }
    }

    #[inline]
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    #[inline]
    pub fn grounded(&self) -> bool {
        self.blocked.down
    }
}

/// Held movement intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

/// Edge-triggered edit intents for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditIntent {
    pub select: bool,
    pub copy: bool,
    pub begin_paste: bool,
    pub commit_paste: bool,
}

impl EditIntent {
    /// Fold another batch of edges into this one (presses between ticks).
    pub fn merge(&mut self, other: EditIntent) {
        self.select |= other.select;
        self.copy |= other.copy;
        self.begin_paste |= other.begin_paste;
        self.commit_paste |= other.commit_paste;
    }

    pub fn any(&self) -> bool {
        self.select || self.copy || self.begin_paste || self.commit_paste
    }
}

/// Everything the simulation reads in one tick.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: MoveIntent,
    pub edit: EditIntent,
    /// Pointer position in world units, if a pointer is present.
    pub pointer: Option<(f32, f32)>,
    pub restart: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_every_edge() {
        let mut a = EditIntent { copy: true, ..Default::default() };
        a.merge(EditIntent { commit_paste: true, ..Default::default() });
        assert!(a.copy && a.commit_paste);
        assert!(!a.select && !a.begin_paste);
        assert!(a.any());
        assert!(!EditIntent::default().any());
    }

    #[test]
    fn body_center() {
        let b = Body::new(2.0, 0.0, 12.0, 16.0);
        assert_eq!(b.center(), (8.0, 8.0));
        assert!(!b.grounded());
    }
}
