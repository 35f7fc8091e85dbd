/// Keyboard + mouse input tracker.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement / jump while a key is held
///   - Edge-triggered edit actions (fire once per press)
///   - Mouse pointer position and left-button clicks in terminal cells
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,

    /// Ctrl-chords whose key went from "not held" to "held" during the last drain.
    fresh_chords: Vec<KeyCode>,

    /// Last known pointer position as a terminal cell `(column, row)`.
    pointer: Option<(u16, u16)>,

    /// Left-button presses seen during the last drain.
    clicks: usize,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            fresh_chords: Vec::with_capacity(4),
            pointer: None,
            clicks: 0,
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key / pointer state.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.fresh_chords.clear();
        self.clicks = 0;

        while poll(Duration::ZERO).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) => self.on_key(key),
                Ok(Event::Mouse(m)) => self.on_mouse(m),
                _ => {}
            }
        }

        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn on_key(&mut self, key: KeyEvent) {
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            KeyEventKind::Release => {
                // rely on timeout-based expiry instead
            }
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, Instant::now());
                if !was_held {
                    self.fresh_presses.push(key.code);
                    if key.kind == KeyEventKind::Press
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        self.fresh_chords.push(key.code);
                    }
                }
            }
        }
    }

    fn on_mouse(&mut self, m: MouseEvent) {
        match m.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.pointer = Some((m.column, m.row));
            }
            MouseEventKind::Down(MouseButton::Left) => {
                self.pointer = Some((m.column, m.row));
                self.clicks += 1;
            }
            _ => {}
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active.get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Ctrl+<ch> freshly pressed this frame (either case). Held chords
    /// and auto-repeats do not fire again until the key is released.
    pub fn ctrl_pressed(&self, ch: char) -> bool {
        self.fresh_chords.iter()
            .any(|code| matches!(code, KeyCode::Char(c) if c.eq_ignore_ascii_case(&ch)))
    }

    pub fn pointer(&self) -> Option<(u16, u16)> {
        self.pointer
    }

    pub fn clicked(&self) -> bool {
        self.clicks > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE }
    }

    #[test]
    fn first_press_is_fresh_repeat_is_not() {
        let mut kb = InputState::new();
        kb.on_key(press(KeyCode::Char('v'), KeyModifiers::NONE));
        assert!(kb.was_pressed(KeyCode::Char('v')));
        assert!(kb.is_held(KeyCode::Char('v')));

        kb.fresh_presses.clear();
        kb.on_key(press(KeyCode::Char('v'), KeyModifiers::NONE));
        assert!(!kb.was_pressed(KeyCode::Char('v')));
    }

    #[test]
    fn ctrl_chords_are_detected() {
        let mut kb = InputState::new();
        kb.on_key(press(KeyCode::Char('C'), KeyModifiers::CONTROL | KeyModifiers::SHIFT));
        assert!(kb.ctrl_pressed('c'));
        assert!(!kb.ctrl_pressed('v'));

        let mut kb = InputState::new();
        kb.on_key(press(KeyCode::Char('v'), KeyModifiers::NONE));
        assert!(!kb.ctrl_pressed('v'));
    }

    #[test]
    fn held_ctrl_chord_fires_once() {
        let mut kb = InputState::new();
        kb.on_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(kb.ctrl_pressed('c'));

        // Next frame: the terminal repeats the held chord.
        kb.fresh_chords.clear();
        kb.fresh_presses.clear();
        let mut repeat = press(KeyCode::Char('c'), KeyModifiers::CONTROL);
        repeat.kind = KeyEventKind::Repeat;
        kb.on_key(repeat);
        assert!(!kb.ctrl_pressed('c'));

        // Terminals without release events resend Press while held.
        kb.fresh_chords.clear();
        kb.on_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!kb.ctrl_pressed('c'));
        assert!(!kb.was_pressed(KeyCode::Char('c')));
    }

    #[test]
    fn ctrl_chord_fires_again_after_release() {
        let mut kb = InputState::new();
        kb.honor_release = true;
        let chord = press(KeyCode::Char('v'), KeyModifiers::CONTROL);
        kb.on_key(chord);
        let mut release = chord;
        release.kind = KeyEventKind::Release;
        kb.on_key(release);

        kb.fresh_chords.clear();
        kb.on_key(chord);
        assert!(kb.ctrl_pressed('v'));
    }

    #[test]
    fn release_honored_only_when_enabled() {
        let mut kb = InputState::new();
        kb.on_key(press(KeyCode::Left, KeyModifiers::NONE));
        let mut release = press(KeyCode::Left, KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        kb.on_key(release);
        assert!(kb.is_held(KeyCode::Left));

        kb.honor_release = true;
        kb.on_key(release);
        assert!(!kb.is_held(KeyCode::Left));
    }

    #[test]
    fn mouse_tracks_pointer_and_clicks() {
        let mut kb = InputState::new();
        assert_eq!(kb.pointer(), None);
        kb.on_mouse(mouse(MouseEventKind::Moved, 10, 4));
        assert_eq!(kb.pointer(), Some((10, 4)));
        assert!(!kb.clicked());
        kb.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 12, 5));
        assert_eq!(kb.pointer(), Some((12, 5)));
        assert!(kb.clicked());
        kb.on_mouse(mouse(MouseEventKind::Down(MouseButton::Right), 1, 1));
        assert_eq!(kb.pointer(), Some((12, 5)));
    }
}
