/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Move left / right, up = jump
///   A                     →  Jump
///   X / L1                →  Copy
///   Y / R1                →  Paste
///   B                     →  Click at the cursor
///   Start                 →  Restart
///   Select                →  Quit
///
/// The right stick nudges the on-screen cursor.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    L2,
    R2,
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "L2" | "LT" => Some(Btn::L2),
            "R2" | "RT" => Some(Btn::R2),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::LeftTrigger2 => Some(Btn::L2),
            Button::RightTrigger2 => Some(Btn::R2),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping.
#[derive(Debug)]
struct ActionMap {
    jump: Vec<Btn>,
    copy: Vec<Btn>,
    paste: Vec<Btn>,
    click: Vec<Btn>,
    restart: Vec<Btn>,
    quit: Vec<Btn>,
}

impl ActionMap {
    /// Unknown names are dropped; an action left with no buttons keeps `fallback`.
    fn from_config(cfg: &GamepadConfig, fallback: ActionMap) -> Self {
        fn parse_or(names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let parsed: Vec<Btn> = names.iter().filter_map(|s| Btn::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        ActionMap {
            jump: parse_or(&cfg.jump, fallback.jump),
            copy: parse_or(&cfg.copy, fallback.copy),
            paste: parse_or(&cfg.paste, fallback.paste),
            click: parse_or(&cfg.click, fallback.click),
            restart: parse_or(&cfg.restart, fallback.restart),
            quit: parse_or(&cfg.quit, fallback.quit),
        }
    }
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:    vec![Btn::A],
            copy:    vec![Btn::X, Btn::L1],
            paste:   vec![Btn::Y, Btn::R1],
            click:   vec![Btn::B],
            restart: vec![Btn::Start],
            quit:    vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 10],

    dpad_up: BtnState,
    dpad_left: BtnState,
    dpad_right: BtnState,

    // Left stick (movement)
    stick_x: f32,
    stick_y: f32,
    // Right stick (cursor)
    aim_x: f32,
    aim_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

fn btn_index(btn: Btn) -> usize {
    btn as usize
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); 10],
            dpad_up: BtnState::default(),
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            aim_x: 0.0,
            aim_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        let current = std::mem::take(&mut self.action_map);
        self.action_map = ActionMap::from_config(cfg, current);
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        Axis::RightStickX => self.aim_x = value,
                        Axis::RightStickY => self.aim_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let state = match gilrs_btn {
            Button::DPadUp => &mut self.dpad_up,
            Button::DPadLeft => &mut self.dpad_left,
            Button::DPadRight => &mut self.dpad_right,
            other => match Btn::from_gilrs(other) {
                Some(btn) => &mut self.buttons[btn_index(btn)],
                None => return,
            },
        };
        state.held = held;
        if held {
            state.just_pressed = true;
        }
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].just_pressed)
    }

    fn any_held(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[btn_index(b)].held)
    }

    pub fn copy_pressed(&self) -> bool { self.any_just_pressed(&self.action_map.copy) }
    pub fn paste_pressed(&self) -> bool { self.any_just_pressed(&self.action_map.paste) }
    pub fn click_pressed(&self) -> bool { self.any_just_pressed(&self.action_map.click) }
    pub fn restart_pressed(&self) -> bool { self.any_just_pressed(&self.action_map.restart) }
    pub fn quit_pressed(&self) -> bool { self.any_just_pressed(&self.action_map.quit) }

    // Movement (continuous, held)
    pub fn jump_held(&self) -> bool {
        self.any_held(&self.action_map.jump) || self.dpad_up.held || self.stick_y > STICK_DEADZONE
    }
    pub fn left_held(&self) -> bool {
        self.dpad_left.held || self.stick_x < -STICK_DEADZONE
    }
    pub fn right_held(&self) -> bool {
        self.dpad_right.held || self.stick_x > STICK_DEADZONE
    }

    /// Right-stick cursor nudge in cells: (-1|0|1, -1|0|1). Y is up-positive on the stick.
    pub fn aim(&self) -> (i32, i32) {
        let axis = |v: f32| if v < -STICK_DEADZONE { -1 } else if v > STICK_DEADZONE { 1 } else { 0 };
        (axis(self.aim_x), -axis(self.aim_y))
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons { b.just_pressed = false; }
        self.dpad_up.just_pressed = false;
        self.dpad_left.just_pressed = false;
        self.dpad_right.just_pressed = false;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in &mut self.buttons { *b = BtnState::default(); }
        self.dpad_up = BtnState::default();
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
        self.aim_x = 0.0;
        self.aim_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn config_overrides_and_falls_back() {
        let cfg = GamepadConfig {
            jump: names(&["B"]),
            copy: names(&["nonsense"]),
            paste: names(&["R2", "y"]),
            click: vec![],
            restart: names(&["Start"]),
            quit: names(&["Select"]),
        };
        let map = ActionMap::from_config(&cfg, ActionMap::default());
        assert_eq!(map.jump, vec![Btn::B]);
        assert_eq!(map.copy, vec![Btn::X, Btn::L1], "unknown names keep the default");
        assert_eq!(map.paste, vec![Btn::R2, Btn::Y]);
        assert_eq!(map.click, vec![Btn::B]);
    }

    #[test]
    fn idle_pad_reports_nothing() {
        let pad = GamepadState::new();
        assert!(!pad.jump_held() && !pad.left_held() && !pad.right_held());
        assert!(!pad.copy_pressed() && !pad.click_pressed());
        assert_eq!(pad.aim(), (0, 0));
    }
}
