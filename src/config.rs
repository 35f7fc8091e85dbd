/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory, the CWD, or
/// `~/.local/share/ctrlv` (first hit wins).
/// Falls back to the shipped tuning if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::domain::tile::TileId;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub tick_rate_ms: u64,
    pub levels_dir: PathBuf,
    pub physics: PhysicsConfig,
    pub tiles: TileConfig,
    pub gamepad: GamepadConfig,
}

/// Player / world tuning in world units (pixels) and seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub tile_size: f32,
    pub gravity: f32,
    pub ground_accel: f32,   // harder traction on the ground
    pub air_accel: f32,      // looser control in the air
    pub drag_x: f32,
    pub max_vx: f32,
    pub max_vy: f32,
    pub jump_velocity: f32,
    pub body_width: f32,
    pub body_height: f32,
}

/// Collidability rule table and the special tile ids.
#[derive(Clone, Debug, PartialEq)]
pub struct TileConfig {
    pub collidable_min: TileId,
    pub collidable_max: TileId,
    /// Ids inside the range that must still be walkable.
    pub walkable: Vec<TileId>,
    pub spawn: TileId,
    pub goal: TileId,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub jump: Vec<String>,
    pub copy: Vec<String>,
    pub paste: Vec<String>,
    pub click: Vec<String>,
    pub restart: Vec<String>,
    pub quit: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    physics: TomlPhysics,
    #[serde(default)]
    tiles: TomlTiles,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

#[derive(Deserialize, Debug)]
struct TomlPhysics {
    #[serde(default = "default_tile_size")]
    tile_size: f32,
    #[serde(default = "default_gravity")]
    gravity: f32,
    #[serde(default = "default_ground_accel")]
    ground_accel: f32,
    #[serde(default = "default_air_accel")]
    air_accel: f32,
    #[serde(default = "default_drag_x")]
    drag_x: f32,
    #[serde(default = "default_max_vx")]
    max_vx: f32,
    #[serde(default = "default_max_vy")]
    max_vy: f32,
    #[serde(default = "default_jump_velocity")]
    jump_velocity: f32,
    #[serde(default = "default_body_width")]
    body_width: f32,
    #[serde(default = "default_body_height")]
    body_height: f32,
}

#[derive(Deserialize, Debug)]
struct TomlTiles {
    #[serde(default = "default_collidable_min")]
    collidable_min: TileId,
    #[serde(default = "default_collidable_max")]
    collidable_max: TileId,
    #[serde(default = "default_walkable")]
    walkable: Vec<TileId>,
    #[serde(default = "default_spawn")]
    spawn: TileId,
    #[serde(default = "default_goal")]
    goal: TileId,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_pad_jump")]
    jump: Vec<String>,
    #[serde(default = "default_pad_copy")]
    copy: Vec<String>,
    #[serde(default = "default_pad_paste")]
    paste: Vec<String>,
    #[serde(default = "default_pad_click")]
    click: Vec<String>,
    #[serde(default = "default_pad_restart")]
    restart: Vec<String>,
    #[serde(default = "default_pad_quit")]
    quit: Vec<String>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }    // ~60 Hz
fn default_levels_dir() -> String { "levels".into() }

fn default_tile_size() -> f32 { 16.0 }
fn default_gravity() -> f32 { 1800.0 }
fn default_ground_accel() -> f32 { 600.0 }
fn default_air_accel() -> f32 { 200.0 }
fn default_drag_x() -> f32 { 2000.0 }
fn default_max_vx() -> f32 { 200.0 }
fn default_max_vy() -> f32 { 500.0 }
fn default_jump_velocity() -> f32 { 500.0 }
fn default_body_width() -> f32 { 12.0 }
fn default_body_height() -> f32 { 16.0 }

fn default_collidable_min() -> TileId { 0 }
fn default_collidable_max() -> TileId { 200 }
fn default_walkable() -> Vec<TileId> { vec![92, 94, 140, 152] }
fn default_spawn() -> TileId { 152 }
fn default_goal() -> TileId { 140 }

fn default_pad_jump() -> Vec<String> { vec!["A".into()] }
fn default_pad_copy() -> Vec<String> { vec!["X".into(), "L1".into()] }
fn default_pad_paste() -> Vec<String> { vec!["Y".into(), "R1".into()] }
fn default_pad_click() -> Vec<String> { vec!["B".into()] }
fn default_pad_restart() -> Vec<String> { vec!["Start".into()] }
fn default_pad_quit() -> Vec<String> { vec!["Select".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            tick_rate_ms: default_tick_rate(),
            levels_dir: default_levels_dir(),
        }
    }
}

impl Default for TomlPhysics {
    fn default() -> Self {
        TomlPhysics {
            tile_size: default_tile_size(),
            gravity: default_gravity(),
            ground_accel: default_ground_accel(),
            air_accel: default_air_accel(),
            drag_x: default_drag_x(),
            max_vx: default_max_vx(),
            max_vy: default_max_vy(),
            jump_velocity: default_jump_velocity(),
            body_width: default_body_width(),
            body_height: default_body_height(),
        }
    }
}

impl Default for TomlTiles {
    fn default() -> Self {
        TomlTiles {
            collidable_min: default_collidable_min(),
            collidable_max: default_collidable_max(),
            walkable: default_walkable(),
            spawn: default_spawn(),
            goal: default_goal(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            jump: default_pad_jump(),
            copy: default_pad_copy(),
            paste: default_pad_paste(),
            click: default_pad_click(),
            restart: default_pad_restart(),
            quit: default_pad_quit(),
        }
    }
}

impl From<TomlPhysics> for PhysicsConfig {
    fn from(t: TomlPhysics) -> Self {
        PhysicsConfig {
            tile_size: t.tile_size,
            gravity: t.gravity,
            ground_accel: t.ground_accel,
            air_accel: t.air_accel,
            drag_x: t.drag_x,
            max_vx: t.max_vx,
            max_vy: t.max_vy,
            jump_velocity: t.jump_velocity,
            body_width: t.body_width,
            body_height: t.body_height,
        }
    }
}

impl From<TomlTiles> for TileConfig {
    fn from(t: TomlTiles) -> Self {
        TileConfig {
            collidable_min: t.collidable_min,
            collidable_max: t.collidable_max,
            walkable: t.walkable,
            spawn: t.spawn,
            goal: t.goal,
        }
    }
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        TomlPhysics::default().into()
    }
}

impl Default for TileConfig {
    fn default() -> Self {
        TomlTiles::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no filesystem search for the file itself).
    #[cfg(test)]
    fn from_str(text: &str) -> Result<Self, toml::de::Error> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory against the candidate dirs
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        let mut physics: PhysicsConfig = toml_cfg.physics.into();
        if !(physics.tile_size > 0.0 && physics.tile_size.is_finite()) {
            warn!(tile_size = physics.tile_size, "tile_size must be positive, using default");
            physics.tile_size = default_tile_size();
        }
        if !(physics.body_width > 0.0) || physics.body_width > physics.tile_size {
            warn!(body_width = physics.body_width, "body must fit one tile column, clamping");
            physics.body_width = physics.tile_size;
        }
        if !(physics.body_height > 0.0 && physics.body_height.is_finite()) {
            warn!(body_height = physics.body_height, "body_height must be positive, using default");
            physics.body_height = default_body_height();
        }
        // Velocity caps feed `f32::clamp`, which panics on a negative or NaN bound.
        repair_non_negative("max_vx", &mut physics.max_vx, default_max_vx());
        repair_non_negative("max_vy", &mut physics.max_vy, default_max_vy());
        repair_non_negative("gravity", &mut physics.gravity, default_gravity());
        repair_non_negative("jump_velocity", &mut physics.jump_velocity, default_jump_velocity());
        repair_non_negative("ground_accel", &mut physics.ground_accel, default_ground_accel());
        repair_non_negative("air_accel", &mut physics.air_accel, default_air_accel());
        repair_non_negative("drag_x", &mut physics.drag_x, default_drag_x());

        GameConfig {
            tick_rate_ms: toml_cfg.general.tick_rate_ms.max(1),
            levels_dir,
            physics,
            tiles: toml_cfg.tiles.into(),
            gamepad: GamepadConfig {
                jump: toml_cfg.gamepad.jump,
                copy: toml_cfg.gamepad.copy,
                paste: toml_cfg.gamepad.paste,
                click: toml_cfg.gamepad.click,
                restart: toml_cfg.gamepad.restart,
                quit: toml_cfg.gamepad.quit,
            },
        }
    }

    /// Shipped tuning without touching the filesystem.
    pub fn defaults() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }

    /// Simulation step length in seconds.
    pub fn dt(&self) -> f32 {
        self.tick_rate_ms as f32 / 1000.0
    }
}

/// Reset a tuning value that must be a finite, non-negative number.
fn repair_non_negative(name: &str, value: &mut f32, default: f32) {
    if !(*value >= 0.0 && value.is_finite()) {
        warn!(key = name, value = *value, "must be a non-negative number, using default");
        *value = default;
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/ctrlv)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ctrlv");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() { continue; }
        match std::fs::read_to_string(&path) {
            Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                Ok(cfg) => {
                    info!(path = %path.display(), "config_loaded");
                    return cfg;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config parse error, using defaults");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config");
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_shipped_tuning() {
        let cfg = GameConfig::from_str("").unwrap();
        assert_eq!(cfg.tick_rate_ms, 16);
        assert_eq!(cfg.physics, PhysicsConfig::default());
        assert_eq!(cfg.physics.ground_accel, 600.0);
        assert_eq!(cfg.physics.air_accel, 200.0);
        assert_eq!(cfg.tiles.walkable, vec![92, 94, 140, 152]);
        assert_eq!(cfg.tiles.goal, 140);
        assert_eq!(cfg.tiles.spawn, 152);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_str(
            "[physics]\ngravity = 900.0\n[tiles]\nwalkable = [7]\n",
        ).unwrap();
        assert_eq!(cfg.physics.gravity, 900.0);
        assert_eq!(cfg.physics.max_vx, 200.0);
        assert_eq!(cfg.tiles.walkable, vec![7]);
        assert_eq!(cfg.tiles.collidable_max, 200);
    }

    #[test]
    fn invalid_values_are_repaired() {
        let cfg = GameConfig::from_str(
            "[general]\ntick_rate_ms = 0\n[physics]\ntile_size = -4.0\nbody_width = 40.0\n",
        ).unwrap();
        assert_eq!(cfg.tick_rate_ms, 1);
        assert_eq!(cfg.physics.tile_size, 16.0);
        assert_eq!(cfg.physics.body_width, 16.0);
    }

    #[test]
    fn negative_or_nan_tuning_falls_back_to_defaults() {
        let cfg = GameConfig::from_str(
            "[physics]\nmax_vx = -5.0\nmax_vy = nan\ngravity = -1.0\njump_velocity = inf\n\
             ground_accel = -600.0\nair_accel = nan\ndrag_x = -1.0\nbody_height = 0.0\n",
        ).unwrap();
        assert_eq!(cfg.physics, PhysicsConfig::default());
    }

    #[test]
    fn repaired_speed_caps_let_the_player_step() {
        use crate::domain::entity::MoveIntent;
        use crate::domain::grid::tests::grid_from;
        use crate::domain::player::PlayerController;

        let cfg = GameConfig::from_str("[physics]\nmax_vx = -5.0\n").unwrap();
        assert_eq!(cfg.physics.max_vx, 200.0);

        let grid = grid_from(&["  S  ", "#####"]);
        let spawn = PlayerController::spawn_point(&grid, 152, &cfg.physics).unwrap();
        let mut player = PlayerController::new(spawn, &cfg.physics);
        player.place();
        let intent = MoveIntent { left: false, right: true, jump: false };
        player.step(&grid, intent, cfg.dt());
        assert!(player.body().unwrap().vx > 0.0);
    }

    #[test]
    fn zero_speed_caps_are_kept() {
        let cfg = GameConfig::from_str("[physics]\nmax_vx = 0.0\ngravity = 0.0\n").unwrap();
        assert_eq!(cfg.physics.max_vx, 0.0);
        assert_eq!(cfg.physics.gravity, 0.0);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(GameConfig::from_str("[physics\n").is_err());
    }

    #[test]
    fn dt_tracks_tick_rate() {
        let cfg = GameConfig::from_str("[general]\ntick_rate_ms = 20\n").unwrap();
        assert!((cfg.dt() - 0.02).abs() < 1e-6);
    }
}
