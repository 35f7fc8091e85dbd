/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod sim;
mod ui;

use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::KeyCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use domain::entity::{EditIntent, FrameInput, MoveIntent};
use domain::grid::Cell;
use sim::event::GameEvent;
use sim::game::{Game, Phase};
use sim::level::LevelPack;
use sim::profile::{data_dir, Profile};
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);
/// Right-stick cursor repeat interval.
const AIM_REPEAT: Duration = Duration::from_millis(120);

fn main() -> anyhow::Result<()> {
    if let Err(e) = init_tracing() {
        eprintln!("Logging disabled: {e:#}");
    }

    let config = GameConfig::load();
    let pack = LevelPack::load(&config.levels_dir);
    let profile = Profile::load();
    let mut game = Game::new(config.clone(), pack, profile)
        .context("failed to start the first level")?;

    let mut renderer = Renderer::new();
    let honor_release = renderer.init().context("terminal init failed")?;

    let sound = SoundEngine::new();

    let result = game_loop(&mut game, &mut renderer, sound.as_ref(), &config, honor_release);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for playing Ctrl+V!");
    println!("Levels cleared: {}/{}", game.profile().cleared.len(), game.level_count());
    Ok(())
}

/// The renderer owns the terminal, so logs go to `ctrlv.log` in the data dir.
fn init_tracing() -> anyhow::Result<()> {
    let path = data_dir().join("ctrlv.log");
    let file = std::fs::File::create(&path)
        .with_context(|| format!("cannot create {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .compact()
        .init();
    Ok(())
}

fn game_loop(
    game: &mut Game,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    honor_release: bool,
) -> anyhow::Result<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.tick_rate_ms);

    let mut cursor = Cursor::default();
    let mut pending_edit = EditIntent::default();
    let mut pending_restart = false;

    info!(levels = game.level_count(), start = game.session().level(), "game_started");

    loop {
        kb.drain_events();
        gp.update();

        if kb.any_pressed(KEYS_QUIT) || gp.quit_pressed() {
            break;
        }

        if game.phase() == Phase::Won {
            if kb.any_pressed(&[KeyCode::Enter]) || gp.click_pressed() {
                game.new_game().context("failed to restart the game")?;
                cursor = Cursor::default();
            }
        } else {
            cursor.update(game, renderer, &kb, &gp);
            pending_edit.merge(detect_edit(&kb, &gp));
            pending_restart |= kb.any_pressed(KEYS_RESTART) || gp.restart_pressed();
        }

        if last_tick.elapsed() >= tick_rate {
            let input = FrameInput {
                movement: detect_movement(&kb, &gp),
                edit: std::mem::take(&mut pending_edit),
                pointer: cursor.world_pos(game),
                restart: std::mem::take(&mut pending_restart),
            };
            let events = game.tick(input).context("failed to load the next level")?;
            if let Some(sfx) = sound {
                sfx.play_events(&events);
            }
            if events.iter().any(|e| matches!(e, GameEvent::LevelComplete { .. })) {
                if let Err(e) = game.profile().save() {
                    warn!(error = %e, "profile_save_failed");
                }
            }
            last_tick = Instant::now();
        }

        renderer.render(game)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_JUMP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char(' ')];
const KEYS_COPY: &[KeyCode] = &[KeyCode::Char('c'), KeyCode::Char('C')];
const KEYS_PASTE: &[KeyCode] = &[KeyCode::Char('v'), KeyCode::Char('V')];
const KEYS_CLICK: &[KeyCode] = &[KeyCode::Enter];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('f'), KeyCode::Char('F'), KeyCode::F(2)];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_CURSOR: &[(KeyCode, (i32, i32))] = &[
    (KeyCode::Char('i'), (0, -1)),
    (KeyCode::Char('k'), (0, 1)),
    (KeyCode::Char('j'), (-1, 0)),
    (KeyCode::Char('l'), (1, 0)),
];

fn detect_movement(kb: &InputState, gp: &GamepadState) -> MoveIntent {
    MoveIntent {
        left: kb.any_held(KEYS_LEFT) || kb.any_pressed(KEYS_LEFT) || gp.left_held(),
        right: kb.any_held(KEYS_RIGHT) || kb.any_pressed(KEYS_RIGHT) || gp.right_held(),
        jump: kb.any_held(KEYS_JUMP) || kb.any_pressed(KEYS_JUMP) || gp.jump_held(),
    }
}

/// A click both selects the hovered tile and commits a pending paste.
fn detect_edit(kb: &InputState, gp: &GamepadState) -> EditIntent {
    let click = kb.clicked() || kb.any_pressed(KEYS_CLICK) || gp.click_pressed();
    EditIntent {
        select: click,
        copy: kb.ctrl_pressed('c') || kb.any_pressed(KEYS_COPY) || gp.copy_pressed(),
        begin_paste: kb.ctrl_pressed('v') || kb.any_pressed(KEYS_PASTE) || gp.paste_pressed(),
        commit_paste: click,
    }
}

/// The edit cursor, in grid cells. Driven by the mouse, IJKL and the right stick.
#[derive(Default)]
struct Cursor {
    cell: Option<Cell>,
    last_mouse: Option<(u16, u16)>,
    last_aim: Option<Instant>,
    level: usize,
}

impl Cursor {
    fn update(&mut self, game: &Game, renderer: &Renderer, kb: &InputState, gp: &GamepadState) {
        let s = game.session();
        if s.level() != self.level {
            self.level = s.level();
            self.cell = None;
        }

        let mouse = kb.pointer();
        if mouse != self.last_mouse || kb.clicked() {
            self.last_mouse = mouse;
            if let Some((col, row)) = mouse {
                self.cell = renderer.pick(col, row);
            }
        }

        let mut nudge = KEYS_CURSOR.iter()
            .filter(|(key, _)| kb.was_pressed(*key))
            .fold((0, 0), |acc, (_, d)| (acc.0 + d.0, acc.1 + d.1));
        let aim = gp.aim();
        let aim_ready = self.last_aim.map_or(true, |t| t.elapsed() >= AIM_REPEAT);
        if aim != (0, 0) && aim_ready {
            self.last_aim = Some(Instant::now());
            nudge = (nudge.0 + aim.0, nudge.1 + aim.1);
        }
        if nudge == (0, 0) {
            return;
        }

        let origin = self.cell.or_else(|| {
            s.body().map(|b| {
                let (cx, cy) = b.center();
                s.grid().world_to_cell(cx, cy)
            })
        });
        if let Some((c, r)) = origin {
            let grid = s.grid();
            let c = (c + nudge.0).clamp(0, grid.width() as i32 - 1);
            let r = (r + nudge.1).clamp(0, grid.height() as i32 - 1);
            self.cell = Some((c, r));
        }
    }

    /// Centre of the cursor cell in world units.
    fn world_pos(&self, game: &Game) -> Option<(f32, f32)> {
        let grid = game.session().grid();
        self.cell.map(|(c, r)| {
            let (x, y) = grid.cell_to_world(c, r);
            let half = grid.tile_size() / 2.0;
            (x + half, y + half)
        })
    }
}
