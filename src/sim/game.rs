/// Game: progression across level sessions.
///
/// Owns the level pack, the profile and the current `LevelSession`.
/// On `NextLevel(n)` the session is replaced with a fresh one for level
/// `n`; on `GameWon` the game enters the `Won` phase and stops stepping.
/// The profile is updated in memory here; the caller persists it.

use tracing::info;

use crate::config::GameConfig;
use crate::domain::entity::FrameInput;
use crate::error::LevelError;
use super::event::GameEvent;
use super::level::{LevelPack, PackSource};
use super::profile::Profile;
use super::session::{Completion, LevelSession, SessionState};
use super::step::step;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Won,
}

/// Message bar duration in ticks (~2s at the default rate).
const MESSAGE_TICKS: u32 = 120;

pub struct Game {
    config: GameConfig,
    pack: LevelPack,
    profile: Profile,
    session: LevelSession,
    phase: Phase,
    message: String,
    message_timer: u32,
}

impl Game {
    /// Start at the profile's unlocked level.
    pub fn new(config: GameConfig, pack: LevelPack, profile: Profile) -> Result<Self, LevelError> {
        let level = profile.resume_level(pack.len());
        let session = LevelSession::new(pack.get(level)?, level, pack.len(), &config)?;
        let mut game = Game {
            config,
            pack,
            profile,
            session,
            phase: Phase::Playing,
            message: String::new(),
            message_timer: 0,
        };
        game.announce_level();
        Ok(game)
    }

    pub fn session(&self) -> &LevelSession { &self.session }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn profile(&self) -> &Profile { &self.profile }
    pub fn level_count(&self) -> usize { self.pack.len() }
    pub fn pack_source(&self) -> &PackSource { self.pack.source() }

    pub fn message(&self) -> Option<&str> {
        if self.message_timer > 0 { Some(&self.message) } else { None }
    }

    pub fn set_message(&mut self, msg: &str) {
        self.message = msg.to_string();
        self.message_timer = MESSAGE_TICKS;
    }

    fn announce_level(&mut self) {
        let msg = format!("Level {}: {}", self.session.level(), self.session.name());
        self.set_message(&msg);
    }

    /// Replace the session with a fresh one for `level`.
    pub fn start_level(&mut self, level: usize) -> Result<(), LevelError> {
        let def = self.pack.get(level)?;
        self.session = LevelSession::new(def, level, self.pack.len(), &self.config)?;
        self.phase = Phase::Playing;
        self.announce_level();
        Ok(())
    }

    /// From the win screen: play again from level 1.
    pub fn new_game(&mut self) -> Result<(), LevelError> {
        self.start_level(1)
    }

    /// Advance one tick. Returns the events of the tick.
    pub fn tick(&mut self, input: FrameInput) -> Result<Vec<GameEvent>, LevelError> {
        if self.message_timer > 0 {
            self.message_timer -= 1;
        }
        if self.phase == Phase::Won {
            return Ok(vec![]);
        }

        let report = step(&mut self.session, input);
        self.update_message(&report.events);

        if let SessionState::LevelComplete(completion) = report.state {
            let level = self.session.level();
            self.profile.record_clear(level, self.pack.len());
            match completion {
                Completion::NextLevel(next) => self.start_level(next)?,
                Completion::GameWon => {
                    info!(levels = self.pack.len(), "game_won");
                    self.phase = Phase::Won;
                }
            }
        }

        Ok(report.events)
    }

    fn update_message(&mut self, events: &[GameEvent]) {
        for ev in events {
            match ev {
                GameEvent::Copied { .. } => self.set_message("Copied"),
                GameEvent::PasteArmed => self.set_message("Click an empty cell to paste"),
                GameEvent::PasteRejected => self.set_message("Can only paste into empty space"),
                GameEvent::ExitRevealed { .. } => self.set_message("An exit appeared!"),
                GameEvent::Restarted => self.announce_level(),
                _ => {}
            }
        }
    }
}
