/// Persistent player progress.
///
/// Stored as `profile.toml` in the data directory:
///
///   progress = 3        # highest unlocked level (1-based)
///   cleared = [1, 2]    # levels finished at least once
///
/// The profile is owned by `Game` and passed in explicitly; nothing else
/// reads or writes it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ProfileError;

const PROFILE_FILE: &str = "profile.toml";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_progress")]
    pub progress: usize,
    #[serde(default)]
    pub cleared: BTreeSet<usize>,
}

fn default_progress() -> usize { 1 }

impl Default for Profile {
    fn default() -> Self {
        Profile { progress: default_progress(), cleared: BTreeSet::new() }
    }
}

impl Profile {
    /// Record a cleared level and unlock the next one (capped at `max_level`).
    pub fn record_clear(&mut self, level: usize, max_level: usize) {
        self.cleared.insert(level);
        let next = (level + 1).min(max_level);
        if next > self.progress {
            self.progress = next;
        }
    }

    /// Level to resume at, within `1..=max_level`.
    pub fn resume_level(&self, max_level: usize) -> usize {
        self.progress.clamp(1, max_level.max(1))
    }

    pub fn load_from(path: &Path) -> Result<Self, ProfileError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ProfileError::Io { path: path.to_path_buf(), source })?;
        Ok(toml::from_str(&text)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ProfileError> {
        let text = toml::to_string(self)?;
        std::fs::write(path, text)
            .map_err(|source| ProfileError::Io { path: path.to_path_buf(), source })
    }

    /// Load from the data directory. Missing file → fresh profile;
    /// unreadable file → fresh profile with a warning.
    pub fn load() -> Self {
        let path = profile_path();
        if !path.exists() {
            return Profile::default();
        }
        match Profile::load_from(&path) {
            Ok(p) => p,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "profile unreadable, starting fresh");
                Profile::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), ProfileError> {
        self.save_to(&profile_path())
    }
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Writable data directory: exe dir if writable, else `~/.local/share/ctrlv`, else CWD.
pub fn data_dir() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs (e.g. /usr/games) are not writable
            let test_path = parent.join(".write_test_ctrlv");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/ctrlv");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn profile_path() -> PathBuf {
    data_dir().join(PROFILE_FILE)
}
