/// Error types for level data and the persisted profile.
///
/// Configuration has no error type: a bad `config.toml` degrades to
/// defaults with a logged warning.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("level {level} has no spawn marker")]
    MissingSpawn { level: usize },

    #[error("no level {level} (pack has {count})")]
    UnknownLevel { level: usize, count: usize },

    #[error("malformed map {name}: {reason}")]
    MalformedMap { name: String, reason: String },

    #[error("bad trigger `{text}`: {reason}")]
    BadTrigger { text: String, reason: String },

    #[error("reading {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile i/o at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("profile is not valid TOML")]
    Parse(#[from] toml::de::Error),

    #[error("profile could not be serialized")]
    Serialize(#[from] toml::ser::Error),
}
