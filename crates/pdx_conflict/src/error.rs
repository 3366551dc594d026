//! Error types for conflict resolution.
//!
//! All fallible functions in this crate return [`Result<T>`]. Parse anomalies
//! are not errors here: they arrive as invalid definitions and are kept in
//! their own store.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or committing conflict resolutions.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading mods, writing the patch mod, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (patch state).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A mod directory is missing or inaccessible.
    #[error("Invalid mod directory: {0}")]
    InvalidModDir(Utf8PathBuf),

    /// A mod descriptor could not be read.
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(#[from] pdx_script::DescriptorError),

    /// Another apply or ignore call is still running on this session.
    #[error("A conflict resolution is already in progress")]
    ResolutionInProgress,

    /// The session was disposed and no longer holds any definitions.
    #[error("The conflict session has been disposed")]
    SessionDisposed,

    /// The current patch state mode does not allow commits.
    #[error("The patch mod is read-only in mode '{0}'")]
    ReadOnlyPatch(String),

    /// Writing one bucket to the patch mod failed. Other buckets are untouched.
    #[error("Failed to write patch for '{key}': {source}")]
    PatchWrite {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// No game is registered under the given key.
    #[error("Unknown game: {0}")]
    UnknownGame(String),

    /// Catch-all for errors from content providers and other sources.
    #[error("{0}")]
    Other(String),
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}
