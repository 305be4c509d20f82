//! Error types for the weft framework.

use std::io;

/// Error type for weft operations. Only terminal acquisition and reader
/// failures surface from `App::run`; everything else is absorbed
/// locally.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error from the terminal substrate.
    #[error(transparent)]
    Core(#[from] weft_core::CoreError),

    /// Terminal operation failed.
    #[error("terminal error: {0}")]
    Terminal(String),

    /// A second `run` was attempted while one is active.
    #[error("an app is already running in this process")]
    AlreadyRunning,
}

/// Result type alias for weft operations.
pub type Result<T> = std::result::Result<T, Error>;
