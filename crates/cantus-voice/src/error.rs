//! Error types for cantus-voice.

use thiserror::Error;

/// Result type alias for cantus-voice operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cantus-voice.
///
/// Only configuration can fail. Note, pedal and release edge cases are handled silently.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration parameter.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scene index outside `0..NUM_SCENES`.
    #[error("Scene {0} out of range")]
    SceneOutOfRange(usize),
}
