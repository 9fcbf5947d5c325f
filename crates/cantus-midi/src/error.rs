//! Error types for cantus-midi.

use thiserror::Error;

/// Result type alias for cantus-midi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while converting transport-level MIDI into note events.
#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    Parse(String),

    /// The message is valid MIDI but carries nothing the voice engine consumes.
    #[error("Unsupported MIDI message: {0}")]
    UnsupportedMessage(&'static str),
}

impl From<midi_msg::ParseError> for Error {
    fn from(e: midi_msg::ParseError) -> Self {
        Error::Parse(format!("{e:?}"))
    }
}
