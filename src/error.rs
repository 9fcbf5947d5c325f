//! Centralized error type for the cantus umbrella crate.
//!
//! Wraps the member crates' errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("MIDI: {0}")]
    Midi(#[from] cantus_midi::Error),

    #[error("Voice: {0}")]
    Voice(#[from] cantus_voice::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, Error>;
