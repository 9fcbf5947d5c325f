//! # Cantus - Synth Voice Engine
//!
//! Voice allocation, note priority, sustain pedal and host note-id tracking for a
//! polyphonic/monophonic synthesizer. Audio rendering is left to a [`VoiceRenderer`].
//!
//! ## Architecture
//!
//! Cantus is an umbrella crate that coordinates:
//! - **cantus-midi** - Event vocabulary (note ids, MIDI 1.0 conversion, MPE zones, event queue)
//! - **cantus-voice** - Per-scene key state, priority, legato, pedal, voice stacks, identity tracking
//!
//! On top of these it adds the [`SynthEngine`] that owns two scenes and routes events to them
//! ([`SceneMode`]: single, dual, key split, channel split), with optional MPE.
//!
//! ## Quick Start
//!
//! ```ignore
//! use cantus::prelude::*;
//!
//! let mut engine = SynthEngine::builder()
//!     .mono(PlayMode::Mono)
//!     .priority(PriorityMode::LatestRetriggerHighest)
//!     .build()?;
//!
//! engine.play_note(0, 61, 100, 0.0, 1);
//! engine.play_note(0, 60, 100, 0.0, 2);
//! engine.play_note(0, 59, 100, 0.0, 3);
//! engine.release_note(0, 59, 0, 3);
//! assert_eq!(engine.sounding_key(0), Some(61));
//!
//! engine.process();
//! for ended in engine.drain_ended_this_block() {
//!     // report ended.host_note_id back to the host
//! }
//! ```

/// Re-export of cantus-midi for direct access
pub use cantus_midi as midi;

/// Re-export of cantus-voice for direct access
pub use cantus_voice as voice;

pub mod error;
pub use error::{Error, Result};

mod builder;
mod engine;
mod router;

pub use builder::{EngineBuilder, EngineConfig};
pub use engine::SynthEngine;
pub use router::{scenes_in, ChannelRoute, ChannelRouter, SceneMode, ALL_SCENES};

pub use cantus_midi::{
    event_queue, EventReceiver, EventSender, MidiEvent, MpeZone, MpeZoneConfig, NoteEvent,
    NoteEventKind, NoteId,
};
pub use cantus_voice::{
    EndedNoteEvent, Gate, HeldKey, KeySummary, MonoEnvelopeMode, PedalMode, PlayMode,
    PriorityMode, ReleaseTail, RepeatedKeyMode, SceneConfig, SceneId, Voice, VoiceActivity,
    VoiceId, VoiceRenderer, MAX_VOICES, NUM_SCENES,
};

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{EngineBuilder, EngineConfig, Error, Result, SceneMode, SynthEngine};

    pub use crate::{
        EndedNoteEvent, Gate, HeldKey, KeySummary, MidiEvent, MonoEnvelopeMode, MpeZoneConfig,
        NoteEvent, NoteEventKind, NoteId, PedalMode, PlayMode, PriorityMode, ReleaseTail,
        RepeatedKeyMode, SceneConfig, Voice, VoiceActivity, VoiceRenderer,
    };
}
