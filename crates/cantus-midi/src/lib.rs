//! Event vocabulary for the Cantus voice engine.
//!
//! - **[`NoteEvent`]** - Note/controller events with host note ids and sample-accurate offsets
//! - **[`MidiEvent`]** - MIDI 1.0 channel voice messages (via `midi-msg`), convertible to [`NoteEvent`]
//! - **[`MpeZoneConfig`]** / **[`MpeChannelMap`]** - MPE master/member channels and note-on route capture
//! - **[`event_queue`]** - Lock-free producer/consumer hand-off into the audio thread
//!
//! # Example
//!
//! ```ignore
//! use cantus_midi::{event_queue, NoteEvent};
//!
//! let (mut tx, mut rx) = event_queue();
//! tx.push(NoteEvent::note_on(0, 0, 60, 100, Some(7)));
//! tx.push(NoteEvent::note_off(256, 0, 60, Some(7)));
//! while let Some(event) = rx.pop() {
//!     // apply to the engine
//! }
//! ```

pub mod error;
pub use error::{Error, Result};

mod event;
mod mpe;
mod note;
mod queue;

pub use event::{
    bend_to_signed, MidiEvent, NoteEvent, NoteEventKind, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF,
    CC_SUSTAIN,
};
pub use mpe::{ChannelRole, MpeChannelMap, MpeZone, MpeZoneConfig, RouteMask};
pub use note::{
    frequency_to_key, hz_to_key, key_to_hz, note_id_from_raw, note_id_to_raw, NoteId, MAX_KEY,
    NUM_CHANNELS,
};
pub use queue::{
    event_queue, event_queue_with_capacity, EventReceiver, EventSender, DEFAULT_QUEUE_CAPACITY,
};

// Re-export midi-msg types used in `MidiEvent`'s public fields
pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
