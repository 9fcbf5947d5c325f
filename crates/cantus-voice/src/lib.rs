//! Voice allocation for Cantus.
//!
//! Decides which notes sound, on which voices, and when they stop:
//!
//! - **[`Scene`]** - Key table, voice stack and play policy for one layer of the patch
//! - **[`KeyStateTable`]** - Held keys in press order, including pedal-held ones
//! - **[`NotePriorityResolver`]** - Mono note priority (latest, highest, lowest, legacy)
//! - **[`MonoLegatoController`]** - Retrigger-or-recycle decisions for mono modes
//! - **[`SustainPedalController`]** - Per-channel sustain with MPE master forwarding
//! - **[`NoteIdentityTracker`]** - Host note-id bookkeeping and ended-note reporting
//! - **[`VoiceAllocator`]** - Polyphony limit with oldest-first stealing
//! - **[`VoiceRenderer`]** - Per-voice render seam; [`ReleaseTail`] is the default
//!
//! # Example
//!
//! ```ignore
//! use cantus_voice::*;
//!
//! let mut identity = NoteIdentityTracker::new();
//! let pedal = SustainPedalController::new();
//! let expression = ExpressionState::default();
//! let mut next_voice_id = 0;
//! let mut scene = Scene::new(0, SceneConfig::mono(PlayMode::Mono, PriorityMode::Latest));
//!
//! let mut cx = SceneContext {
//!     identity: &mut identity,
//!     pedal: &pedal,
//!     expression: &expression,
//!     next_voice_id: &mut next_voice_id,
//!     mpe: false,
//! };
//! scene.note_on(&mut cx, 0, 60, 100, 0.0, Some(1));
//! scene.note_on(&mut cx, 0, 64, 100, 0.0, Some(2));
//! scene.note_off(&mut cx, 0, 64, Some(2));
//! assert_eq!(scene.sounding_key(), Some(60));
//! ```

pub mod error;
pub use error::{Error, Result};

mod allocator;
mod config;
mod expression;
mod identity;
mod key_state;
mod legato;
mod priority;
mod render;
mod scene;
mod sustain;
mod voice;

pub use allocator::VoiceAllocator;
pub use config::{
    MonoEnvelopeMode, PedalMode, PlayMode, PriorityMode, RepeatedKeyMode, SceneConfig, SceneId,
    MAX_VOICES, NUM_SCENES,
};
pub use expression::{normalize_bend, normalize_pressure, ExpressionState};
pub use identity::{EndedNoteEvent, NoteIdentity, NoteIdentityTracker};
pub use key_state::{HeldKey, KeyStateTable, KeySummary, KeyTicket, TicketList, MAX_HELD_KEYS};
pub use legato::{Fallback, MonoAction, MonoLegatoController};
pub use priority::NotePriorityResolver;
pub use render::{ReleaseTail, VoiceActivity, VoiceRenderer};
pub use scene::{Scene, SceneContext};
pub use sustain::{PedalChange, SustainPedalController};
pub use voice::{Gate, Voice, VoiceId};
