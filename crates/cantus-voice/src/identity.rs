//! Host note identity bound to voices, and the per-block list of ended notes.
//!
//! A host note id is reported ended once, when the last live voice bound to it goes away
//! (dies, or is recycled onto another note). Voices without an id report individually.
//!
//! Events raised between blocks are parked and published at the start of the next block, so
//! [`NoteIdentityTracker::ended_notes`] always describes exactly one `process()` call.

use cantus_midi::NoteId;

use crate::config::{MAX_VOICES, NUM_SCENES};
use crate::voice::VoiceId;

/// The note a voice answers to when it ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteIdentity {
    pub host_note_id: Option<NoteId>,
    pub channel: u8,
    pub key: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndedNoteEvent {
    pub host_note_id: Option<NoteId>,
    pub original_channel: u8,
    pub original_key: u8,
}

impl From<NoteIdentity> for EndedNoteEvent {
    fn from(identity: NoteIdentity) -> Self {
        Self {
            host_note_id: identity.host_note_id,
            original_channel: identity.channel,
            original_key: identity.key,
        }
    }
}

const MAX_BINDINGS: usize = MAX_VOICES * NUM_SCENES;

pub struct NoteIdentityTracker {
    bindings: Vec<(VoiceId, NoteIdentity)>,
    /// Raised outside `process()`, published by the next `begin_block`.
    pending: Vec<EndedNoteEvent>,
    block: Vec<EndedNoteEvent>,
    in_block: bool,
}

impl NoteIdentityTracker {
    pub fn new() -> Self {
        Self {
            bindings: Vec::with_capacity(MAX_BINDINGS),
            pending: Vec::with_capacity(MAX_BINDINGS * 2),
            block: Vec::with_capacity(MAX_BINDINGS * 4),
            in_block: false,
        }
    }

    /// Register the identity of a freshly created voice.
    pub fn bind(&mut self, voice: VoiceId, identity: NoteIdentity) {
        match self.binding_index(voice) {
            Some(i) => self.bindings[i].1 = identity,
            None => self.bindings.push((voice, identity)),
        }
    }

    /// Re-point a live voice at a new note; the superseded identity is reported ended now.
    pub fn recycle(&mut self, voice: VoiceId, identity: NoteIdentity) {
        let Some(i) = self.binding_index(voice) else {
            self.bind(voice, identity);
            return;
        };
        let old = std::mem::replace(&mut self.bindings[i].1, identity);
        if old != identity {
            self.report(old);
        }
    }

    /// Drop the voice's binding and report its identity ended.
    pub fn mark_dead(&mut self, voice: VoiceId) {
        let Some(i) = self.binding_index(voice) else {
            tracing::trace!("voice {voice} died without a bound identity");
            return;
        };
        let (_, identity) = self.bindings.swap_remove(i);
        self.report(identity);
    }

    /// Whether some live voice still answers to `note_id`.
    pub fn is_bound(&self, note_id: NoteId) -> bool {
        self.bindings
            .iter()
            .any(|(_, id)| id.host_note_id == Some(note_id))
    }

    /// Publish events raised since the previous block; later events land in the same list.
    pub fn begin_block(&mut self) {
        self.block.clear();
        self.block.append(&mut self.pending);
        self.in_block = true;
    }

    pub fn end_block(&mut self) {
        self.in_block = false;
    }

    #[inline]
    pub fn ended_note_count(&self) -> usize {
        self.block.len()
    }

    #[inline]
    pub fn ended_note_at(&self, index: usize) -> Option<EndedNoteEvent> {
        self.block.get(index).copied()
    }

    #[inline]
    pub fn ended_notes(&self) -> &[EndedNoteEvent] {
        &self.block
    }

    /// Take this block's events, leaving the list empty.
    pub fn drain_ended_this_block(&mut self) -> std::vec::Drain<'_, EndedNoteEvent> {
        self.block.drain(..)
    }

    fn report(&mut self, identity: NoteIdentity) {
        if let Some(id) = identity.host_note_id {
            if self.is_bound(id) {
                return;
            }
        }
        let event = EndedNoteEvent::from(identity);
        if self.in_block {
            self.block.push(event);
        } else {
            self.pending.push(event);
        }
    }

    fn binding_index(&self, voice: VoiceId) -> Option<usize> {
        self.bindings.iter().position(|(v, _)| *v == voice)
    }
}

impl Default for NoteIdentityTracker {
    fn default() -> Self {
        Self::new()
    }
}
