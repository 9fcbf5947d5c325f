//! Per-scene voice stack with FIFO stealing.
//!
//! Voices are kept in insertion order. When a new voice would exceed the polyphony limit the
//! front of the stack (the oldest live voice, whatever its pitch, velocity or gate) is stolen:
//! finalized as `Dead` on the spot, with its ended note reported. Dead voices are removed
//! immediately, so every voice in the stack is live.
//!
//! All methods are RT-safe (no allocations after construction).

use crate::config::MAX_VOICES;
use crate::identity::NoteIdentityTracker;
use crate::key_state::KeyTicket;
use crate::voice::{Gate, Voice, VoiceId};

#[derive(Debug, Clone)]
pub struct VoiceAllocator {
    voices: Vec<Voice>,
    polyphony: usize,
}

impl VoiceAllocator {
    pub fn new(polyphony: usize) -> Self {
        Self {
            voices: Vec::with_capacity(MAX_VOICES),
            polyphony: polyphony.clamp(1, MAX_VOICES),
        }
    }

    pub fn polyphony(&self) -> usize {
        self.polyphony
    }

    /// Change the limit, stealing from the front if the stack is now over it.
    pub fn set_polyphony(&mut self, polyphony: usize, identity: &mut NoteIdentityTracker) {
        self.polyphony = polyphony.clamp(1, MAX_VOICES);
        while self.voices.len() > self.polyphony {
            self.steal_oldest(identity);
        }
    }

    /// Steal until one more voice fits. Returns how many were stolen.
    pub fn make_room(&mut self, identity: &mut NoteIdentityTracker) -> usize {
        let mut stolen = 0;
        while self.voices.len() >= self.polyphony {
            self.steal_oldest(identity);
            stolen += 1;
        }
        stolen
    }

    /// Append a voice. Call [`make_room`](Self::make_room) first.
    pub fn push(&mut self, voice: Voice) {
        debug_assert!(self.voices.len() < self.polyphony);
        self.voices.push(voice);
    }

    /// Finalize the voice at `index` as `Dead` and drop it from the stack.
    pub fn kill(&mut self, index: usize, identity: &mut NoteIdentityTracker) -> Option<Voice> {
        if index >= self.voices.len() {
            return None;
        }
        let mut voice = self.voices.remove(index);
        voice.gate = Gate::Dead;
        voice.ticket = None;
        identity.mark_dead(voice.voice_id);
        Some(voice)
    }

    pub fn kill_all(&mut self, identity: &mut NoteIdentityTracker) {
        while !self.voices.is_empty() {
            self.kill(0, identity);
        }
    }

    fn steal_oldest(&mut self, identity: &mut NoteIdentityTracker) {
        if let Some(voice) = self.kill(0, identity) {
            tracing::debug!(
                "stole voice {} (key {}) in scene {}",
                voice.voice_id,
                voice.sounding_key,
                voice.scene
            );
        }
    }

    /// Index of the sounding voice (the mono slot). With several, the newest.
    pub fn sounding_index(&self) -> Option<usize> {
        self.voices.iter().rposition(|v| v.is_sounding())
    }

    /// Index of the sounding voice started by (or following) a held key.
    pub fn index_for_ticket(&self, ticket: KeyTicket) -> Option<usize> {
        self.voices
            .iter()
            .position(|v| v.is_sounding() && v.ticket == Some(ticket))
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Voice> {
        self.voices.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    /// Live voices, oldest first.
    #[inline]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    #[inline]
    pub fn voices_mut(&mut self) -> &mut [Voice] {
        &mut self.voices
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn sounding_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }
}
