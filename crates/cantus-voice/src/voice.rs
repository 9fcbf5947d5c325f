//! The voice record the DSP collaborator renders from.

use cantus_midi::NoteId;

use crate::config::SceneId;
use crate::identity::NoteIdentity;
use crate::key_state::{HeldKey, KeyTicket};

/// Unique identifier for a voice instance.
pub type VoiceId = u64;

/// Lifecycle of a voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Sounding; pitch moved without restarting the envelope.
    SoundingLegato,
    /// Sounding; envelope (re)started.
    SoundingRetriggered,
    /// Key released, release tail running.
    Releasing,
    Dead,
}

impl Gate {
    #[inline]
    pub fn is_sounding(self) -> bool {
        matches!(self, Gate::SoundingLegato | Gate::SoundingRetriggered)
    }
}

#[derive(Debug, Clone)]
pub struct Voice {
    pub voice_id: VoiceId,
    pub scene: SceneId,
    /// Channel of the key currently sounding.
    pub channel: u8,
    pub sounding_key: u8,
    /// Identity reported when the voice ends.
    pub originating_channel: u8,
    pub originating_key: u8,
    pub host_note_id: Option<NoteId>,
    pub gate: Gate,
    pub velocity: u8,
    /// Semitone offset from the key (frequency-addressed notes).
    pub detune: f32,
    /// Key to glide from, if the pitch should slide in.
    pub glide_from: Option<u8>,
    /// Start the envelope from its current level instead of zero.
    pub envelope_from_current: bool,
    /// Release as fast as possible (stolen slot, mono retrigger, choke).
    pub quick_release: bool,
    /// Bumped every time the envelope is (re)started.
    pub trigger_count: u32,
    /// Normalized `[-1, 1)`.
    pub global_bend: f32,
    pub channel_bend: f32,
    /// Normalized `[0, 1]`.
    pub global_pressure: f32,
    pub channel_pressure: f32,
    pub poly_pressure: f32,
    /// Blocks rendered.
    pub age: u32,
    /// Blocks rendered since release began.
    pub release_age: u32,
    pub(crate) ticket: Option<KeyTicket>,
}

impl Voice {
    pub(crate) fn new(voice_id: VoiceId, scene: SceneId, held: &HeldKey, detune: f32) -> Self {
        Self {
            voice_id,
            scene,
            channel: held.channel,
            sounding_key: held.key,
            originating_channel: held.channel,
            originating_key: held.key,
            host_note_id: held.note_id,
            gate: Gate::SoundingRetriggered,
            velocity: held.velocity,
            detune,
            glide_from: None,
            envelope_from_current: false,
            quick_release: false,
            trigger_count: 1,
            global_bend: 0.0,
            channel_bend: 0.0,
            global_pressure: 0.0,
            channel_pressure: 0.0,
            poly_pressure: 0.0,
            age: 0,
            release_age: 0,
            ticket: Some(held.order),
        }
    }

    pub fn identity(&self) -> NoteIdentity {
        NoteIdentity {
            host_note_id: self.host_note_id,
            channel: self.originating_channel,
            key: self.originating_key,
        }
    }

    #[inline]
    pub fn is_sounding(&self) -> bool {
        self.gate.is_sounding()
    }

    /// Move the pitch to another held key, keeping the identity.
    pub(crate) fn follow(&mut self, held: &HeldKey) {
        self.glide_from = Some(self.sounding_key);
        self.channel = held.channel;
        self.sounding_key = held.key;
        self.ticket = Some(held.order);
    }

    /// Move the pitch to another held key and take over its identity.
    pub(crate) fn adopt(&mut self, held: &HeldKey) {
        self.follow(held);
        self.originating_channel = held.channel;
        self.originating_key = held.key;
        self.host_note_id = held.note_id;
        self.velocity = held.velocity;
    }

    pub(crate) fn retrigger(&mut self) {
        self.gate = Gate::SoundingRetriggered;
        self.trigger_count = self.trigger_count.wrapping_add(1);
        self.quick_release = false;
    }

    pub(crate) fn begin_release(&mut self, quick: bool) {
        if self.gate == Gate::Dead {
            return;
        }
        if self.gate != Gate::Releasing {
            self.gate = Gate::Releasing;
            self.release_age = 0;
        }
        self.quick_release |= quick;
        self.ticket = None;
    }

    pub(crate) fn advance(&mut self) {
        self.age = self.age.saturating_add(1);
        if self.gate == Gate::Releasing {
            self.release_age = self.release_age.saturating_add(1);
        }
    }
}
