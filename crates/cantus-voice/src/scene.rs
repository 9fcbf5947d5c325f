//! One scene: key table, voice stack and the play policy that connects them.
//!
//! Every operation takes a [`SceneContext`] carrying the state scenes share: the identity
//! tracker (host ids can span both scenes in dual mode), the pedal flags, controller state and
//! the voice id counter.

use cantus_midi::NoteId;

use crate::allocator::VoiceAllocator;
use crate::config::{PedalMode, PlayMode, RepeatedKeyMode, SceneConfig, SceneId};
use crate::expression::ExpressionState;
use crate::identity::NoteIdentityTracker;
use crate::key_state::{HeldKey, KeyStateTable, KeySummary, KeyTicket};
use crate::legato::{MonoAction, MonoLegatoController};
use crate::priority::NotePriorityResolver;
use crate::render::{VoiceActivity, VoiceRenderer};
use crate::sustain::SustainPedalController;
use crate::voice::{Gate, Voice, VoiceId};

/// Engine-wide state a scene borrows for the duration of one operation.
pub struct SceneContext<'a> {
    pub identity: &'a mut NoteIdentityTracker,
    pub pedal: &'a SustainPedalController,
    pub expression: &'a ExpressionState,
    pub next_voice_id: &'a mut VoiceId,
    /// Member channels carry one note each, so the mono pedal mode does not apply.
    pub mpe: bool,
}

pub struct Scene {
    id: SceneId,
    config: SceneConfig,
    keys: KeyStateTable,
    voices: VoiceAllocator,
    legato: MonoLegatoController,
}

impl Scene {
    pub fn new(id: SceneId, config: SceneConfig) -> Self {
        Self {
            id,
            voices: VoiceAllocator::new(config.effective_polyphony()),
            config,
            keys: KeyStateTable::new(),
            legato: MonoLegatoController::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> SceneId {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Apply a new configuration. Switching play mode releases the scene.
    pub fn set_config(&mut self, config: SceneConfig, cx: &mut SceneContext<'_>) {
        if config.play_mode != self.config.play_mode {
            tracing::debug!(
                "scene {} play mode {:?} -> {:?}",
                self.id,
                self.config.play_mode,
                config.play_mode
            );
            self.release_all();
        }
        self.voices
            .set_polyphony(config.effective_polyphony(), cx.identity);
        self.config = config;
    }

    /// Live voices, oldest first.
    #[inline]
    pub fn voices(&self) -> &[Voice] {
        self.voices.voices()
    }

    #[inline]
    pub fn held_keys(&self) -> &[HeldKey] {
        self.keys.entries()
    }

    /// Whether any entry (pressed or pedal-held) exists for (channel, key).
    pub fn is_key_held(&self, channel: u8, key: u8) -> bool {
        self.keys
            .entries()
            .iter()
            .any(|e| e.channel == channel && e.key == key)
    }

    #[inline]
    pub fn key_summary(&self) -> KeySummary {
        self.keys.summary()
    }

    /// Key of the newest sounding voice.
    pub fn sounding_key(&self) -> Option<u8> {
        self.voices
            .sounding_index()
            .and_then(|i| self.voices.get(i))
            .map(|v| v.sounding_key)
    }

    pub fn note_on(
        &mut self,
        cx: &mut SceneContext<'_>,
        channel: u8,
        key: u8,
        velocity: u8,
        detune: f32,
        note_id: Option<NoteId>,
    ) {
        let voices = &self.voices;
        let collapsed = self
            .keys
            .collapse_pedal_held(channel, key, |t| voices.index_for_ticket(t).is_some());
        if collapsed > 0 {
            tracing::trace!(
                "scene {}: re-strike of {channel}/{key} dropped {collapsed} held entries",
                self.id
            );
        }
        let ticket = self.keys.note_on(channel, key, velocity, note_id);
        let Some(&held) = self.keys.get(ticket) else {
            return;
        };
        match self.config.play_mode {
            PlayMode::Poly => self.poly_note_on(cx, &held, detune),
            PlayMode::Latch => self.latch_note_on(cx, &held, detune),
            _ => self.mono_note_on(cx, &held, detune),
        }
    }

    /// Release the pressed entry for (channel, key). Returns whether one matched.
    pub fn note_off(
        &mut self,
        cx: &mut SceneContext<'_>,
        channel: u8,
        key: u8,
        note_id: Option<NoteId>,
    ) -> bool {
        match self.keys.find_pressed(channel, key, note_id) {
            Some(ticket) => {
                self.release_entry(cx, ticket);
                true
            }
            None => {
                tracing::trace!("scene {}: note-off {channel}/{key} matches nothing", self.id);
                false
            }
        }
    }

    pub fn note_off_by_id(
        &mut self,
        cx: &mut SceneContext<'_>,
        note_id: NoteId,
        channel: u8,
    ) -> bool {
        match self.keys.find_pressed_by_id(note_id, channel) {
            Some(ticket) => {
                self.release_entry(cx, ticket);
                true
            }
            None => false,
        }
    }

    /// Drop entries whose pedal went up and act on the voices they kept.
    pub fn pedal_released(&mut self, cx: &mut SceneContext<'_>) {
        let pedal = cx.pedal;
        let removed = self.keys.take_pedal_held(|ch| pedal.is_holding(ch));
        if !removed.is_empty() {
            self.on_keys_removed(&removed);
        }
    }

    /// Drop the key regardless of the pedal and cut its voices short.
    pub fn choke(&mut self, channel: u8, key: u8, note_id: Option<NoteId>) {
        let tickets = self.keys.find_all(channel, key, note_id);
        for &ticket in &tickets {
            self.keys.remove(ticket);
        }
        if !tickets.is_empty() {
            self.on_keys_removed(&tickets);
        }
        for voice in self.voices.voices_mut() {
            let id_matches = note_id.is_none() || voice.host_note_id == note_id;
            if voice.channel == channel && voice.sounding_key == key && id_matches {
                voice.begin_release(true);
            }
        }
    }

    /// Release every sounding voice and forget all held keys.
    pub fn release_all(&mut self) {
        for voice in self.voices.voices_mut() {
            voice.begin_release(false);
        }
        self.keys.clear();
        self.legato.reset();
    }

    /// Kill every voice immediately, reporting each, and forget all held keys.
    pub fn kill_all(&mut self, cx: &mut SceneContext<'_>) {
        self.voices.kill_all(cx.identity);
        self.keys.clear();
        self.legato.reset();
    }

    pub fn set_global_bend(&mut self, bend: f32) {
        for voice in self.voices.voices_mut() {
            voice.global_bend = bend;
        }
    }

    pub fn set_channel_bend(&mut self, channel: u8, bend: f32) {
        for voice in self.voices.voices_mut().iter_mut().filter(|v| v.channel == channel) {
            voice.channel_bend = bend;
        }
    }

    pub fn set_global_pressure(&mut self, pressure: f32) {
        for voice in self.voices.voices_mut() {
            voice.global_pressure = pressure;
        }
    }

    pub fn set_channel_pressure(&mut self, channel: u8, pressure: f32) {
        for voice in self.voices.voices_mut().iter_mut().filter(|v| v.channel == channel) {
            voice.channel_pressure = pressure;
        }
    }

    pub fn set_poly_pressure(&mut self, channel: u8, key: u8, pressure: f32) {
        for voice in self
            .voices
            .voices_mut()
            .iter_mut()
            .filter(|v| v.channel == channel && v.sounding_key == key)
        {
            voice.poly_pressure = pressure;
        }
    }

    /// Render one block; voices the renderer reports finished become `Dead`.
    pub fn render<R: VoiceRenderer + ?Sized>(
        &mut self,
        identity: &mut NoteIdentityTracker,
        renderer: &mut R,
    ) {
        let mut i = 0;
        while let Some(voice) = self.voices.get(i) {
            match renderer.render(self.id, voice) {
                VoiceActivity::Finished => {
                    self.voices.kill(i, identity);
                }
                VoiceActivity::Active => {
                    if let Some(voice) = self.voices.get_mut(i) {
                        voice.advance();
                    }
                    i += 1;
                }
            }
        }
    }

    fn poly_note_on(&mut self, cx: &mut SceneContext<'_>, held: &HeldKey, detune: f32) {
        if self.config.repeated_key_mode == RepeatedKeyMode::OneVoicePerKey {
            for voice in self.voices.voices_mut() {
                if voice.channel == held.channel && voice.sounding_key == held.key {
                    voice.begin_release(true);
                }
            }
        }
        self.start_voice(cx, held, detune, None, false);
    }

    fn latch_note_on(&mut self, cx: &mut SceneContext<'_>, held: &HeldKey, detune: f32) {
        for voice in self.voices.voices_mut() {
            voice.begin_release(false);
        }
        self.start_voice(cx, held, detune, None, false);
    }

    fn mono_note_on(&mut self, cx: &mut SceneContext<'_>, held: &HeldKey, detune: f32) {
        let resolver = NotePriorityResolver::new(self.config.priority);
        if !resolver.admits(held, self.keys.entries()) {
            tracing::trace!(
                "scene {}: key {} outranked under {:?}",
                self.id,
                held.key,
                self.config.priority
            );
            return;
        }

        let sounding = self.voices.sounding_index();
        let sounding_key = sounding.and_then(|i| self.voices.get(i)).map(|v| v.sounding_key);
        let action = self.legato.note_on(
            self.config.play_mode,
            self.config.envelope_mode,
            sounding_key,
            held.key,
        );

        match (action, sounding) {
            (MonoAction::Recycle { glide_from }, Some(index)) => {
                self.recycle_voice(cx, index, held, detune, glide_from)
            }
            (
                MonoAction::Retrigger {
                    glide_from,
                    envelope_from_current,
                },
                _,
            ) => self.retrigger_voice(cx, held, detune, glide_from, envelope_from_current),
            (MonoAction::Recycle { .. }, None) => {
                self.retrigger_voice(cx, held, detune, None, false)
            }
        }
    }

    fn recycle_voice(
        &mut self,
        cx: &mut SceneContext<'_>,
        index: usize,
        held: &HeldKey,
        detune: f32,
        glide_from: u8,
    ) {
        let Some(voice) = self.voices.get_mut(index) else {
            return;
        };
        voice.adopt(held);
        voice.detune = detune;
        voice.glide_from = Some(glide_from);
        voice.gate = Gate::SoundingLegato;
        cx.identity.recycle(voice.voice_id, voice.identity());
        tracing::debug!(
            "scene {}: voice {} glides {} -> {}",
            self.id,
            voice.voice_id,
            glide_from,
            held.key
        );
    }

    /// Earlier voices quick-release; a new voice takes the note.
    fn retrigger_voice(
        &mut self,
        cx: &mut SceneContext<'_>,
        held: &HeldKey,
        detune: f32,
        glide_from: Option<u8>,
        envelope_from_current: bool,
    ) {
        for voice in self.voices.voices_mut() {
            voice.begin_release(true);
        }
        self.start_voice(cx, held, detune, glide_from, envelope_from_current);
    }

    fn start_voice(
        &mut self,
        cx: &mut SceneContext<'_>,
        held: &HeldKey,
        detune: f32,
        glide_from: Option<u8>,
        envelope_from_current: bool,
    ) {
        self.voices.make_room(cx.identity);

        let voice_id = *cx.next_voice_id;
        *cx.next_voice_id += 1;

        let mut voice = Voice::new(voice_id, self.id, held, detune);
        voice.glide_from = glide_from;
        voice.envelope_from_current = envelope_from_current;
        cx.expression.apply_to(&mut voice);
        cx.identity.bind(voice_id, voice.identity());
        self.voices.push(voice);
    }

    /// A pressed key went up: hold it for the pedal, or drop it.
    fn release_entry(&mut self, cx: &mut SceneContext<'_>, ticket: KeyTicket) {
        let Some(entry) = self.keys.get(ticket) else {
            return;
        };
        if cx.pedal.is_holding(entry.channel) {
            let release_now = self.config.play_mode.is_mono()
                && self.config.pedal_mode == PedalMode::ReleaseIfOthersHeld
                && !cx.mpe
                && self.keys.has_other(ticket);
            if !release_now {
                self.keys.hold(ticket);
                return;
            }
        }
        self.keys.remove(ticket);
        self.on_keys_removed(&[ticket]);
    }

    fn on_keys_removed(&mut self, tickets: &[KeyTicket]) {
        match self.config.play_mode {
            PlayMode::Poly => {
                for voice in self.voices.voices_mut() {
                    if voice.is_sounding() && voice.ticket.is_some_and(|t| tickets.contains(&t)) {
                        voice.begin_release(false);
                    }
                }
            }
            // Latched voices outlive their keys.
            PlayMode::Latch => {
                for voice in self.voices.voices_mut() {
                    if voice.ticket.is_some_and(|t| tickets.contains(&t)) {
                        voice.ticket = None;
                    }
                }
            }
            _ => self.mono_fallback(tickets),
        }
    }

    /// If the sounding key was among `tickets`, move to the key priority picks or release.
    fn mono_fallback(&mut self, tickets: &[KeyTicket]) {
        let Some(index) = self.voices.sounding_index() else {
            return;
        };
        let Some(voice) = self.voices.get(index) else {
            return;
        };
        if !voice.ticket.is_some_and(|t| tickets.contains(&t)) {
            return;
        }

        let resolver = NotePriorityResolver::new(self.config.priority);
        let next = resolver.resolve(self.keys.entries()).copied();
        let Some(voice) = self.voices.get_mut(index) else {
            return;
        };
        match next {
            Some(held) => {
                let fallback =
                    self.legato
                        .fallback(self.config.play_mode, self.config.envelope_mode, held.key);
                tracing::debug!(
                    "scene {}: voice {} falls back {} -> {}",
                    self.id,
                    voice.voice_id,
                    voice.sounding_key,
                    held.key
                );
                voice.follow(&held);
                if fallback.gate == Gate::SoundingRetriggered {
                    voice.retrigger();
                } else {
                    voice.gate = fallback.gate;
                }
                voice.envelope_from_current = fallback.envelope_from_current;
            }
            None => voice.begin_release(false),
        }
    }
}
