//! SynthEngine that owns the scenes and all shared voice state.

use cantus_midi::{
    event_queue_with_capacity, frequency_to_key, EventReceiver, EventSender, MidiEvent,
    MpeZoneConfig, NoteEvent, NoteEventKind, NoteId, CC_ALL_NOTES_OFF, CC_ALL_SOUND_OFF,
    CC_SUSTAIN, MAX_KEY, NUM_CHANNELS,
};
use cantus_voice::{
    normalize_bend, normalize_pressure, EndedNoteEvent, ExpressionState, HeldKey, KeySummary,
    NoteIdentityTracker, PedalChange, ReleaseTail, Scene, SceneConfig, SceneContext, SceneId,
    SustainPedalController, Voice, VoiceId, VoiceRenderer, NUM_SCENES,
};

use crate::builder::{EngineBuilder, EngineConfig};
use crate::router::{scenes_in, ChannelRoute, ChannelRouter, SceneMode};
use crate::Result;

/// Borrow the shared state as a [`SceneContext`], leaving `self.scenes` free.
macro_rules! scene_cx {
    ($engine:ident) => {
        SceneContext {
            identity: &mut $engine.identity,
            pedal: &$engine.pedal,
            expression: &$engine.expression,
            next_voice_id: &mut $engine.next_voice_id,
            mpe: $engine.config.mpe.is_some(),
        }
    };
}

/// Voice engine: routes note events to scenes, tracks keys, pedal and host note ids, and
/// reports ended notes once per block.
///
/// Single-threaded. Call the note/controller methods directly from the audio thread, or push
/// [`NoteEvent`]s through [`take_event_sender`](Self::take_event_sender) from elsewhere and let
/// [`process`](Self::process) apply them.
///
/// # Example
///
/// ```ignore
/// use cantus::prelude::*;
///
/// let mut engine = SynthEngine::builder().poly(8).build()?;
///
/// engine.play_note(0, 60, 100, 0.0, 17);
/// engine.release_note(0, 60, 0, 17);
///
/// for _ in 0..16 {
///     engine.process();
///     for ended in engine.ended_notes() {
///         println!("host note {:?} ended", ended.host_note_id);
///     }
/// }
/// ```
pub struct SynthEngine<R: VoiceRenderer = ReleaseTail> {
    config: EngineConfig,
    scenes: [Scene; NUM_SCENES],
    router: ChannelRouter,
    identity: NoteIdentityTracker,
    pedal: SustainPedalController,
    expression: ExpressionState,
    next_voice_id: VoiceId,
    renderer: R,
    receiver: EventReceiver,
    sender: Option<EventSender>,
}

impl SynthEngine<ReleaseTail> {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn new(config: EngineConfig) -> Result<Self> {
        let tail = ReleaseTail::new(config.release_blocks, config.quick_release_blocks);
        Self::with_renderer(config, tail)
    }
}

impl<R: VoiceRenderer> SynthEngine<R> {
    pub fn with_renderer(config: EngineConfig, renderer: R) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = event_queue_with_capacity(config.queue_capacity);
        let mut pedal = SustainPedalController::new();
        pedal.set_master_channel(config.mpe.map(|zone| zone.master_channel));
        tracing::debug!(
            "synth engine: {:?}, mpe {:?}, scenes {:?}",
            config.scene_mode,
            config.mpe,
            config.scenes.map(|s| s.play_mode)
        );

        Ok(Self {
            scenes: std::array::from_fn(|i| Scene::new(i, config.scenes[i])),
            router: ChannelRouter::new(config.scene_mode, config.mpe),
            identity: NoteIdentityTracker::new(),
            pedal,
            expression: ExpressionState::default(),
            next_voice_id: 0,
            renderer,
            receiver,
            sender: Some(sender),
            config,
        })
    }

    // =========================================================================
    // Note input
    // =========================================================================

    /// Start a note. A negative `note_id` means the host supplied none.
    pub fn play_note(
        &mut self,
        channel: u8,
        key: u8,
        velocity: u8,
        detune: f32,
        note_id: impl Into<Option<NoteId>>,
    ) {
        if channel as usize >= NUM_CHANNELS || key > MAX_KEY {
            tracing::trace!("note-on {channel}/{key} out of range");
            return;
        }
        let note_id = note_id.into().filter(|id| *id >= 0);
        let route = self.router.route_note_on(channel, key);
        let mut cx = scene_cx!(self);
        for i in scenes_in(route) {
            self.scenes[i].note_on(&mut cx, channel, key, velocity, detune, note_id);
        }
    }

    /// Release a note. Without an id (or with a negative one) the oldest pressed entry for the
    /// key is released.
    pub fn release_note(
        &mut self,
        channel: u8,
        key: u8,
        _velocity: u8,
        note_id: impl Into<Option<NoteId>>,
    ) {
        let note_id = note_id.into().filter(|id| *id >= 0);
        let route = self.router.route_note(channel, key);
        let mut cx = scene_cx!(self);
        let mut matched = false;
        for i in scenes_in(route) {
            matched |= self.scenes[i].note_off(&mut cx, channel, key, note_id);
        }
        if matched {
            self.prune_routes();
        }
    }

    pub fn release_note_by_host_id(&mut self, note_id: NoteId, channel: u8) {
        if note_id < 0 {
            return;
        }
        let mut cx = scene_cx!(self);
        let mut matched = false;
        for scene in &mut self.scenes {
            matched |= scene.note_off_by_id(&mut cx, note_id, channel);
        }
        if matched {
            self.prune_routes();
        } else {
            tracing::trace!("release of unknown host note {note_id}");
        }
    }

    /// Play the key nearest below `frequency` on channel 0, the remainder becoming detune.
    pub fn play_note_by_frequency(
        &mut self,
        frequency: f32,
        velocity: u8,
        note_id: impl Into<Option<NoteId>>,
    ) {
        match frequency_to_key(frequency) {
            Some((key, detune)) => self.play_note(0, key, velocity, detune, note_id),
            None => tracing::trace!("ignoring note at {frequency} Hz"),
        }
    }

    // =========================================================================
    // Controllers
    // =========================================================================

    pub fn channel_controller(&mut self, channel: u8, cc: u8, value: u8) {
        match cc {
            CC_SUSTAIN => match self.pedal.on_controller(channel, value) {
                PedalChange::Released => {
                    let mut cx = scene_cx!(self);
                    for scene in &mut self.scenes {
                        scene.pedal_released(&mut cx);
                    }
                    self.prune_routes();
                }
                PedalChange::Pressed => tracing::trace!("sustain down on channel {channel}"),
                PedalChange::Unchanged => {}
            },
            CC_ALL_SOUND_OFF => self.all_sound_off(),
            CC_ALL_NOTES_OFF => self.all_notes_off(),
            _ => tracing::trace!("ignoring CC {cc} on channel {channel}"),
        }
    }

    /// Signed 14-bit bend, `-8192..=8191`.
    pub fn pitch_bend(&mut self, channel: u8, value: i16) {
        if channel as usize >= NUM_CHANNELS {
            return;
        }
        let bend = normalize_bend(value);
        match self.router.route_channel(channel) {
            ChannelRoute::Global => {
                self.expression.global_bend = bend;
                for scene in &mut self.scenes {
                    scene.set_global_bend(bend);
                }
            }
            ChannelRoute::Member(route) => {
                self.expression.channel_bend[channel as usize] = bend;
                for i in scenes_in(route) {
                    self.scenes[i].set_channel_bend(channel, bend);
                }
            }
        }
    }

    pub fn channel_pressure(&mut self, channel: u8, value: u8) {
        if channel as usize >= NUM_CHANNELS {
            return;
        }
        let pressure = normalize_pressure(value);
        match self.router.route_channel(channel) {
            ChannelRoute::Global => {
                self.expression.global_pressure = pressure;
                for scene in &mut self.scenes {
                    scene.set_global_pressure(pressure);
                }
            }
            ChannelRoute::Member(route) => {
                self.expression.channel_pressure[channel as usize] = pressure;
                for i in scenes_in(route) {
                    self.scenes[i].set_channel_pressure(channel, pressure);
                }
            }
        }
    }

    pub fn poly_pressure(&mut self, channel: u8, key: u8, value: u8) {
        let pressure = normalize_pressure(value);
        for i in scenes_in(self.router.route_note(channel, key)) {
            self.scenes[i].set_poly_pressure(channel, key, pressure);
        }
    }

    // =========================================================================
    // Bulk voice control
    // =========================================================================

    /// Drop the key whatever the pedal says and cut its voices short.
    pub fn choke_note(&mut self, channel: u8, key: u8, note_id: impl Into<Option<NoteId>>) {
        let note_id = note_id.into().filter(|id| *id >= 0);
        for i in scenes_in(self.router.route_note(channel, key)) {
            self.scenes[i].choke(channel, key, note_id);
        }
        self.prune_routes();
    }

    /// Release every sounding voice and forget all held keys.
    pub fn all_notes_off(&mut self) {
        tracing::debug!("all notes off");
        for scene in &mut self.scenes {
            scene.release_all();
        }
        self.router.clear();
    }

    /// Kill every voice on the spot, reporting each as ended.
    pub fn all_sound_off(&mut self) {
        tracing::debug!("all sound off");
        let mut cx = scene_cx!(self);
        for scene in &mut self.scenes {
            scene.kill_all(&mut cx);
        }
        self.pedal.reset();
        self.router.clear();
    }

    pub fn release_scene(&mut self, scene: SceneId) -> Result<()> {
        self.scenes
            .get_mut(scene)
            .ok_or(cantus_voice::Error::SceneOutOfRange(scene))?
            .release_all();
        self.prune_routes();
        Ok(())
    }

    // =========================================================================
    // Event queue and block processing
    // =========================================================================

    pub fn apply_event(&mut self, event: &NoteEvent) {
        match event.kind {
            NoteEventKind::NoteOn {
                channel,
                key,
                velocity,
                detune,
                note_id,
            } => self.play_note(channel, key, velocity, detune, note_id),
            NoteEventKind::NoteOff {
                channel,
                key,
                velocity,
                note_id,
            } => self.release_note(channel, key, velocity, note_id),
            NoteEventKind::NoteOffById { note_id, channel } => {
                self.release_note_by_host_id(note_id, channel)
            }
            NoteEventKind::NoteOnFrequency {
                frequency,
                velocity,
                note_id,
            } => self.play_note_by_frequency(frequency, velocity, note_id),
            NoteEventKind::Choke {
                channel,
                key,
                note_id,
            } => self.choke_note(channel, key, note_id),
            NoteEventKind::Control { channel, cc, value } => {
                self.channel_controller(channel, cc, value)
            }
            NoteEventKind::PitchBend { channel, value } => self.pitch_bend(channel, value),
            NoteEventKind::ChannelPressure { channel, value } => {
                self.channel_pressure(channel, value)
            }
            NoteEventKind::PolyPressure {
                channel,
                key,
                value,
            } => self.poly_pressure(channel, key, value),
        }
    }

    /// Convert and apply a MIDI 1.0 message.
    pub fn apply_midi(&mut self, event: &MidiEvent) -> Result<()> {
        let event = NoteEvent::from_midi(event)?;
        self.apply_event(&event);
        Ok(())
    }

    /// Queue an event for the next [`process`](Self::process). Returns `false` if the queue is
    /// full or its sender was taken.
    pub fn enqueue(&mut self, event: NoteEvent) -> bool {
        match self.sender.as_mut() {
            Some(sender) => sender.push(event),
            None => {
                tracing::warn!("event sender was taken, dropping {:?}", event.kind);
                false
            }
        }
    }

    /// Hand the queue's producer to another thread. Afterwards [`enqueue`](Self::enqueue) fails.
    pub fn take_event_sender(&mut self) -> Option<EventSender> {
        self.sender.take()
    }

    /// Advance one block: publish notes ended since the last block, apply queued events in
    /// arrival order, then render every voice, finalizing those the renderer reports finished.
    pub fn process(&mut self) {
        self.identity.begin_block();
        while let Some(event) = self.receiver.pop() {
            self.apply_event(&event);
        }
        for scene in &mut self.scenes {
            scene.render(&mut self.identity, &mut self.renderer);
        }
        self.identity.end_block();
    }

    // =========================================================================
    // Ended notes
    // =========================================================================

    /// Notes ended in the last block.
    #[inline]
    pub fn ended_note_count(&self) -> usize {
        self.identity.ended_note_count()
    }

    #[inline]
    pub fn ended_note_at(&self, index: usize) -> Option<EndedNoteEvent> {
        self.identity.ended_note_at(index)
    }

    #[inline]
    pub fn ended_notes(&self) -> &[EndedNoteEvent] {
        self.identity.ended_notes()
    }

    pub fn drain_ended_this_block(&mut self) -> impl Iterator<Item = EndedNoteEvent> + '_ {
        self.identity.drain_ended_this_block()
    }

    // =========================================================================
    // Voices and keys
    // =========================================================================

    /// Live voices of a scene, oldest first. Empty for an unknown scene.
    pub fn voices(&self, scene: SceneId) -> impl Iterator<Item = &Voice> {
        self.scenes
            .get(scene)
            .into_iter()
            .flat_map(|s| s.voices().iter())
    }

    pub fn sounding_key(&self, scene: SceneId) -> Option<u8> {
        self.scenes.get(scene).and_then(Scene::sounding_key)
    }

    pub fn held_keys(&self, scene: SceneId) -> &[HeldKey] {
        self.scenes
            .get(scene)
            .map(Scene::held_keys)
            .unwrap_or_default()
    }

    pub fn key_summary(&self, scene: SceneId) -> KeySummary {
        self.scenes
            .get(scene)
            .map(Scene::key_summary)
            .unwrap_or_default()
    }

    /// Live voices across all scenes, releasing ones included.
    pub fn active_voice_count(&self) -> usize {
        self.scenes.iter().map(|s| s.voices().len()).sum()
    }

    pub fn sounding_voice_count(&self) -> usize {
        self.scenes
            .iter()
            .flat_map(|s| s.voices())
            .filter(|v| v.is_sounding())
            .count()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Switching a scene's play mode releases it.
    pub fn set_scene_config(&mut self, scene: SceneId, config: SceneConfig) -> Result<()> {
        config.validate()?;
        let target = self
            .scenes
            .get_mut(scene)
            .ok_or(cantus_voice::Error::SceneOutOfRange(scene))?;
        let mut cx = scene_cx!(self);
        target.set_config(config, &mut cx);
        self.config.scenes[scene] = config;
        Ok(())
    }

    /// Notes already playing keep the scenes they started in.
    pub fn set_scene_mode(&mut self, mode: SceneMode) -> Result<()> {
        mode.validate()?;
        tracing::debug!("scene mode {:?} -> {:?}", self.config.scene_mode, mode);
        self.router.set_scene_mode(mode);
        self.config.scene_mode = mode;
        Ok(())
    }

    pub fn set_mpe_zone(&mut self, zone: Option<MpeZoneConfig>) {
        self.router.set_mpe(zone);
        self.pedal.set_master_channel(zone.map(|z| z.master_channel));
        self.config.mpe = zone;
    }

    /// Lower zone with 15 member channels, or off.
    pub fn set_mpe_enabled(&mut self, enabled: bool) {
        self.set_mpe_zone(enabled.then(|| MpeZoneConfig::lower(15)));
    }

    #[inline]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    #[inline]
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    fn prune_routes(&mut self) {
        let scenes = &self.scenes;
        self.router
            .prune(|channel, key| scenes.iter().any(|s| s.is_key_held(channel, key)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cantus_voice::{Gate, PlayMode, PriorityMode};

    fn engine() -> SynthEngine {
        SynthEngine::builder().build().unwrap()
    }

    #[test]
    fn test_negative_note_id_means_none() {
        let mut e = engine();
        e.play_note(0, 60, 100, 0.0, -1);
        assert_eq!(e.voices(0).next().unwrap().host_note_id, None);
        e.play_note(0, 62, 100, 0.0, 0);
        assert_eq!(e.voices(0).nth(1).unwrap().host_note_id, Some(0));
    }

    #[test]
    fn test_out_of_range_input_is_ignored() {
        let mut e = engine();
        e.play_note(16, 60, 100, 0.0, None);
        e.play_note(0, 128, 100, 0.0, None);
        e.release_note(0, 99, 0, None);
        e.release_note_by_host_id(5, 0);
        e.pitch_bend(16, 100);
        assert_eq!(e.active_voice_count(), 0);
    }

    #[test]
    fn test_frequency_note() {
        let mut e = engine();
        e.play_note_by_frequency(440.0, 100, 3);
        let voice = e.voices(0).next().unwrap();
        assert_eq!(voice.sounding_key, 69);
        assert!(voice.detune.abs() < 1e-4);

        e.play_note_by_frequency(f32::NAN, 100, 4);
        e.play_note_by_frequency(-1.0, 100, 5);
        assert_eq!(e.active_voice_count(), 1);
    }

    #[test]
    fn test_play_mode_change_releases_scene() {
        let mut e = engine();
        e.play_note(0, 60, 100, 0.0, None);
        e.set_scene_config(0, SceneConfig::mono(PlayMode::Mono, PriorityMode::Latest))
            .unwrap();
        assert_eq!(e.voices(0).next().unwrap().gate, Gate::Releasing);
        assert!(e.held_keys(0).is_empty());
        assert!(e.set_scene_config(2, SceneConfig::default()).is_err());
    }

    #[test]
    fn test_unknown_scene_readouts_are_empty() {
        let e = engine();
        assert_eq!(e.voices(5).count(), 0);
        assert!(e.held_keys(5).is_empty());
        assert_eq!(e.sounding_key(5), None);
        assert_eq!(e.key_summary(5), KeySummary::default());
    }

    #[test]
    fn test_enqueue_after_sender_taken() {
        let mut e = engine();
        let mut tx = e.take_event_sender().unwrap();
        assert!(!e.enqueue(NoteEvent::note_on(0, 0, 60, 100, None)));
        assert!(tx.push(NoteEvent::note_on(0, 0, 60, 100, None)));
        e.process();
        assert_eq!(e.active_voice_count(), 1);
    }
}
