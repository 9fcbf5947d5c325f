//! Test helpers and fixtures for Cantus integration tests
//!
//! Engines here use short release tails so voices finish within a block or two, and every
//! note goes through channel 0 with velocity 100 unless a test says otherwise.

#![allow(dead_code)]

use cantus::prelude::*;

/// Install a test-writer subscriber so `tracing` output shows up under `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Poly engine whose released voices finish on the next block.
pub fn poly_engine(voices: usize) -> SynthEngine {
    SynthEngine::builder()
        .poly(voices)
        .release_blocks(0)
        .build()
        .expect("Failed to create poly engine")
}

pub fn mono_engine(mode: PlayMode, priority: PriorityMode) -> SynthEngine {
    mono_engine_with_pedal(mode, priority, PedalMode::HoldLatest)
}

pub fn mono_engine_with_pedal(
    mode: PlayMode,
    priority: PriorityMode,
    pedal_mode: PedalMode,
) -> SynthEngine {
    SynthEngine::builder()
        .mono(mode)
        .priority(priority)
        .pedal_mode(pedal_mode)
        .release_blocks(0)
        .build()
        .expect("Failed to create mono engine")
}

pub fn on(engine: &mut SynthEngine, key: u8, note_id: impl Into<Option<NoteId>>) {
    engine.play_note(0, key, 100, 0.0, note_id);
}

pub fn off(engine: &mut SynthEngine, key: u8, note_id: impl Into<Option<NoteId>>) {
    engine.release_note(0, key, 0, note_id);
}

pub fn sustain(engine: &mut SynthEngine, down: bool) {
    engine.channel_controller(0, 64, if down { 127 } else { 0 });
}

/// Run one block and return what ended in it.
pub fn block(engine: &mut SynthEngine) -> Vec<EndedNoteEvent> {
    engine.process();
    engine.drain_ended_this_block().collect()
}

/// Run `n` blocks, concatenating what ended.
pub fn run_blocks(engine: &mut SynthEngine, n: usize) -> Vec<EndedNoteEvent> {
    (0..n).flat_map(|_| block(engine)).collect()
}

pub fn ended_ids(events: &[EndedNoteEvent]) -> Vec<Option<NoteId>> {
    events.iter().map(|e| e.host_note_id).collect()
}

/// Keys of the sounding (gated) voices of a scene, oldest first.
pub fn sounding_keys(engine: &SynthEngine, scene: usize) -> Vec<u8> {
    engine
        .voices(scene)
        .filter(|v| v.is_sounding())
        .map(|v| v.sounding_key)
        .collect()
}
