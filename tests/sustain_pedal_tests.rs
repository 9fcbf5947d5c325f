//! Sustain pedal tests
//!
//! Pedal-held keys, pedal-up release, the two mono pedal modes and MPE master-channel pedal.

mod helpers;

use cantus::prelude::*;
use helpers::*;

// =============================================================================
// Poly
// =============================================================================

#[test]
fn test_pedal_holds_note_past_key_up() {
    init_tracing();
    let mut e = poly_engine(8);
    on(&mut e, 60, 7);
    sustain(&mut e, true);
    off(&mut e, 60, 7);

    assert!(run_blocks(&mut e, 3).is_empty());
    assert_eq!(sounding_keys(&e, 0), vec![60]);
    assert!(e.held_keys(0)[0].pedal_held);

    sustain(&mut e, false);
    let ended = block(&mut e);
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].host_note_id, Some(7));
    assert_eq!(ended[0].original_key, 60);
    assert!(block(&mut e).is_empty());
}

#[test]
fn test_double_strike_under_pedal() {
    let mut e = poly_engine(8);
    sustain(&mut e, true);
    on(&mut e, 60, 1);
    off(&mut e, 60, 1);
    on(&mut e, 60, 2);
    off(&mut e, 60, 2);
    assert_eq!(sounding_keys(&e, 0), vec![60, 60]);
    assert_eq!(e.held_keys(0).len(), 2);

    sustain(&mut e, false);
    let mut ids = ended_ids(&block(&mut e));
    ids.sort();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    assert!(e.held_keys(0).is_empty());
}

#[test]
fn test_pedal_up_spares_pressed_key() {
    let mut e = poly_engine(8);
    sustain(&mut e, true);
    on(&mut e, 60, 1);
    off(&mut e, 60, 1);
    on(&mut e, 60, 2);
    sustain(&mut e, false);

    assert_eq!(ended_ids(&block(&mut e)), vec![Some(1)]);
    let live: Vec<_> = e.voices(0).collect();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].host_note_id, Some(2));
    assert!(live[0].is_sounding());
}

#[test]
fn test_redundant_pedal_events_are_ignored() {
    let mut e = poly_engine(8);
    sustain(&mut e, false);
    on(&mut e, 60, 1);
    sustain(&mut e, true);
    sustain(&mut e, true);
    off(&mut e, 60, 1);
    assert_eq!(sounding_keys(&e, 0), vec![60]);

    sustain(&mut e, false);
    sustain(&mut e, false);
    assert_eq!(ended_ids(&block(&mut e)), vec![Some(1)]);
}

#[test]
fn test_pedal_threshold() {
    let mut e = poly_engine(8);
    e.channel_controller(0, 64, 63);
    on(&mut e, 60, None);
    off(&mut e, 60, None);
    assert!(sounding_keys(&e, 0).is_empty());

    e.channel_controller(0, 64, 64);
    on(&mut e, 62, None);
    off(&mut e, 62, None);
    assert_eq!(sounding_keys(&e, 0), vec![62]);
}

#[test]
fn test_choke_ignores_pedal() {
    let mut e = poly_engine(8);
    sustain(&mut e, true);
    on(&mut e, 60, 3);
    off(&mut e, 60, 3);
    e.choke_note(0, 60, None);
    assert!(e.held_keys(0).is_empty());
    assert_eq!(ended_ids(&block(&mut e)), vec![Some(3)]);

    sustain(&mut e, false);
    assert!(block(&mut e).is_empty());
}

#[test]
fn test_long_pedal_passage_never_drops_notes() {
    let mut e = poly_engine(16);
    sustain(&mut e, true);
    for id in 0..300 {
        let key = 40 + (id % 40) as u8;
        on(&mut e, key, id);
        off(&mut e, key, id);
    }
    let mut ended = ended_ids(&block(&mut e));

    on(&mut e, 100, 9999);
    assert!(e.voices(0).any(|v| v.is_sounding() && v.host_note_id == Some(9999)));

    off(&mut e, 100, 9999);
    sustain(&mut e, false);
    ended.extend(ended_ids(&run_blocks(&mut e, 2)));
    assert_eq!(e.active_voice_count(), 0);
    assert!(e.held_keys(0).is_empty());

    let mut ids: Vec<_> = ended.into_iter().flatten().collect();
    ids.sort();
    let expected: Vec<NoteId> = (0..300).chain([9999]).collect();
    assert_eq!(ids, expected);
}

#[test]
fn test_all_sound_off_lifts_pedal() {
    let mut e = poly_engine(8);
    sustain(&mut e, true);
    on(&mut e, 60, 1);
    e.channel_controller(0, 120, 0);
    assert_eq!(ended_ids(&block(&mut e)), vec![Some(1)]);

    // Pedal state is gone: key-up releases at once
    on(&mut e, 62, 2);
    off(&mut e, 62, 2);
    assert!(sounding_keys(&e, 0).is_empty());
    assert_eq!(ended_ids(&block(&mut e)), vec![Some(2)]);
}

#[test]
fn test_all_notes_off_clears_pedal_held_keys() {
    let mut e = poly_engine(8);
    sustain(&mut e, true);
    on(&mut e, 60, 1);
    off(&mut e, 60, 1);
    on(&mut e, 64, 2);
    e.channel_controller(0, 123, 0);
    assert!(e.held_keys(0).is_empty());
    assert!(sounding_keys(&e, 0).is_empty());

    let mut ids = ended_ids(&block(&mut e));
    ids.sort();
    assert_eq!(ids, vec![Some(1), Some(2)]);
    sustain(&mut e, false);
    assert!(block(&mut e).is_empty());
}

// =============================================================================
// Mono Pedal Modes
// =============================================================================

#[test]
fn test_hold_latest_keeps_released_key_sounding() {
    let mut e = mono_engine(PlayMode::Mono, PriorityMode::LatestRetriggerHighest);
    on(&mut e, 48, None);
    sustain(&mut e, true);
    on(&mut e, 60, None);
    off(&mut e, 60, None);
    assert_eq!(e.sounding_key(0), Some(60));

    sustain(&mut e, false);
    assert_eq!(e.sounding_key(0), Some(48));
}

#[test]
fn test_hold_latest_resolves_across_pedal_held_keys() {
    let mut e = mono_engine(PlayMode::Mono, PriorityMode::Highest);
    sustain(&mut e, true);
    on(&mut e, 60, None);
    off(&mut e, 60, None);
    on(&mut e, 55, None);
    assert_eq!(e.sounding_key(0), Some(60));
    on(&mut e, 72, None);
    off(&mut e, 72, None);
    assert_eq!(e.sounding_key(0), Some(72));

    sustain(&mut e, false);
    assert_eq!(e.sounding_key(0), Some(55));
}

#[test]
fn test_release_if_others_held() {
    let mut e = mono_engine_with_pedal(
        PlayMode::Mono,
        PriorityMode::LatestRetriggerHighest,
        PedalMode::ReleaseIfOthersHeld,
    );
    on(&mut e, 48, None);
    sustain(&mut e, true);
    on(&mut e, 60, None);
    off(&mut e, 60, None);
    assert_eq!(e.sounding_key(0), Some(48));

    off(&mut e, 48, None);
    assert_eq!(e.sounding_key(0), Some(48));
    sustain(&mut e, false);
    assert_eq!(e.sounding_key(0), None);
}

#[test]
fn test_release_if_others_held_ignored_in_poly() {
    let mut e = SynthEngine::builder()
        .poly(8)
        .pedal_mode(PedalMode::ReleaseIfOthersHeld)
        .release_blocks(0)
        .build()
        .unwrap();
    sustain(&mut e, true);
    on(&mut e, 48, None);
    on(&mut e, 60, None);
    off(&mut e, 60, None);
    assert_eq!(sounding_keys(&e, 0), vec![48, 60]);
}

/// Two note-ons for one key arrive with the pedal already down; releases apply in arrival order.
#[test]
fn test_release_if_others_held_same_key_in_one_block() {
    let mut e = mono_engine_with_pedal(
        PlayMode::Mono,
        PriorityMode::LatestRetriggerHighest,
        PedalMode::ReleaseIfOthersHeld,
    );
    sustain(&mut e, true);
    e.enqueue(NoteEvent::note_on(0, 0, 60, 100, Some(1)));
    e.enqueue(NoteEvent::note_on(16, 0, 60, 100, Some(2)));
    e.enqueue(NoteEvent::note_off(32, 0, 60, None));
    e.enqueue(NoteEvent::note_off(48, 0, 60, None));

    // The first note's voice was retriggered away; the second is the last key and stays
    let ended = block(&mut e);
    assert_eq!(ended_ids(&ended), vec![Some(1)]);
    assert_eq!(e.sounding_key(0), Some(60));
    assert_eq!(e.held_keys(0).len(), 1);
    assert_eq!(e.held_keys(0)[0].note_id, Some(2));
    assert!(e.held_keys(0)[0].pedal_held);

    sustain(&mut e, false);
    assert_eq!(ended_ids(&block(&mut e)), vec![Some(2)]);
}

// =============================================================================
// Channels and MPE
// =============================================================================

#[test]
fn test_pedal_is_per_channel_without_mpe() {
    let mut e = poly_engine(8);
    e.play_note(3, 60, 100, 0.0, 1);
    sustain(&mut e, true);
    e.release_note(3, 60, 0, 1);
    assert!(sounding_keys(&e, 0).is_empty());
}

#[test]
fn test_mpe_master_pedal_holds_member_channels() {
    let mut e = SynthEngine::builder()
        .poly(8)
        .mpe(true)
        .release_blocks(0)
        .build()
        .unwrap();
    e.play_note(3, 60, 100, 0.0, 1);
    e.play_note(4, 64, 100, 0.0, 2);
    sustain(&mut e, true);
    e.release_note(3, 60, 0, 1);
    e.release_note(4, 64, 0, 2);
    assert_eq!(sounding_keys(&e, 0), vec![60, 64]);

    sustain(&mut e, false);
    assert_eq!(block(&mut e).len(), 2);
}

#[test]
fn test_release_if_others_held_ignored_under_mpe() {
    let mut e = SynthEngine::builder()
        .mono(PlayMode::Mono)
        .pedal_mode(PedalMode::ReleaseIfOthersHeld)
        .mpe(true)
        .release_blocks(0)
        .build()
        .unwrap();
    e.play_note(1, 48, 100, 0.0, 1);
    sustain(&mut e, true);
    e.play_note(2, 60, 100, 0.0, 2);
    e.release_note(2, 60, 0, 2);
    assert_eq!(sounding_keys(&e, 0), vec![60]);
    assert!(e.held_keys(0).iter().any(|k| k.key == 60 && k.pedal_held));
}
