//! Property-based tests for the voice engine.
//!
//! Random note, pedal and choke sequences check that host note ids are reported exactly once,
//! that polyphony limits hold, and that mono priority picks the right key.

mod helpers;

use std::collections::HashMap;

use cantus::prelude::*;
use helpers::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    On(u8),
    Off(u8),
    OffById(usize),
    Pedal(bool),
    Choke(u8),
    Block,
}

fn op() -> impl Strategy<Value = Op> {
    // Few keys so entries stack and collide
    let key = 60u8..66;
    prop_oneof![
        4 => key.clone().prop_map(Op::On),
        3 => key.clone().prop_map(Op::Off),
        1 => (0usize..32).prop_map(Op::OffById),
        1 => any::<bool>().prop_map(Op::Pedal),
        1 => key.prop_map(Op::Choke),
        2 => Just(Op::Block),
    ]
}

fn distinct(keys: Vec<u8>) -> Vec<u8> {
    let mut seen = [false; 128];
    keys.into_iter()
        .filter(|&k| !std::mem::replace(&mut seen[k as usize], true))
        .collect()
}

/// Distinct keys in press order, plus the same keys in a release order.
fn press_and_release() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
    prop::collection::vec(0u8..128, 1..12)
        .prop_map(distinct)
        .prop_flat_map(|keys| (Just(keys.clone()), Just(keys).prop_shuffle()))
}

/// Apply `ops`, giving every note-on a fresh id. Returns how often each id ended and how many
/// ids were handed out.
fn run(
    engine: &mut SynthEngine,
    ops: &[Op],
    mut check: impl FnMut(&SynthEngine),
) -> (HashMap<NoteId, usize>, NoteId) {
    let mut ended = HashMap::new();
    let mut next_id: NoteId = 0;
    let mut record = |events: Vec<EndedNoteEvent>| {
        for id in events.into_iter().filter_map(|e| e.host_note_id) {
            *ended.entry(id).or_insert(0) += 1;
        }
    };

    for op in ops {
        match *op {
            Op::On(key) => {
                on(engine, key, next_id);
                next_id += 1;
            }
            Op::Off(key) => off(engine, key, None),
            Op::OffById(id) => engine.release_note_by_host_id(id as NoteId, 0),
            Op::Pedal(down) => sustain(engine, down),
            Op::Choke(key) => engine.choke_note(0, key, None),
            Op::Block => record(block(engine)),
        }
        check(engine);
    }
    engine.all_sound_off();
    record(block(engine));
    record(block(engine));
    (ended, next_id)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// In poly mode every note gets a voice, so every id ends exactly once and the voice
    /// count never exceeds the polyphony.
    #[test]
    fn poly_ids_end_exactly_once(
        polyphony in 1usize..6,
        release_blocks in 0u32..3,
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut engine = SynthEngine::builder()
            .poly(polyphony)
            .release_blocks(release_blocks)
            .build()
            .unwrap();

        let (ended, issued) = run(&mut engine, &ops, |e| {
            assert!(e.active_voice_count() <= polyphony);
        });

        prop_assert_eq!(engine.active_voice_count(), 0);
        prop_assert_eq!(ended.len(), issued as usize);
        for (id, count) in &ended {
            prop_assert!(*id < issued, "unknown id {} reported", id);
            prop_assert_eq!(*count, 1, "id {} reported {} times", id, count);
        }
    }

    /// Mono modes keep at most one sounding voice and never report an id twice.
    #[test]
    fn mono_ids_end_at_most_once(
        mode in prop::sample::select(vec![
            PlayMode::Mono,
            PlayMode::MonoSingleTrigger,
            PlayMode::MonoFingeredPortamento,
            PlayMode::MonoSingleTriggerFingeredPortamento,
        ]),
        priority in prop::sample::select(vec![
            PriorityMode::LatestRetriggerHighest,
            PriorityMode::Latest,
            PriorityMode::Highest,
            PriorityMode::Lowest,
        ]),
        pedal_mode in prop::sample::select(vec![
            PedalMode::HoldLatest,
            PedalMode::ReleaseIfOthersHeld,
        ]),
        ops in prop::collection::vec(op(), 1..80),
    ) {
        let mut engine = mono_engine_with_pedal(mode, priority, pedal_mode);

        let (ended, issued) = run(&mut engine, &ops, |e| {
            assert!(e.sounding_voice_count() <= 1);
        });

        prop_assert_eq!(engine.active_voice_count(), 0);
        for (id, count) in &ended {
            prop_assert!(*id < issued);
            prop_assert_eq!(*count, 1, "id {} reported {} times", id, count);
        }
    }

    /// Without releases, the last `polyphony` notes survive and the rest are stolen first-in
    /// first-out.
    #[test]
    fn poly_steals_oldest_first(
        polyphony in 1usize..8,
        keys in prop::collection::vec(0u8..128, 1..20),
    ) {
        let mut engine = poly_engine(polyphony);
        for (id, &key) in keys.iter().enumerate() {
            on(&mut engine, key, id as NoteId);
        }

        let stolen = keys.len().saturating_sub(polyphony);
        prop_assert_eq!(sounding_keys(&engine, 0), keys[stolen..].to_vec());

        let expected: Vec<_> = (0..stolen).map(|id| Some(id as NoteId)).collect();
        prop_assert_eq!(ended_ids(&block(&mut engine)), expected);
    }

    /// Highest, Lowest and Latest follow the held set through any release order.
    #[test]
    fn mono_priority_tracks_held_set((pressed, released) in press_and_release()) {
        for priority in [PriorityMode::Highest, PriorityMode::Lowest, PriorityMode::Latest] {
            let mut engine = mono_engine(PlayMode::Mono, priority);
            let mut held = Vec::new();
            let pick = |held: &[u8]| match priority {
                PriorityMode::Highest => held.iter().max().copied(),
                PriorityMode::Lowest => held.iter().min().copied(),
                _ => held.last().copied(),
            };

            for &key in &pressed {
                on(&mut engine, key, None);
                held.push(key);
                let expected = pick(&held);
                prop_assert_eq!(engine.sounding_key(0), expected, "{:?} press {}", priority, key);
            }
            for &key in &released {
                off(&mut engine, key, None);
                held.retain(|&k| k != key);
                let expected = pick(&held);
                prop_assert_eq!(engine.sounding_key(0), expected, "{:?} release {}", priority, key);
            }
            prop_assert!(engine.held_keys(0).is_empty());
        }
    }
}
