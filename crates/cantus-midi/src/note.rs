//! Host note identifiers and key/frequency conversion.

use libm::{floorf, log2f, powf};

/// Opaque note identifier supplied by the host.
///
/// Zero is a valid identifier. Absence is expressed as `Option::None`, never as a magic value.
pub type NoteId = i32;

/// Highest MIDI key number.
pub const MAX_KEY: u8 = 127;

/// Number of MIDI channels.
pub const NUM_CHANNELS: usize = 16;

/// Convert a raw wire identifier (negative means "none") into an optional [`NoteId`].
#[inline]
pub fn note_id_from_raw(raw: i32) -> Option<NoteId> {
    (raw >= 0).then_some(raw)
}

/// Convert an optional [`NoteId`] back into the raw wire form (`-1` for none).
#[inline]
pub fn note_id_to_raw(id: Option<NoteId>) -> i32 {
    id.unwrap_or(-1)
}

#[inline]
pub fn key_to_hz(key: f32) -> f32 {
    440.0 * powf(2.0, (key - 69.0) / 12.0)
}

/// Fractional key number for a frequency (A4 = 440 Hz = key 69).
#[inline]
pub fn hz_to_key(hz: f32) -> f32 {
    69.0 + 12.0 * log2f(hz / 440.0)
}

/// Split a frequency into an integer key and a detune in semitones.
///
/// The key is `floor` of the fractional key, clamped to `0..=127`; the detune is the remainder
/// relative to the clamped key. Returns `None` for non-finite or non-positive frequencies.
pub fn frequency_to_key(hz: f32) -> Option<(u8, f32)> {
    if !hz.is_finite() || hz <= 0.0 {
        return None;
    }
    let k = hz_to_key(hz);
    let key = floorf(k).clamp(0.0, MAX_KEY as f32);
    Some((key as u8, k - key))
}
