//! Pitch bend and pressure state, global and per channel.

use cantus_midi::NUM_CHANNELS;

use crate::voice::Voice;

/// Signed 14-bit bend to `[-1, 1)`.
#[inline]
pub fn normalize_bend(value: i16) -> f32 {
    value.clamp(-8192, 8191) as f32 / 8192.0
}

#[inline]
pub fn normalize_pressure(value: u8) -> f32 {
    value.min(127) as f32 / 127.0
}

/// Latest controller values, copied into voices as they start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpressionState {
    pub global_bend: f32,
    pub global_pressure: f32,
    pub channel_bend: [f32; NUM_CHANNELS],
    pub channel_pressure: [f32; NUM_CHANNELS],
}

impl ExpressionState {
    pub fn apply_to(&self, voice: &mut Voice) {
        let ch = (voice.channel as usize).min(NUM_CHANNELS - 1);
        voice.global_bend = self.global_bend;
        voice.global_pressure = self.global_pressure;
        voice.channel_bend = self.channel_bend[ch];
        voice.channel_pressure = self.channel_pressure[ch];
    }
}
