//! Per-channel sustain pedal (CC 64) state.

use cantus_midi::NUM_CHANNELS;

/// What a CC 64 message did to the pedal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PedalChange {
    Pressed,
    Released,
    /// Redundant message or out-of-range channel.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct SustainPedalController {
    down: [bool; NUM_CHANNELS],
    /// MPE master channel: its pedal holds notes on every channel.
    master_channel: Option<u8>,
}

impl SustainPedalController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a sustain controller value; `value >= 64` is down.
    pub fn on_controller(&mut self, channel: u8, value: u8) -> PedalChange {
        let Some(slot) = self.down.get_mut(channel as usize) else {
            return PedalChange::Unchanged;
        };
        let down = value >= 64;
        if *slot == down {
            let state = if down { "down" } else { "up" };
            tracing::trace!("redundant sustain {state} on channel {channel}");
            return PedalChange::Unchanged;
        }
        *slot = down;
        if down {
            PedalChange::Pressed
        } else {
            PedalChange::Released
        }
    }

    #[inline]
    pub fn is_down(&self, channel: u8) -> bool {
        self.down.get(channel as usize).copied().unwrap_or(false)
    }

    /// Whether a key released on `channel` would be kept by a pedal.
    #[inline]
    pub fn is_holding(&self, channel: u8) -> bool {
        self.is_down(channel) || self.master_channel.is_some_and(|m| self.is_down(m))
    }

    pub fn set_master_channel(&mut self, channel: Option<u8>) {
        self.master_channel = channel;
    }

    pub fn reset(&mut self) {
        self.down = [false; NUM_CHANNELS];
    }
}
