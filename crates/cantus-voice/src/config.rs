//! Per-scene play policy.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on voices per scene.
pub const MAX_VOICES: usize = 64;

/// Number of scenes an engine owns.
pub const NUM_SCENES: usize = 2;

/// Index of a scene (`0..NUM_SCENES`).
pub type SceneId = usize;

/// How a scene turns held keys into voices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayMode {
    /// One voice per note-on, limited by polyphony.
    #[default]
    Poly,
    /// One sounding voice; every new note retriggers.
    Mono,
    /// One sounding voice; overlapping notes glide the existing voice.
    MonoSingleTrigger,
    /// Like `Mono`, gliding only between overlapping notes.
    MonoFingeredPortamento,
    /// Like `MonoSingleTrigger`, gliding only between overlapping notes.
    MonoSingleTriggerFingeredPortamento,
    /// One sounding voice that ignores note-off; the next note-on replaces it.
    Latch,
}

impl PlayMode {
    #[inline]
    pub fn is_poly(self) -> bool {
        self == PlayMode::Poly
    }

    /// The four priority-resolved mono modes (excludes `Latch`).
    #[inline]
    pub fn is_mono(self) -> bool {
        matches!(
            self,
            PlayMode::Mono
                | PlayMode::MonoSingleTrigger
                | PlayMode::MonoFingeredPortamento
                | PlayMode::MonoSingleTriggerFingeredPortamento
        )
    }

    #[inline]
    pub fn is_single_trigger(self) -> bool {
        matches!(
            self,
            PlayMode::MonoSingleTrigger | PlayMode::MonoSingleTriggerFingeredPortamento
        )
    }

    #[inline]
    pub fn is_fingered_portamento(self) -> bool {
        matches!(
            self,
            PlayMode::MonoFingeredPortamento | PlayMode::MonoSingleTriggerFingeredPortamento
        )
    }
}

/// Which held key sounds in a mono scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriorityMode {
    /// A new note always sounds; releasing the sounding key falls back to the highest held key.
    #[default]
    LatestRetriggerHighest,
    Latest,
    Highest,
    Lowest,
}

/// Sustain pedal behavior for mono scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PedalMode {
    /// Every key released under the pedal stays held.
    #[default]
    HoldLatest,
    /// A key released under the pedal is dropped at once if any other key is still held.
    ReleaseIfOthersHeld,
}

/// Initial envelope condition handed to the DSP on a mono retrigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonoEnvelopeMode {
    #[default]
    RestartFromZero,
    RestartFromLatest,
}

/// Poly behavior when a key that already has a voice is struck again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatedKeyMode {
    #[default]
    NewVoiceEveryNoteOn,
    /// Quick-release the key's previous voices first ("piano mode").
    OneVoicePerKey,
}

/// Configuration of one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub play_mode: PlayMode,
    pub priority: PriorityMode,
    pub pedal_mode: PedalMode,
    pub envelope_mode: MonoEnvelopeMode,
    pub repeated_key_mode: RepeatedKeyMode,
    /// Live voice limit. Zero behaves as one.
    pub polyphony: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            play_mode: PlayMode::Poly,
            priority: PriorityMode::LatestRetriggerHighest,
            pedal_mode: PedalMode::HoldLatest,
            envelope_mode: MonoEnvelopeMode::RestartFromZero,
            repeated_key_mode: RepeatedKeyMode::NewVoiceEveryNoteOn,
            polyphony: 16,
        }
    }
}

impl SceneConfig {
    pub fn poly(polyphony: usize) -> Self {
        Self {
            polyphony,
            ..Default::default()
        }
    }

    pub fn mono(play_mode: PlayMode, priority: PriorityMode) -> Self {
        Self {
            play_mode,
            priority,
            ..Default::default()
        }
    }

    pub fn with_pedal_mode(mut self, pedal_mode: PedalMode) -> Self {
        self.pedal_mode = pedal_mode;
        self
    }

    pub fn with_envelope_mode(mut self, envelope_mode: MonoEnvelopeMode) -> Self {
        self.envelope_mode = envelope_mode;
        self
    }

    pub fn with_repeated_key_mode(mut self, repeated_key_mode: RepeatedKeyMode) -> Self {
        self.repeated_key_mode = repeated_key_mode;
        self
    }

    /// The limit actually enforced: `1..=MAX_VOICES`.
    #[inline]
    pub fn effective_polyphony(&self) -> usize {
        self.polyphony.clamp(1, MAX_VOICES)
    }

    pub fn validate(&self) -> Result<()> {
        if self.polyphony > MAX_VOICES {
            return Err(Error::InvalidConfig(format!(
                "polyphony {} exceeds maximum of {MAX_VOICES}",
                self.polyphony
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_classification() {
        assert!(PlayMode::Poly.is_poly());
        assert!(!PlayMode::Latch.is_mono());
        assert!(PlayMode::MonoSingleTriggerFingeredPortamento.is_single_trigger());
        assert!(PlayMode::MonoSingleTriggerFingeredPortamento.is_fingered_portamento());
        assert!(!PlayMode::MonoFingeredPortamento.is_single_trigger());
        assert!(PlayMode::Mono.is_mono());
    }

    #[test]
    fn test_effective_polyphony_never_zero() {
        assert_eq!(SceneConfig::poly(0).effective_polyphony(), 1);
        assert_eq!(SceneConfig::poly(1).effective_polyphony(), 1);
        assert_eq!(SceneConfig::poly(8).effective_polyphony(), 8);
    }

    #[test]
    fn test_validate_rejects_excess_polyphony() {
        assert!(SceneConfig::poly(MAX_VOICES).validate().is_ok());
        assert!(matches!(
            SceneConfig::poly(MAX_VOICES + 1).validate(),
            Err(Error::InvalidConfig(_))
        ));
    }
}
