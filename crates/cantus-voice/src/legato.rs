//! Retrigger-or-recycle decisions for mono scenes.

use crate::config::{MonoEnvelopeMode, PlayMode};
use crate::voice::Gate;

/// What a mono note-on does to the scene's voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonoAction {
    /// Start a new voice bound to the new note; earlier voices quick-release.
    Retrigger {
        glide_from: Option<u8>,
        envelope_from_current: bool,
    },
    /// Re-point the sounding voice at the new note and hand it the new identity.
    Recycle { glide_from: u8 },
}

/// How the sounding voice moves to a fallback key after its key was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    pub gate: Gate,
    pub envelope_from_current: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MonoLegatoController {
    /// Last key that sounded in the scene, kept after release for glides.
    last_key: Option<u8>,
}

impl MonoLegatoController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide for a note-on that won priority. `sounding` is the key of the gated voice, if any.
    pub fn note_on(
        &mut self,
        mode: PlayMode,
        envelope_mode: MonoEnvelopeMode,
        sounding: Option<u8>,
        key: u8,
    ) -> MonoAction {
        let action = match sounding {
            Some(from) if mode.is_single_trigger() => MonoAction::Recycle { glide_from: from },
            _ => MonoAction::Retrigger {
                glide_from: self.glide_source(mode, sounding),
                envelope_from_current: envelope_mode == MonoEnvelopeMode::RestartFromLatest,
            },
        };
        self.last_key = Some(key);
        action
    }

    /// Decide for a release that leaves another held key to fall back to.
    pub fn fallback(
        &mut self,
        mode: PlayMode,
        envelope_mode: MonoEnvelopeMode,
        key: u8,
    ) -> Fallback {
        self.last_key = Some(key);
        if mode.is_single_trigger() {
            Fallback {
                gate: Gate::SoundingLegato,
                envelope_from_current: false,
            }
        } else {
            Fallback {
                gate: Gate::SoundingRetriggered,
                envelope_from_current: envelope_mode == MonoEnvelopeMode::RestartFromLatest,
            }
        }
    }

    pub fn last_key(&self) -> Option<u8> {
        self.last_key
    }

    pub fn reset(&mut self) {
        self.last_key = None;
    }

    /// Fingered portamento glides only out of a still-sounding note.
    fn glide_source(&self, mode: PlayMode, sounding: Option<u8>) -> Option<u8> {
        if mode.is_fingered_portamento() {
            sounding
        } else {
            self.last_key
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_trigger_recycles_only_when_sounding() {
        let mut legato = MonoLegatoController::new();
        let env = MonoEnvelopeMode::RestartFromZero;
        assert!(matches!(
            legato.note_on(PlayMode::MonoSingleTrigger, env, None, 60),
            MonoAction::Retrigger { .. }
        ));
        assert_eq!(
            legato.note_on(PlayMode::MonoSingleTrigger, env, Some(60), 65),
            MonoAction::Recycle { glide_from: 60 }
        );
    }

    #[test]
    fn test_plain_mono_always_retriggers() {
        let mut legato = MonoLegatoController::new();
        let env = MonoEnvelopeMode::RestartFromLatest;
        legato.note_on(PlayMode::Mono, env, None, 60);
        assert_eq!(
            legato.note_on(PlayMode::Mono, env, Some(60), 65),
            MonoAction::Retrigger {
                glide_from: Some(60),
                envelope_from_current: true,
            }
        );
    }

    #[test]
    fn test_fingered_portamento_glides_only_legato() {
        let mut legato = MonoLegatoController::new();
        let env = MonoEnvelopeMode::RestartFromZero;
        let mode = PlayMode::MonoFingeredPortamento;
        legato.note_on(mode, env, None, 60);

        // Detached: no glide even though 60 sounded last
        assert!(matches!(
            legato.note_on(mode, env, None, 62),
            MonoAction::Retrigger { glide_from: None, .. }
        ));
        // Overlapping: glide
        assert!(matches!(
            legato.note_on(mode, env, Some(62), 64),
            MonoAction::Retrigger { glide_from: Some(62), .. }
        ));

        // Plain mono glides from the last key even when detached
        let mut legato = MonoLegatoController::new();
        legato.note_on(PlayMode::Mono, env, None, 60);
        assert!(matches!(
            legato.note_on(PlayMode::Mono, env, None, 62),
            MonoAction::Retrigger { glide_from: Some(60), .. }
        ));
    }

    #[test]
    fn test_fallback_gate() {
        let mut legato = MonoLegatoController::new();
        let env = MonoEnvelopeMode::RestartFromZero;
        assert_eq!(
            legato.fallback(PlayMode::MonoSingleTriggerFingeredPortamento, env, 60).gate,
            Gate::SoundingLegato
        );
        assert_eq!(
            legato.fallback(PlayMode::Mono, env, 60).gate,
            Gate::SoundingRetriggered
        );
        assert_eq!(legato.last_key(), Some(60));
    }
}
