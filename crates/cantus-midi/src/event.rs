//! Note events with sample-accurate timing and host note identity.
//!
//! [`NoteEvent`] is what the voice engine consumes. [`MidiEvent`] is a thin wrapper over a parsed
//! `midi-msg` channel voice message, convertible into a [`NoteEvent`] for hosts that only speak
//! MIDI 1.0 (and therefore carry no note ids).

use midi_msg::{Channel, ChannelModeMsg, ChannelVoiceMsg, ControlChange, MidiMsg};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::note::NoteId;

/// Sustain pedal controller number.
pub const CC_SUSTAIN: u8 = 64;
/// All Sound Off controller number.
pub const CC_ALL_SOUND_OFF: u8 = 120;
/// All Notes Off controller number.
pub const CC_ALL_NOTES_OFF: u8 = 123;

/// What happened, addressed by channel/key and optional host note id.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NoteEventKind {
    NoteOn {
        channel: u8,
        key: u8,
        velocity: u8,
        /// Semitone offset carried through to the voice.
        detune: f32,
        note_id: Option<NoteId>,
    },
    /// `note_id: None` releases the oldest pressed entry for the key.
    NoteOff {
        channel: u8,
        key: u8,
        velocity: u8,
        note_id: Option<NoteId>,
    },
    NoteOffById {
        note_id: NoteId,
        channel: u8,
    },
    NoteOnFrequency {
        frequency: f32,
        velocity: u8,
        note_id: Option<NoteId>,
    },
    Choke {
        channel: u8,
        key: u8,
        note_id: Option<NoteId>,
    },
    Control {
        channel: u8,
        cc: u8,
        value: u8,
    },
    /// Signed 14-bit bend, `-8192..=8191`.
    PitchBend {
        channel: u8,
        value: i16,
    },
    ChannelPressure {
        channel: u8,
        value: u8,
    },
    PolyPressure {
        channel: u8,
        key: u8,
        value: u8,
    },
}

/// RT-safe event with sample-accurate frame offset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Offset within the current buffer (0 = first sample).
    pub frame_offset: usize,
    pub kind: NoteEventKind,
}

impl NoteEvent {
    #[inline]
    pub fn new(frame_offset: usize, kind: NoteEventKind) -> Self {
        Self { frame_offset, kind }
    }

    #[inline]
    pub fn note_on(
        frame_offset: usize,
        channel: u8,
        key: u8,
        velocity: u8,
        note_id: Option<NoteId>,
    ) -> Self {
        Self::new(
            frame_offset,
            NoteEventKind::NoteOn {
                channel,
                key,
                velocity,
                detune: 0.0,
                note_id,
            },
        )
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, key: u8, note_id: Option<NoteId>) -> Self {
        Self::new(
            frame_offset,
            NoteEventKind::NoteOff {
                channel,
                key,
                velocity: 0,
                note_id,
            },
        )
    }

    #[inline]
    pub fn note_off_by_id(frame_offset: usize, note_id: NoteId, channel: u8) -> Self {
        Self::new(frame_offset, NoteEventKind::NoteOffById { note_id, channel })
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self::new(frame_offset, NoteEventKind::Control { channel, cc, value })
    }

    #[inline]
    pub fn sustain(frame_offset: usize, channel: u8, down: bool) -> Self {
        Self::control_change(frame_offset, channel, CC_SUSTAIN, if down { 127 } else { 0 })
    }

    #[inline]
    pub fn pitch_bend(frame_offset: usize, channel: u8, value: i16) -> Self {
        Self::new(frame_offset, NoteEventKind::PitchBend { channel, value })
    }

    /// Convert a MIDI 1.0 message. MIDI 1.0 carries no note ids, so they are all `None`.
    pub fn from_midi(event: &MidiEvent) -> Result<Self> {
        let channel = event.channel_num();
        let kind = match event.msg {
            ChannelVoiceMsg::NoteOn { note, velocity: 0 } => NoteEventKind::NoteOff {
                channel,
                key: note,
                velocity: 0,
                note_id: None,
            },
            ChannelVoiceMsg::NoteOn { note, velocity } => NoteEventKind::NoteOn {
                channel,
                key: note,
                velocity,
                detune: 0.0,
                note_id: None,
            },
            ChannelVoiceMsg::NoteOff { note, velocity } => NoteEventKind::NoteOff {
                channel,
                key: note,
                velocity,
                note_id: None,
            },
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control, value },
            } => NoteEventKind::Control {
                channel,
                cc: control,
                value,
            },
            ChannelVoiceMsg::PitchBend { bend } => NoteEventKind::PitchBend {
                channel,
                value: bend_to_signed(bend),
            },
            ChannelVoiceMsg::ChannelPressure { pressure } => NoteEventKind::ChannelPressure {
                channel,
                value: pressure,
            },
            ChannelVoiceMsg::PolyPressure { note, pressure } => NoteEventKind::PolyPressure {
                channel,
                key: note,
                value: pressure,
            },
            ChannelVoiceMsg::ProgramChange { .. } => {
                return Err(Error::UnsupportedMessage("program change"))
            }
            _ => return Err(Error::UnsupportedMessage("channel voice message")),
        };
        Ok(Self::new(event.frame_offset, kind))
    }

    /// Channel this event is addressed to, if it has one.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        match self.kind {
            NoteEventKind::NoteOn { channel, .. }
            | NoteEventKind::NoteOff { channel, .. }
            | NoteEventKind::NoteOffById { channel, .. }
            | NoteEventKind::Choke { channel, .. }
            | NoteEventKind::Control { channel, .. }
            | NoteEventKind::PitchBend { channel, .. }
            | NoteEventKind::ChannelPressure { channel, .. }
            | NoteEventKind::PolyPressure { channel, .. } => Some(channel),
            NoteEventKind::NoteOnFrequency { .. } => None,
        }
    }
}

impl TryFrom<MidiEvent> for NoteEvent {
    type Error = Error;

    fn try_from(event: MidiEvent) -> Result<Self> {
        NoteEvent::from_midi(&event)
    }
}

/// Unsigned 14-bit MIDI bend (center 8192) to signed (center 0).
#[inline]
pub fn bend_to_signed(bend: u16) -> i16 {
    (bend.min(0x3FFF) as i32 - 8192) as i16
}

/// Parsed MIDI 1.0 channel voice message with sample-accurate frame offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    pub frame_offset: usize,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl MidiEvent {
    #[inline]
    pub fn new(frame_offset: usize, channel: Channel, msg: ChannelVoiceMsg) -> Self {
        Self {
            frame_offset,
            channel,
            msg,
        }
    }

    #[inline]
    pub fn note_on(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOn { note, velocity },
        )
    }

    #[inline]
    pub fn note_off(frame_offset: usize, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOff { note, velocity },
        )
    }

    #[inline]
    pub fn control_change(frame_offset: usize, channel: u8, cc: u8, value: u8) -> Self {
        Self::new(
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::ControlChange {
                control: ControlChange::CC { control: cc, value },
            },
        )
    }

    #[inline]
    pub fn pitch_bend(frame_offset: usize, channel: u8, bend: u16) -> Self {
        Self::new(
            frame_offset,
            Channel::from_u8(channel),
            ChannelVoiceMsg::PitchBend { bend },
        )
    }

    #[inline]
    pub fn channel_num(&self) -> u8 {
        self.channel as u8
    }

    /// Parse raw bytes. All Sound Off and All Notes Off come back as their controller numbers;
    /// other channel mode and system messages are rejected.
    pub fn from_bytes_with_offset(bytes: &[u8], frame_offset: usize) -> Result<Self> {
        let (msg, _len) = MidiMsg::from_midi(bytes)?;
        let as_cc = |control: u8| ChannelVoiceMsg::ControlChange {
            control: ControlChange::CC { control, value: 0 },
        };
        match msg {
            MidiMsg::ChannelVoice { channel, msg } => Ok(Self::new(frame_offset, channel, msg)),
            MidiMsg::ChannelMode {
                channel,
                msg: ChannelModeMsg::AllSoundOff,
            } => Ok(Self::new(frame_offset, channel, as_cc(CC_ALL_SOUND_OFF))),
            MidiMsg::ChannelMode {
                channel,
                msg: ChannelModeMsg::AllNotesOff,
            } => Ok(Self::new(frame_offset, channel, as_cc(CC_ALL_NOTES_OFF))),
            _ => Err(Error::UnsupportedMessage("not a channel voice message")),
        }
    }
}
