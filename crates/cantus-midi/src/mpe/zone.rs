//! MPE zone layout: which channel is the master and which are member channels.

use serde::{Deserialize, Serialize};

use crate::NUM_CHANNELS;

/// Which end of the channel range a zone occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MpeZone {
    /// Master on channel 0, members counting up from channel 1.
    Lower,
    /// Master on channel 15, members counting down from channel 14.
    Upper,
}

/// How a channel takes part in a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelRole {
    /// Zone-wide controllers: bend, pressure and sustain here apply to every note.
    Master,
    /// Carries one note at a time; its bend and pressure belong to that note.
    Member,
    /// Not part of the zone.
    Outside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpeZoneConfig {
    pub zone: MpeZone,
    pub master_channel: u8,
    /// Number of member channels, `1..=15`.
    pub member_count: u8,
}

impl MpeZoneConfig {
    pub fn lower(member_count: u8) -> Self {
        Self::new(MpeZone::Lower, member_count)
    }

    pub fn upper(member_count: u8) -> Self {
        Self::new(MpeZone::Upper, member_count)
    }

    fn new(zone: MpeZone, member_count: u8) -> Self {
        let master_channel = match zone {
            MpeZone::Lower => 0,
            MpeZone::Upper => (NUM_CHANNELS - 1) as u8,
        };
        Self {
            zone,
            master_channel,
            member_count: member_count.clamp(1, (NUM_CHANNELS - 1) as u8),
        }
    }

    pub fn role_of(&self, channel: u8) -> ChannelRole {
        if channel == self.master_channel {
            ChannelRole::Master
        } else if self.members().contains(&channel) {
            ChannelRole::Member
        } else {
            ChannelRole::Outside
        }
    }

    #[inline]
    pub fn is_master_channel(&self, channel: u8) -> bool {
        channel == self.master_channel
    }

    /// Member channels, lowest first.
    pub fn members(&self) -> std::ops::RangeInclusive<u8> {
        match self.zone {
            MpeZone::Lower => 1..=self.member_count,
            MpeZone::Upper => (self.master_channel - self.member_count)..=(self.master_channel - 1),
        }
    }
}

impl Default for MpeZoneConfig {
    fn default() -> Self {
        Self::lower(15)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_zone_roles() {
        let zone = MpeZoneConfig::lower(10);
        assert_eq!(zone.role_of(0), ChannelRole::Master);
        assert_eq!(zone.role_of(1), ChannelRole::Member);
        assert_eq!(zone.role_of(10), ChannelRole::Member);
        assert_eq!(zone.role_of(11), ChannelRole::Outside);
    }

    #[test]
    fn test_upper_zone_members_count_down() {
        let zone = MpeZoneConfig::upper(5);
        assert!(zone.is_master_channel(15));
        assert_eq!(zone.members(), 10..=14);
        assert_eq!(zone.role_of(9), ChannelRole::Outside);
    }

    #[test]
    fn test_member_count_is_clamped() {
        assert_eq!(MpeZoneConfig::lower(0).member_count, 1);
        assert_eq!(MpeZoneConfig::upper(40).members(), 0..=14);
        assert_eq!(MpeZoneConfig::default().members(), 1..=15);
    }
}
