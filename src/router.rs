//! Scene routing for incoming events.
//!
//! Note-ons are routed by the scene mode and the route is captured per (channel, key), so the
//! matching note-off, poly pressure and (under MPE) member-channel bend or pressure reach the
//! scenes the note actually started in, even if the split changed in between.

use cantus_midi::{ChannelRole, MpeChannelMap, MpeZoneConfig, RouteMask, NUM_CHANNELS};
use cantus_voice::{SceneId, NUM_SCENES};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Route mask reaching every scene.
pub const ALL_SCENES: RouteMask = (1u8 << NUM_SCENES) - 1;

/// How note events are spread over the two scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneMode {
    /// Everything plays scene 0.
    #[default]
    Single,
    /// Every note plays both scenes.
    Dual,
    /// Keys below `split_key` play scene 0, the rest scene 1.
    KeySplit { split_key: u8 },
    /// Channels below `split_channel` play scene 0, the rest scene 1.
    ChannelSplit { split_channel: u8 },
}

impl SceneMode {
    pub fn validate(&self) -> Result<()> {
        match *self {
            SceneMode::KeySplit { split_key } if split_key > 127 => Err(Error::InvalidConfig(
                format!("split key {split_key} out of range 0..=127"),
            )),
            SceneMode::ChannelSplit { split_channel }
                if split_channel == 0 || split_channel as usize >= NUM_CHANNELS =>
            {
                Err(Error::InvalidConfig(format!(
                    "split channel {split_channel} out of range 1..=15"
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Where a channel-wide controller (bend, channel pressure) goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRoute {
    /// Every voice of every scene.
    Global,
    /// Voices on that member channel, in these scenes.
    Member(RouteMask),
}

/// Scenes selected by a route mask.
pub fn scenes_in(mask: RouteMask) -> impl Iterator<Item = SceneId> {
    (0..NUM_SCENES).filter(move |&i| mask & (1u8 << i) != 0)
}

#[derive(Debug, Clone)]
pub struct ChannelRouter {
    scene_mode: SceneMode,
    mpe: Option<MpeZoneConfig>,
    bindings: MpeChannelMap,
}

impl ChannelRouter {
    pub fn new(scene_mode: SceneMode, mpe: Option<MpeZoneConfig>) -> Self {
        Self {
            scene_mode,
            mpe,
            bindings: MpeChannelMap::new(),
        }
    }

    #[inline]
    pub fn scene_mode(&self) -> SceneMode {
        self.scene_mode
    }

    /// Takes effect for new note-ons; notes already playing keep their captured route.
    pub fn set_scene_mode(&mut self, scene_mode: SceneMode) {
        self.scene_mode = scene_mode;
    }

    #[inline]
    pub fn mpe(&self) -> Option<&MpeZoneConfig> {
        self.mpe.as_ref()
    }

    pub fn set_mpe(&mut self, mpe: Option<MpeZoneConfig>) {
        self.mpe = mpe;
    }

    /// Route a note-on and remember it.
    pub fn route_note_on(&mut self, channel: u8, key: u8) -> RouteMask {
        let route = self.configured_route(channel, key);
        self.bindings.bind(channel, key, route);
        route
    }

    /// Route of a note already playing: the captured one, else what the mode says now.
    pub fn route_note(&self, channel: u8, key: u8) -> RouteMask {
        self.bindings
            .route_for_key(channel, key)
            .unwrap_or_else(|| self.configured_route(channel, key))
    }

    pub fn route_channel(&self, channel: u8) -> ChannelRoute {
        // Channels outside the zone still carry their own expression
        match self.mpe.map(|zone| zone.role_of(channel)) {
            Some(ChannelRole::Member | ChannelRole::Outside) => ChannelRoute::Member(
                self.bindings
                    .route_for_channel(channel)
                    .unwrap_or(ALL_SCENES),
            ),
            _ => ChannelRoute::Global,
        }
    }

    /// Forget captured routes for notes that no longer hold a key anywhere.
    pub fn prune(&mut self, still_held: impl FnMut(u8, u8) -> bool) {
        self.bindings.retain(still_held);
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
    }

    fn configured_route(&self, channel: u8, key: u8) -> RouteMask {
        match self.scene_mode {
            SceneMode::Single => 0b01,
            SceneMode::Dual => ALL_SCENES,
            SceneMode::KeySplit { split_key } => {
                if key < split_key {
                    0b01
                } else {
                    0b10
                }
            }
            SceneMode::ChannelSplit { split_channel } => {
                if channel < split_channel {
                    0b01
                } else {
                    0b10
                }
            }
        }
    }
}
