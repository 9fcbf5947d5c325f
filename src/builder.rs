//! Builder for configuring and constructing a [`SynthEngine`].

use cantus_midi::{MpeZoneConfig, DEFAULT_QUEUE_CAPACITY};
use cantus_voice::{
    PedalMode, PlayMode, PriorityMode, ReleaseTail, SceneConfig, SceneId, VoiceRenderer,
    NUM_SCENES,
};
use serde::{Deserialize, Serialize};

use crate::engine::SynthEngine;
use crate::error::{Error, Result};
use crate::router::SceneMode;

/// Everything needed to construct an engine. Serializable so a host can persist it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub scene_mode: SceneMode,
    /// `None` disables MPE.
    pub mpe: Option<MpeZoneConfig>,
    pub scenes: [SceneConfig; NUM_SCENES],
    /// Blocks a released voice keeps rendering under the default [`ReleaseTail`].
    pub release_blocks: u32,
    pub quick_release_blocks: u32,
    pub queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tail = ReleaseTail::default();
        Self {
            scene_mode: SceneMode::Single,
            mpe: None,
            scenes: [SceneConfig::default(); NUM_SCENES],
            release_blocks: tail.release_blocks,
            quick_release_blocks: tail.quick_release_blocks,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.scene_mode.validate()?;
        for scene in &self.scenes {
            scene.validate()?;
        }
        if self.queue_capacity == 0 {
            return Err(Error::InvalidConfig("queue capacity must be non-zero".into()));
        }
        Ok(())
    }
}

/// Fluent construction of a [`SynthEngine`].
///
/// Play-mode shorthands (`poly`, `mono`, `priority`, `pedal_mode`) apply to every scene; use
/// [`scene`](Self::scene) to configure one scene on its own.
///
/// # Example
///
/// ```ignore
/// use cantus::prelude::*;
///
/// let mut engine = SynthEngine::builder()
///     .mono(PlayMode::MonoSingleTrigger)
///     .priority(PriorityMode::Highest)
///     .pedal_mode(PedalMode::ReleaseIfOthersHeld)
///     .build()?;
///
/// engine.play_note(0, 60, 100, 0.0, 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineBuilder {
    config: EngineConfig,
    bad_scene: Option<SceneId>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: EngineConfig) -> Self {
        Self {
            config,
            bad_scene: None,
        }
    }

    /// Poly play mode with `voices` polyphony.
    pub fn poly(mut self, voices: usize) -> Self {
        for scene in &mut self.config.scenes {
            scene.play_mode = PlayMode::Poly;
            scene.polyphony = voices;
        }
        self
    }

    pub fn mono(mut self, mode: PlayMode) -> Self {
        for scene in &mut self.config.scenes {
            scene.play_mode = mode;
        }
        self
    }

    pub fn priority(mut self, priority: PriorityMode) -> Self {
        for scene in &mut self.config.scenes {
            scene.priority = priority;
        }
        self
    }

    pub fn pedal_mode(mut self, pedal_mode: PedalMode) -> Self {
        for scene in &mut self.config.scenes {
            scene.pedal_mode = pedal_mode;
        }
        self
    }

    pub fn scene(mut self, index: SceneId, config: SceneConfig) -> Self {
        match self.config.scenes.get_mut(index) {
            Some(scene) => *scene = config,
            None => self.bad_scene = Some(index),
        }
        self
    }

    pub fn scene_mode(mut self, mode: SceneMode) -> Self {
        self.config.scene_mode = mode;
        self
    }

    pub fn dual(self) -> Self {
        self.scene_mode(SceneMode::Dual)
    }

    pub fn key_split(self, split_key: u8) -> Self {
        self.scene_mode(SceneMode::KeySplit { split_key })
    }

    pub fn channel_split(self, split_channel: u8) -> Self {
        self.scene_mode(SceneMode::ChannelSplit { split_channel })
    }

    /// Lower zone with all 15 member channels.
    pub fn mpe(mut self, enabled: bool) -> Self {
        self.config.mpe = enabled.then(|| MpeZoneConfig::lower(15));
        self
    }

    pub fn mpe_zone(mut self, zone: MpeZoneConfig) -> Self {
        self.config.mpe = Some(zone);
        self
    }

    /// Default: 8
    pub fn release_blocks(mut self, blocks: u32) -> Self {
        self.config.release_blocks = blocks;
        self
    }

    /// Default: 0
    pub fn quick_release_blocks(mut self, blocks: u32) -> Self {
        self.config.quick_release_blocks = blocks;
        self
    }

    /// Default: 1024
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build with the [`ReleaseTail`] renderer configured by `release_blocks`.
    pub fn build(self) -> Result<SynthEngine> {
        let tail = ReleaseTail::new(self.config.release_blocks, self.config.quick_release_blocks);
        self.build_with_renderer(tail)
    }

    pub fn build_with_renderer<R: VoiceRenderer>(self, renderer: R) -> Result<SynthEngine<R>> {
        if let Some(index) = self.bad_scene {
            return Err(cantus_voice::Error::SceneOutOfRange(index).into());
        }
        SynthEngine::with_renderer(self.config, renderer)
    }
}
