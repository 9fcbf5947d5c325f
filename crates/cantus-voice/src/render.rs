//! Boundary to the DSP collaborator that renders voices.
//!
//! The engine owns voice lifetimes but not envelopes, so once per block it asks the renderer
//! whether each live voice is still producing sound. A voice reported finished becomes `Dead`.

use crate::config::SceneId;
use crate::voice::{Gate, Voice};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceActivity {
    Active,
    Finished,
}

pub trait VoiceRenderer {
    /// Render one block of `voice` and report whether it is still audible.
    fn render(&mut self, scene: SceneId, voice: &Voice) -> VoiceActivity;
}

impl<F> VoiceRenderer for F
where
    F: FnMut(SceneId, &Voice) -> VoiceActivity,
{
    fn render(&mut self, scene: SceneId, voice: &Voice) -> VoiceActivity {
        self(scene, voice)
    }
}

/// Renderer without audio: a release lasts a fixed number of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseTail {
    pub release_blocks: u32,
    pub quick_release_blocks: u32,
}

impl ReleaseTail {
    pub fn new(release_blocks: u32, quick_release_blocks: u32) -> Self {
        Self {
            release_blocks,
            quick_release_blocks,
        }
    }
}

impl Default for ReleaseTail {
    fn default() -> Self {
        Self::new(8, 0)
    }
}

impl VoiceRenderer for ReleaseTail {
    fn render(&mut self, _scene: SceneId, voice: &Voice) -> VoiceActivity {
        let tail = if voice.quick_release {
            self.quick_release_blocks
        } else {
            self.release_blocks
        };
        match voice.gate {
            Gate::Releasing if voice.release_age >= tail => VoiceActivity::Finished,
            Gate::Dead => VoiceActivity::Finished,
            _ => VoiceActivity::Active,
        }
    }
}
