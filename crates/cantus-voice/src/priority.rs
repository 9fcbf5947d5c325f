//! Which held key sounds in a mono scene.

use crate::config::PriorityMode;
use crate::key_state::HeldKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotePriorityResolver {
    mode: PriorityMode,
}

impl NotePriorityResolver {
    pub fn new(mode: PriorityMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> PriorityMode {
        self.mode
    }

    /// Whether a new note-on takes over the scene. Highest/lowest refuse a key that is
    /// outranked by another held key; the key is still tracked.
    pub fn admits(&self, incoming: &HeldKey, held: &[HeldKey]) -> bool {
        let mut others = held.iter().filter(|e| e.order != incoming.order);
        match self.mode {
            PriorityMode::LatestRetriggerHighest | PriorityMode::Latest => true,
            PriorityMode::Highest => others.all(|e| e.key <= incoming.key),
            PriorityMode::Lowest => others.all(|e| e.key >= incoming.key),
        }
    }

    /// The key that should sound once the sounding one is gone; `None` for an empty set.
    ///
    /// `held` must be in press order. Ties on pitch go to the most recent press.
    pub fn resolve<'a>(&self, held: &'a [HeldKey]) -> Option<&'a HeldKey> {
        match self.mode {
            PriorityMode::LatestRetriggerHighest | PriorityMode::Highest => {
                held.iter().max_by_key(|e| (e.key, e.order))
            }
            PriorityMode::Lowest => held
                .iter()
                .min_by_key(|e| (e.key, std::cmp::Reverse(e.order))),
            PriorityMode::Latest => held.iter().max_by_key(|e| e.order),
        }
    }
}
