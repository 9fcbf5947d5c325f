//! Member-channel note bindings captured at note-on.
//!
//! Under MPE each sounding note owns a member channel. The route a note-on took (a bitmask of
//! destinations chosen by the caller) is remembered per (channel, key), so a later note-off, bend
//! or pressure on that channel reaches the same destinations even if the routing rules changed.

use crate::note::NUM_CHANNELS;

/// Bitmask of destinations. Bit `n` set means destination `n`.
pub type RouteMask = u8;

#[derive(Debug, Clone)]
pub struct MpeChannelMap {
    /// (channel, key) → route captured at note-on, 0 when unbound.
    routes: [[RouteMask; 128]; NUM_CHANNELS],
    /// Bound keys per channel.
    bound: [u8; NUM_CHANNELS],
}

impl MpeChannelMap {
    pub fn new() -> Self {
        Self {
            routes: [[0; 128]; NUM_CHANNELS],
            bound: [0; NUM_CHANNELS],
        }
    }

    /// Remember the route a note-on took. Repeated note-ons on a bound key widen its route.
    pub fn bind(&mut self, channel: u8, key: u8, route: RouteMask) {
        if key >= 128 {
            return;
        }
        let Some(row) = self.routes.get_mut(channel as usize) else {
            return;
        };
        let slot = &mut row[key as usize];
        if *slot == 0 && route != 0 {
            self.bound[channel as usize] += 1;
        }
        *slot |= route;
    }

    /// Route for a note-off without clearing (the key may still have stacked notes).
    pub fn route_for_key(&self, channel: u8, key: u8) -> Option<RouteMask> {
        let route = *self.routes.get(channel as usize)?.get(key as usize)?;
        (route != 0).then_some(route)
    }

    /// Union of the routes of every key bound on a channel. `None` if the channel is idle.
    pub fn route_for_channel(&self, channel: u8) -> Option<RouteMask> {
        let row = self.routes.get(channel as usize)?;
        if self.bound[channel as usize] == 0 {
            return None;
        }
        Some(row.iter().fold(0, |acc, r| acc | r))
    }

    /// Drop every binding for which `keep(channel, key)` is false.
    pub fn retain(&mut self, mut keep: impl FnMut(u8, u8) -> bool) {
        for (channel, row) in self.routes.iter_mut().enumerate() {
            if self.bound[channel] == 0 {
                continue;
            }
            for (key, slot) in row.iter_mut().enumerate() {
                if *slot != 0 && !keep(channel as u8, key as u8) {
                    *slot = 0;
                    self.bound[channel] -= 1;
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.routes = [[0; 128]; NUM_CHANNELS];
        self.bound = [0; NUM_CHANNELS];
    }
}

impl Default for MpeChannelMap {
    fn default() -> Self {
        Self::new()
    }
}
