//! MPE (MIDI Polyphonic Expression) zone layout and member-channel bindings.

mod channel_map;
mod zone;

pub use channel_map::{MpeChannelMap, RouteMask};
pub use zone::{ChannelRole, MpeZone, MpeZoneConfig};
