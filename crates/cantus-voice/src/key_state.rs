//! Physically held keys, independent of voices.
//!
//! Every note-on adds its own [`HeldKey`] entry, so overlapping note-ons on the same
//! (channel, key) stack instead of overwriting. An entry is dropped only once it is neither
//! pressed nor held by the sustain pedal. Entries stay in press order; the press counter doubles
//! as the [`KeyTicket`] voices use to refer back to the entry that started them.

use cantus_midi::NoteId;
use smallvec::SmallVec;

/// Press-order stamp identifying one [`HeldKey`] entry.
pub type KeyTicket = u64;

/// Tickets removed in one go (pedal-up, choke). Inline for the common case.
pub type TicketList = SmallVec<[KeyTicket; 16]>;

/// Entries reserved up front. The table grows past this, with a warning.
pub const MAX_HELD_KEYS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldKey {
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
    pub note_id: Option<NoteId>,
    /// Key is physically down.
    pub pressed: bool,
    /// Key is up but the sustain pedal keeps it.
    pub pedal_held: bool,
    /// Monotonic press counter, unique per table.
    pub order: KeyTicket,
}

/// Highest, lowest and most recent held key of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeySummary {
    pub highest: Option<u8>,
    pub lowest: Option<u8>,
    pub latest: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct KeyStateTable {
    /// Ascending `order`.
    entries: Vec<HeldKey>,
    next_order: KeyTicket,
}

impl KeyStateTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MAX_HELD_KEYS),
            next_order: 1,
        }
    }

    /// Record a pressed key. Never refuses a note.
    pub fn note_on(
        &mut self,
        channel: u8,
        key: u8,
        velocity: u8,
        note_id: Option<NoteId>,
    ) -> KeyTicket {
        if self.entries.len() == MAX_HELD_KEYS {
            tracing::warn!("more than {MAX_HELD_KEYS} held keys, growing table");
        }
        let order = self.next_order;
        self.next_order += 1;
        self.entries.push(HeldKey {
            channel,
            key,
            velocity,
            note_id,
            pressed: true,
            pedal_held: false,
            order,
        });
        order
    }

    /// Drop pedal-held entries on (channel, key) that no longer drive a voice.
    ///
    /// Called before a re-strike so repeated notes under the pedal keep one entry per key.
    /// Returns how many entries went.
    pub fn collapse_pedal_held(
        &mut self,
        channel: u8,
        key: u8,
        has_voice: impl Fn(KeyTicket) -> bool,
    ) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| {
            !(e.pedal_held && e.channel == channel && e.key == key && !has_voice(e.order))
        });
        before - self.entries.len()
    }

    /// The pressed entry a note-off addresses.
    ///
    /// With a note id the exact entry wins; otherwise (or if no entry carries that id) the oldest
    /// pressed entry for (channel, key).
    pub fn find_pressed(
        &self,
        channel: u8,
        key: u8,
        note_id: Option<NoteId>,
    ) -> Option<KeyTicket> {
        let mut candidates = self
            .entries
            .iter()
            .filter(|e| e.pressed && e.channel == channel && e.key == key);
        if let Some(id) = note_id {
            if let Some(exact) = candidates.clone().find(|e| e.note_id == Some(id)) {
                return Some(exact.order);
            }
        }
        candidates.next().map(|e| e.order)
    }

    /// The oldest pressed entry with this note id, preferring `channel`.
    pub fn find_pressed_by_id(&self, note_id: NoteId, channel: u8) -> Option<KeyTicket> {
        let mut with_id = self
            .entries
            .iter()
            .filter(|e| e.pressed && e.note_id == Some(note_id));
        with_id
            .clone()
            .find(|e| e.channel == channel)
            .or_else(|| with_id.next())
            .map(|e| e.order)
    }

    /// Every entry (pressed or pedal-held) on (channel, key), optionally only those with `note_id`.
    pub fn find_all(&self, channel: u8, key: u8, note_id: Option<NoteId>) -> TicketList {
        self.entries
            .iter()
            .filter(|e| e.channel == channel && e.key == key)
            .filter(|e| note_id.is_none() || e.note_id == note_id)
            .map(|e| e.order)
            .collect()
    }

    #[inline]
    pub fn get(&self, ticket: KeyTicket) -> Option<&HeldKey> {
        self.index_of(ticket).map(|i| &self.entries[i])
    }

    /// Key released while the pedal is down.
    pub fn hold(&mut self, ticket: KeyTicket) {
        if let Some(i) = self.index_of(ticket) {
            let entry = &mut self.entries[i];
            entry.pressed = false;
            entry.pedal_held = true;
        }
    }

    pub fn remove(&mut self, ticket: KeyTicket) -> Option<HeldKey> {
        self.index_of(ticket).map(|i| self.entries.remove(i))
    }

    /// Drop every pedal-held entry whose channel is no longer held, returning their tickets.
    pub fn take_pedal_held(&mut self, still_held: impl Fn(u8) -> bool) -> TicketList {
        let mut removed = TicketList::new();
        self.entries.retain(|e| {
            let drop = e.pedal_held && !e.pressed && !still_held(e.channel);
            if drop {
                removed.push(e.order);
            }
            !drop
        });
        removed
    }

    /// Whether any entry other than `ticket` is pressed or pedal-held.
    pub fn has_other(&self, ticket: KeyTicket) -> bool {
        self.entries.iter().any(|e| e.order != ticket)
    }

    /// Live entries in press order.
    #[inline]
    pub fn entries(&self) -> &[HeldKey] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn summary(&self) -> KeySummary {
        KeySummary {
            highest: self.entries.iter().map(|e| e.key).max(),
            lowest: self.entries.iter().map(|e| e.key).min(),
            latest: self.entries.last().map(|e| e.key),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn index_of(&self, ticket: KeyTicket) -> Option<usize> {
        self.entries.binary_search_by_key(&ticket, |e| e.order).ok()
    }
}

impl Default for KeyStateTable {
    fn default() -> Self {
        Self::new()
    }
}
