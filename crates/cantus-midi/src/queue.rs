//! Lock-free hand-off of timed note events into the audio thread.

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};

use crate::event::NoteEvent;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Producer side -- push events from the host/UI thread.
pub struct EventSender {
    producer: HeapProd<NoteEvent>,
}

impl EventSender {
    /// Returns `false` if the ring buffer is full.
    #[inline]
    pub fn push(&mut self, event: NoteEvent) -> bool {
        let pushed = self.producer.try_push(event).is_ok();
        if !pushed {
            tracing::warn!("note event queue full, dropping {:?}", event.kind);
        }
        pushed
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.producer.vacant_len()
    }
}

/// Consumer side -- drained by the engine once per block, in arrival order.
pub struct EventReceiver {
    consumer: HeapCons<NoteEvent>,
}

impl EventReceiver {
    #[inline]
    pub fn pop(&mut self) -> Option<NoteEvent> {
        self.consumer.try_pop()
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }
}

pub fn event_queue() -> (EventSender, EventReceiver) {
    event_queue_with_capacity(DEFAULT_QUEUE_CAPACITY)
}

pub fn event_queue_with_capacity(capacity: usize) -> (EventSender, EventReceiver) {
    let rb = HeapRb::new(capacity.max(1));
    let (producer, consumer) = rb.split();
    (EventSender { producer }, EventReceiver { consumer })
}
