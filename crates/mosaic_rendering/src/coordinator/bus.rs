//! Broadcast message bus.
//!
//! ```text
//! ┌──────────┐  post   ┌─────────────┐  pump_messages  ┌──────────┐
//! │  Poster  │────────>│   bounded   │────────────────>│  layers  │
//! │ (clones) │         │   channel   │ (registration   │          │
//! └──────────┘         └─────────────┘     order)      └──────────┘
//! ```
//!
//! Posting never blocks. A full bus drops the message and counts it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use mosaic_shared::LayerMessage;

/// Render-thread end of the bus.
#[derive(Debug)]
pub struct MessageBus {
    sender: Sender<LayerMessage>,
    receiver: Receiver<LayerMessage>,
    dropped: Arc<AtomicU64>,
}

impl MessageBus {
    /// Creates a bus holding at most `capacity` undelivered messages.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a posting handle.
    #[must_use]
    pub fn poster(&self) -> MessagePoster {
        MessagePoster {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Takes every pending message (non-blocking).
    pub fn drain(&self) -> Vec<LayerMessage> {
        let mut messages = Vec::with_capacity(self.receiver.len());
        while let Ok(message) = self.receiver.try_recv() {
            messages.push(message);
        }
        messages
    }

    /// Messages waiting for the next pump.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Messages dropped because the bus was full.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Discards everything pending. Returns how many were discarded.
    pub fn clear(&self) -> usize {
        self.receiver.try_iter().count()
    }
}

/// Cloneable handle for posting messages from any context.
#[derive(Clone, Debug)]
pub struct MessagePoster {
    sender: Sender<LayerMessage>,
    dropped: Arc<AtomicU64>,
}

impl MessagePoster {
    /// Queues a message (non-blocking).
    ///
    /// Returns `false` if the bus is full or the coordinator is gone; the
    /// message is dropped.
    pub fn post(&self, message: LayerMessage) -> bool {
        match self.sender.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(kind = ?message.kind, "message bus full, dropping message");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use mosaic_shared::{MessageKind, MessageOrigin, MessagePayload};

    use super::*;

    fn msg(n: u16) -> LayerMessage {
        LayerMessage::broadcast(MessageKind::Custom(n), MessageOrigin::Host, MessagePayload::None)
    }

    #[test]
    fn test_post_and_drain_in_order() {
        let bus = MessageBus::new(8);
        let poster = bus.poster();
        assert!(poster.post(msg(1)));
        assert!(poster.clone().post(msg(2)));
        assert_eq!(bus.pending_count(), 2);

        let kinds: Vec<_> = bus.drain().into_iter().map(|m| m.kind).collect();
        assert_eq!(kinds, vec![MessageKind::Custom(1), MessageKind::Custom(2)]);
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_full_bus_drops_and_counts() {
        let bus = MessageBus::new(1);
        let poster = bus.poster();
        assert!(poster.post(msg(1)));
        assert!(!poster.post(msg(2)));
        assert_eq!(bus.dropped_count(), 1);
        assert_eq!(bus.clear(), 1);
    }

    #[test]
    fn test_post_from_another_thread() {
        let bus = MessageBus::new(16);
        let poster = bus.poster();
        std::thread::spawn(move || {
            for n in 0..4 {
                poster.post(msg(n));
            }
        })
        .join()
        .unwrap();
        assert_eq!(bus.drain().len(), 4);
    }

    #[test]
    fn test_post_after_bus_dropped() {
        let bus = MessageBus::new(4);
        let poster = bus.poster();
        drop(bus);
        assert!(!poster.post(msg(0)));
    }
}
