//! Event queue feeding the single dispatch thread.
//!
//! Tiles acquire asynchronous resources (sensor streams, observers) while
//! listening, but their callbacks must not mutate shared panel state from
//! foreign threads. Instead they clone a [`PanelSender`] and post events;
//! the owner of the panel loop drains the queue on the dispatch thread.

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use slate_events::{ConfigChange, DomainEvent, LockState, TileEvent, TileKey};

/// An event waiting for the dispatch thread.
#[derive(Debug, Clone)]
pub enum PanelEvent {
    Targeted { key: TileKey, event: TileEvent },
    Broadcast(DomainEvent),
    ConfigChanged(ConfigChange),
    LockChanged(LockState),
}

/// Cloneable posting handle; safe from any thread.
#[derive(Clone)]
pub struct PanelSender {
    tx: Sender<PanelEvent>,
}

impl PanelSender {
    /// Post an event; a send after the queue's owner is gone is quietly
    /// dropped (late callbacks from destroyed tiles land here).
    pub fn post(&self, event: PanelEvent) {
        if self.tx.send(event).is_err() {
            log::debug!("EventQueue: dropping event posted after shutdown");
        }
    }

    pub fn post_targeted(&self, key: TileKey, event: TileEvent) {
        self.post(PanelEvent::Targeted { key, event });
    }

    pub fn post_broadcast(&self, event: DomainEvent) {
        self.post(PanelEvent::Broadcast(event));
    }
}

/// The queue itself, owned by whoever runs the dispatch loop.
pub struct EventQueue {
    tx: Sender<PanelEvent>,
    rx: Receiver<PanelEvent>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> PanelSender {
        PanelSender {
            tx: self.tx.clone(),
        }
    }

    /// Pop the next pending event without blocking.
    pub fn try_next(&self) -> Option<PanelEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain everything currently pending.
    pub fn drain(&self) -> Vec<PanelEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn posted_events_come_back_in_order() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        sender.post_targeted(TileKey::from("a"), TileEvent::Click);
        sender.post_broadcast(DomainEvent::BatteryChanged {
            level: 10,
            charging: true,
        });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert!(matches!(drained[0], PanelEvent::Targeted { .. }));
        assert!(matches!(drained[1], PanelEvent::Broadcast(_)));
        assert!(queue.try_next().is_none());
    }

    #[test]
    fn senders_work_across_threads() {
        let queue = EventQueue::new();
        let sender = queue.sender();
        let handle = std::thread::spawn(move || {
            sender.post(PanelEvent::LockChanged(LockState {
                showing: true,
                ..Default::default()
            }));
        });
        handle.join().unwrap();
        assert!(matches!(
            queue.try_next(),
            Some(PanelEvent::LockChanged(lock)) if lock.showing
        ));
    }
}
