use dashmap::DashMap;
use doh_relay_application::ports::ControlBroadcaster;
use doh_relay_domain::ControlEvent;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

pub type ConnectionId = u64;

/// Outbound queues of every connected controller.
///
/// `broadcast` hands the event to each queue independently; a queue whose
/// writer is gone is dropped from the registry without affecting the others.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ControlEvent>>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ControlEvent>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.insert(id, tx);
        debug!(connection = id, "Controller connected");
        (id, rx)
    }

    pub fn unregister(&self, id: ConnectionId) {
        if self.connections.remove(&id).is_some() {
            debug!(connection = id, "Controller disconnected");
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl ControlBroadcaster for ConnectionRegistry {
    fn broadcast(&self, event: ControlEvent) -> usize {
        let mut delivered = 0;
        let mut dead = Vec::new();
        for entry in self.connections.iter() {
            match entry.value().send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(_) => dead.push(*entry.key()),
            }
        }

        // Removal must wait until the shard read guards above are released.
        for id in dead {
            self.connections.remove(&id);
            debug!(connection = id, "Dropped closed controller connection");
        }
        delivered
    }
}
