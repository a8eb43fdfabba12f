use doh_relay_domain::ControlEvent;

pub trait ControlBroadcaster: Send + Sync {
    /// Queues `event` for every connected controller; returns how many
    /// connections accepted it.
    fn broadcast(&self, event: ControlEvent) -> usize;
}
