use super::DnsTransport;
use doh_relay_domain::{DomainError, Endpoint};
use std::sync::Arc;

/// Collaborator notified by the endpoint manager.
pub trait EndpointObserver: Send + Sync {
    /// Installs the transport of the newly selected endpoint. Called before
    /// any query may use it.
    fn on_change(&self, endpoint: &Endpoint, transport: Arc<dyn DnsTransport>);

    /// Called for every candidate that failed a probe or a forwarded query.
    fn on_error(&self, endpoint: &Endpoint, error: &DomainError);

    /// Every candidate failed; the previous transport must no longer be used.
    fn on_unavailable(&self);
}
