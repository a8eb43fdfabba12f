use super::DnsProxy;
use doh_relay_application::ports::{DnsTransport, EndpointObserver, ServiceLogger};
use doh_relay_domain::{DomainError, Endpoint};
use std::sync::Arc;

/// Connects endpoint selection to the proxy: the chosen transport is
/// installed before any query can use it, and cleared when nothing works.
pub struct ProxyEndpointObserver {
    proxy: Arc<DnsProxy>,
    logger: Arc<dyn ServiceLogger>,
}

impl ProxyEndpointObserver {
    pub fn new(proxy: Arc<DnsProxy>, logger: Arc<dyn ServiceLogger>) -> Self {
        Self { proxy, logger }
    }
}

impl EndpointObserver for ProxyEndpointObserver {
    fn on_change(&self, endpoint: &Endpoint, transport: Arc<dyn DnsTransport>) {
        self.proxy.install_transport(transport);
        self.logger.info(&format!("Switching endpoint: {}", endpoint));
    }

    fn on_error(&self, endpoint: &Endpoint, error: &DomainError) {
        tracing::debug!(endpoint = %endpoint, "Endpoint error reported");
        self.logger.error(error);
    }

    fn on_unavailable(&self) {
        self.proxy.clear_transport();
        self.logger.error(&DomainError::AllEndpointsExhausted);
    }
}
