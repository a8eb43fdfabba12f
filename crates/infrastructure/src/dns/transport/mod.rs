pub mod https;

use doh_relay_application::ports::{DnsTransport, TransportFactory};
use doh_relay_domain::{DomainError, Endpoint};
use std::sync::Arc;
use std::time::Duration;

pub use https::HttpsTransport;

/// Builds one [`HttpsTransport`] per candidate endpoint.
#[derive(Debug, Clone)]
pub struct ReqwestTransportFactory {
    connect_timeout: Duration,
}

impl ReqwestTransportFactory {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for ReqwestTransportFactory {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl TransportFactory for ReqwestTransportFactory {
    fn create(&self, endpoint: &Endpoint) -> Result<Arc<dyn DnsTransport>, DomainError> {
        let transport = HttpsTransport::new(endpoint.clone(), self.connect_timeout)?;
        Ok(Arc::new(transport))
    }
}
