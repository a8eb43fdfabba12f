use async_trait::async_trait;
use doh_relay_domain::{DomainError, Endpoint};
use std::sync::Arc;
use std::time::Duration;

/// A connection to one upstream endpoint able to exchange raw DNS messages.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    /// Sends `query` (DNS wire format) to `path` on the endpoint and returns
    /// the raw response message.
    async fn exchange(
        &self,
        path: &str,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError>;

    fn endpoint(&self) -> &Endpoint;
}

/// Builds a transport for a candidate endpoint.
pub trait TransportFactory: Send + Sync {
    fn create(&self, endpoint: &Endpoint) -> Result<Arc<dyn DnsTransport>, DomainError>;
}
