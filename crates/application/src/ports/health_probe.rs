use super::DnsTransport;
use async_trait::async_trait;
use doh_relay_domain::DomainError;
use std::time::Duration;

#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Fails when the transport cannot answer a trial query within `timeout`.
    async fn check(&self, transport: &dyn DnsTransport, timeout: Duration)
        -> Result<(), DomainError>;
}
