use async_trait::async_trait;
use doh_relay_domain::DomainError;

/// Lifecycle surface of the DNS proxy. `start` and `stop` are idempotent.
#[async_trait]
pub trait ProxyControl: Send + Sync {
    async fn start(&self) -> Result<(), DomainError>;

    async fn stop(&self) -> Result<(), DomainError>;

    fn started(&self) -> bool;

    /// Upstream path (the DoH configuration id) used by subsequent queries.
    fn set_upstream_path(&self, path: &str);
}
