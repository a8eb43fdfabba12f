use async_trait::async_trait;
use doh_relay_domain::{DomainError, Endpoint};

/// Strategy producing an ordered list of upstream candidates.
#[async_trait]
pub trait EndpointSource: Send + Sync {
    async fn endpoints(&self) -> Result<Vec<Endpoint>, DomainError>;

    fn name(&self) -> &str;
}
