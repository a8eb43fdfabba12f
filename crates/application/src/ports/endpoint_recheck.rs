use async_trait::async_trait;

/// Periodic re-validation of the upstream choice.
#[async_trait]
pub trait EndpointRecheckPort: Send + Sync {
    /// Probes higher-priority candidates and the active endpoint; never fails,
    /// outcomes surface through the endpoint observer.
    async fn recheck(&self);
}
