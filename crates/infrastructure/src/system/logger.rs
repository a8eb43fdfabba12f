use doh_relay_application::ports::ServiceLogger;
use doh_relay_domain::DomainError;
use tracing::{error, info};

/// Sends the three process log sinks to `tracing`, one target each, so they
/// can be filtered independently (`RUST_LOG=doh_relay::query=off`).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingServiceLogger;

impl TracingServiceLogger {
    pub fn new() -> Self {
        Self
    }
}

impl ServiceLogger for TracingServiceLogger {
    fn query(&self, qname: &str) {
        info!(target: "doh_relay::query", domain = %qname, "query");
    }

    fn info(&self, message: &str) {
        info!(target: "doh_relay::info", "{}", message);
    }

    fn error(&self, err: &DomainError) {
        error!(target: "doh_relay::error", kind = ?err.kind(), "{}", err);
    }
}
