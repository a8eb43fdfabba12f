use crate::dns::endpoint::FailureReporter;
use crate::dns::wire;
use arc_swap::{ArcSwap, ArcSwapOption};
use doh_relay_application::ports::{DnsTransport, ServiceLogger};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Published transport slot. Wrapped so it fits an `ArcSwapOption`.
pub(super) struct Upstream {
    pub transport: Arc<dyn DnsTransport>,
}

/// Shared query path: every listener task resolves through one forwarder.
pub(super) struct Forwarder {
    pub upstream: ArcSwapOption<Upstream>,
    pub path: ArcSwap<String>,
    pub timeout: Duration,
    pub logger: Arc<dyn ServiceLogger>,
    pub reporter: FailureReporter,
}

impl Forwarder {
    /// Answers one raw query. Messages that are not a single-question query
    /// get FORMERR locally; upstream failures become SERVFAIL. `None` when
    /// nothing should be sent back.
    pub async fn resolve(&self, query: &[u8]) -> Option<Vec<u8>> {
        let Some(info) = wire::parse_query(query) else {
            if wire::is_response(query) {
                debug!(len = query.len(), "Dropping DNS response sent to the proxy");
                return None;
            }
            debug!(len = query.len(), "Unreadable query, answering FORMERR");
            return wire::formerr(query);
        };
        self.logger.query(&info.name);

        let Some(upstream) = self.upstream.load_full() else {
            debug!("No upstream transport installed, answering SERVFAIL");
            return wire::servfail(query);
        };

        let path = self.path.load_full();
        match upstream.transport.exchange(&path, query, self.timeout).await {
            Ok(response) => Some(response),
            Err(e) if e.is_transport_error() => {
                debug!(endpoint = %upstream.transport.endpoint(), error = %e, "Upstream query failed");
                self.reporter.report(&upstream.transport, e);
                wire::servfail(query)
            }
            Err(e) => {
                // The endpoint is reachable; the query or path is at fault.
                debug!(endpoint = %upstream.transport.endpoint(), error = %e, "Upstream rejected query");
                wire::servfail(query)
            }
        }
    }
}
