//! DNS-over-HTTPS transport (RFC 8484)
//!
//! Queries are sent as HTTP POST requests with the `application/dns-message`
//! content type; request and response bodies are raw DNS wire messages.
//!
//! ```text
//! POST /<configuration> HTTP/2
//! Host: dns1.nextdns.io
//! Content-Type: application/dns-message
//! Accept: application/dns-message
//!
//! <raw DNS message bytes>
//! ```
//!
//! When the endpoint carries a literal address the connection is pinned to
//! it, while `Host` and TLS SNI keep using the endpoint hostname.

use async_trait::async_trait;
use doh_relay_application::ports::DnsTransport;
use doh_relay_domain::{DomainError, Endpoint};
use std::time::Duration;
use tracing::debug;

/// Expected content type for DNS-over-HTTPS messages (RFC 8484 §4.2.1)
const DNS_MESSAGE_CONTENT_TYPE: &str = "application/dns-message";

const USER_AGENT: &str = concat!("doh-relay/", env!("CARGO_PKG_VERSION"));

pub struct HttpsTransport {
    endpoint: Endpoint,
    client: reqwest::Client,
}

impl HttpsTransport {
    pub fn new(endpoint: Endpoint, connect_timeout: Duration) -> Result<Self, DomainError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90));

        if let Some(addr) = endpoint.pinned_socket_addr() {
            builder = builder.resolve(endpoint.hostname(), addr);
        }

        let client = builder.build().map_err(|e| DomainError::TransportFailed {
            server: endpoint.to_string(),
            reason: format!("cannot build HTTP client: {}", e),
        })?;

        Ok(Self { endpoint, client })
    }

    fn failed(&self, reason: String) -> DomainError {
        DomainError::TransportFailed {
            server: self.endpoint.to_string(),
            reason,
        }
    }

    fn timed_out(&self) -> DomainError {
        DomainError::TransportTimeout {
            server: self.endpoint.to_string(),
        }
    }
}

#[async_trait]
impl DnsTransport for HttpsTransport {
    async fn exchange(
        &self,
        path: &str,
        query: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        let url = self.endpoint.url(path);
        debug!(url = %url, message_len = query.len(), "Sending DoH query");

        let response = tokio::time::timeout(
            timeout,
            self.client
                .post(&url)
                .header("Content-Type", DNS_MESSAGE_CONTENT_TYPE)
                .header("Accept", DNS_MESSAGE_CONTENT_TYPE)
                .body(query.to_vec())
                .send(),
        )
        .await
        .map_err(|_| self.timed_out())?
        .map_err(|e| self.failed(format!("request failed: {}", e)))?;

        let status = response.status();
        // 4xx: the endpoint is up but refuses this request (bad path or message).
        if status.is_client_error() {
            return Err(DomainError::UpstreamRejected {
                server: self.endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(self.failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| self.timed_out())?
            .map_err(|e| self.failed(format!("cannot read response: {}", e)))?;

        if body.len() < 12 {
            return Err(self.failed(format!("short DNS response ({} bytes)", body.len())));
        }

        debug!(url = %url, response_len = body.len(), "DoH response received");
        Ok(body.to_vec())
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}
