use async_trait::async_trait;
use doh_relay_application::ports::EndpointSource;
use doh_relay_domain::{DomainError, Endpoint};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::{debug, warn};

/// Wraps one fixed endpoint.
pub struct StaticSource {
    endpoint: Endpoint,
    name: String,
}

impl StaticSource {
    pub fn new(endpoint: Endpoint) -> Self {
        let name = format!("static:{}", endpoint.hostname());
        Self { endpoint, name }
    }
}

#[async_trait]
impl EndpointSource for StaticSource {
    async fn endpoints(&self) -> Result<Vec<Endpoint>, DomainError> {
        Ok(vec![self.endpoint.clone()])
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Deserialize)]
struct RouterEntry {
    hostname: String,
    #[serde(default)]
    ips: Vec<String>,
}

/// Asks the routing API which unicast endpoints to use.
///
/// The API is always reached through one of its bootstrap addresses, picked
/// uniformly at random on every lookup, so the lookup never depends on the
/// resolver this process provides.
pub struct RouterSource {
    url: String,
    host: String,
    port: u16,
    bootstrap: Vec<IpAddr>,
    timeout: Duration,
    name: String,
}

impl RouterSource {
    pub fn new(url: &str, bootstrap: Vec<IpAddr>, timeout: Duration) -> Result<Self, DomainError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| DomainError::InvalidEndpoint(format!("{}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| DomainError::InvalidEndpoint(format!("{}: missing host", url)))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| DomainError::InvalidEndpoint(format!("{}: missing port", url)))?;

        Ok(Self {
            url: url.to_string(),
            name: format!("router:{}", host),
            host,
            port,
            bootstrap,
            timeout,
        })
    }

    fn pick_bootstrap(&self) -> Option<IpAddr> {
        if self.bootstrap.is_empty() {
            return None;
        }
        Some(self.bootstrap[fastrand::usize(..self.bootstrap.len())])
    }

    fn source_failed(&self, reason: impl Into<String>) -> DomainError {
        DomainError::SourceFailed {
            source_name: self.name.clone(),
            reason: reason.into(),
        }
    }

    async fn fetch(&self) -> Result<Vec<RouterEntry>, DomainError> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(self.timeout);
        if let Some(ip) = self.pick_bootstrap() {
            debug!(bootstrap = %ip, url = %self.url, "Querying routing API");
            builder = builder.resolve(&self.host, SocketAddr::new(ip, self.port));
        }
        let client = builder
            .build()
            .map_err(|e| self.source_failed(format!("cannot build HTTP client: {}", e)))?;

        let response = client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| self.source_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.source_failed(format!("HTTP {}", status.as_u16())));
        }

        response
            .json::<Vec<RouterEntry>>()
            .await
            .map_err(|e| self.source_failed(format!("invalid response: {}", e)))
    }
}

#[async_trait]
impl EndpointSource for RouterSource {
    async fn endpoints(&self) -> Result<Vec<Endpoint>, DomainError> {
        let entries = self.fetch().await?;
        let endpoints = expand_entries(entries);
        if endpoints.is_empty() {
            return Err(self.source_failed("no endpoints returned"));
        }
        debug!(source = %self.name, count = endpoints.len(), "Routing API answered");
        Ok(endpoints)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn expand_entries(entries: Vec<RouterEntry>) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();
    for entry in entries {
        let hostname = entry.hostname.trim();
        if hostname.is_empty() {
            continue;
        }
        if entry.ips.is_empty() {
            endpoints.push(Endpoint::https(hostname));
            continue;
        }
        for ip in &entry.ips {
            match ip.parse::<IpAddr>() {
                Ok(addr) => endpoints.push(Endpoint::https(hostname).with_addr(addr)),
                Err(_) => warn!(hostname, ip = %ip, "Skipping invalid address from routing API"),
            }
        }
    }
    endpoints
}
