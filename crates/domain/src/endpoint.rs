use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use crate::DomainError;

/// Scheme used to reach an upstream endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointProtocol {
    #[default]
    Https,
    Http,
}

impl EndpointProtocol {
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Https => "https",
            Self::Http => "http",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Self::Https => 443,
            Self::Http => 80,
        }
    }
}

/// One upstream DNS-over-HTTPS candidate.
///
/// `addr` pins the connection to a literal IP without changing the name used
/// for the HTTP `Host` header and TLS SNI. Endpoints are immutable; the
/// `with_*` builders return new values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    hostname: Arc<str>,
    addr: Option<IpAddr>,
    port: Option<u16>,
    protocol: EndpointProtocol,
}

impl Endpoint {
    pub fn new(hostname: &str, protocol: EndpointProtocol, addr: Option<IpAddr>) -> Self {
        Self {
            hostname: Arc::from(hostname.trim_end_matches('.')),
            addr,
            port: None,
            protocol,
        }
    }

    pub fn https(hostname: &str) -> Self {
        Self::new(hostname, EndpointProtocol::Https, None)
    }

    pub fn with_addr(mut self, addr: IpAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn addr(&self) -> Option<IpAddr> {
        self.addr
    }

    pub fn protocol(&self) -> EndpointProtocol {
        self.protocol
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    /// Socket address the connection is pinned to, when an IP override is set.
    pub fn pinned_socket_addr(&self) -> Option<SocketAddr> {
        self.addr.map(|ip| SocketAddr::new(ip, self.port()))
    }

    /// Builds the request URL for `path` on this endpoint.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        match self.port {
            Some(port) if port != self.protocol.default_port() => format!(
                "{}://{}:{}/{}",
                self.protocol.scheme(),
                self.hostname,
                port,
                path
            ),
            _ => format!("{}://{}/{}", self.protocol.scheme(), self.hostname, path),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hostname)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        if let Some(addr) = self.addr {
            write!(f, " ({})", addr)?;
        }
        Ok(())
    }
}

/// Parses `[scheme://]hostname[:port][@ip]`, e.g. `dns1.nextdns.io@45.90.28.0`.
impl FromStr for Endpoint {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (protocol, rest) = if let Some(rest) = s.strip_prefix("https://") {
            (EndpointProtocol::Https, rest)
        } else if let Some(rest) = s.strip_prefix("http://") {
            (EndpointProtocol::Http, rest)
        } else {
            (EndpointProtocol::Https, s)
        };

        let (host_port, addr) = match rest.rsplit_once('@') {
            Some((hp, ip)) => {
                let ip = ip
                    .parse::<IpAddr>()
                    .map_err(|e| DomainError::InvalidEndpoint(format!("{}: {}", s, e)))?;
                (hp, Some(ip))
            }
            None => (rest, None),
        };

        let host_port = host_port.trim_end_matches('/');
        let (hostname, port) = match host_port.rsplit_once(':') {
            Some((h, p)) => {
                let port = p
                    .parse::<u16>()
                    .map_err(|e| DomainError::InvalidEndpoint(format!("{}: {}", s, e)))?;
                (h, Some(port))
            }
            None => (host_port, None),
        };

        if hostname.is_empty() || hostname.contains('/') {
            return Err(DomainError::InvalidEndpoint(format!(
                "{}: missing hostname",
                s
            )));
        }

        let mut endpoint = Endpoint::new(hostname, protocol, addr);
        endpoint.port = port;
        Ok(endpoint)
    }
}
