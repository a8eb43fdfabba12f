use thiserror::Error;

/// Coarse classification of [`DomainError`], used to decide how an error is
/// surfaced (failover, `error` broadcast, or log only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    /// The upstream answered but refused the request itself.
    Rejected,
    Persistence,
    ProxyLifecycle,
    Protocol,
    Other,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Transport timeout contacting {server}")]
    TransportTimeout { server: String },

    #[error("Transport to {server} failed: {reason}")]
    TransportFailed { server: String, reason: String },

    #[error("Upstream {server} rejected the query: HTTP {status}")]
    UpstreamRejected { server: String, status: u16 },

    #[error("Health check of {server} failed: {reason}")]
    HealthCheckFailed { server: String, reason: String },

    #[error("Endpoint source {source_name} failed: {reason}")]
    SourceFailed { source_name: String, reason: String },

    #[error("No active upstream endpoint")]
    NoActiveEndpoint,

    #[error("All upstream endpoints are unreachable")]
    AllEndpointsExhausted,

    #[error("Cannot write settings: {0}")]
    PersistenceFailed(String),

    #[error("Cannot listen on {addr}: {reason}")]
    ProxyBindFailed { addr: String, reason: String },

    #[error("Proxy did not stop cleanly: {0}")]
    ProxyStopFailed(String),

    #[error("Invalid event: {0}")]
    UnknownEvent(String),

    #[error("Malformed control message: {0}")]
    MalformedEvent(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransportTimeout { .. }
            | Self::TransportFailed { .. }
            | Self::HealthCheckFailed { .. }
            | Self::SourceFailed { .. }
            | Self::NoActiveEndpoint
            | Self::AllEndpointsExhausted => ErrorKind::Transport,
            Self::UpstreamRejected { .. } => ErrorKind::Rejected,
            Self::PersistenceFailed(_) => ErrorKind::Persistence,
            Self::ProxyBindFailed { .. } | Self::ProxyStopFailed(_) => ErrorKind::ProxyLifecycle,
            Self::UnknownEvent(_) | Self::MalformedEvent(_) => ErrorKind::Protocol,
            Self::InvalidEndpoint(_) | Self::Io(_) | Self::ConfigError(_) => ErrorKind::Other,
        }
    }

    pub fn is_transport_error(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

impl From<std::io::Error> for DomainError {
    fn from(e: std::io::Error) -> Self {
        DomainError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_request_is_not_a_transport_error() {
        let rejected = DomainError::UpstreamRejected {
            server: "dns.nextdns.io".to_string(),
            status: 400,
        };
        assert_eq!(rejected.kind(), ErrorKind::Rejected);
        assert!(!rejected.is_transport_error());

        let unreachable = DomainError::TransportFailed {
            server: "dns.nextdns.io".to_string(),
            reason: "HTTP 503".to_string(),
        };
        assert!(unreachable.is_transport_error());
    }
}
