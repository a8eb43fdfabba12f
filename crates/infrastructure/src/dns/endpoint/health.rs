use async_trait::async_trait;
use doh_relay_application::ports::{DnsTransport, HealthProbe};
use doh_relay_domain::DomainError;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::debug;

/// Probes a candidate with a real DoH exchange.
///
/// The probe passes when the endpoint answers a recursive `A` query for the
/// probe name with a response carrying the same ID, the QR bit, and an RCODE
/// other than SERVFAIL or REFUSED. The empty upstream path is used so the
/// probe does not depend on the user's configuration.
pub struct DohHealthProbe {
    probe_name: Name,
}

impl DohHealthProbe {
    pub fn new(probe_name: &str) -> Result<Self, DomainError> {
        let probe_name = Name::from_str(probe_name).map_err(|e| {
            DomainError::ConfigError(format!("Invalid probe name '{}': {}", probe_name, e))
        })?;
        Ok(Self { probe_name })
    }

    fn build_query(&self) -> Result<(u16, Vec<u8>), DomainError> {
        let mut query = Query::new();
        query.set_name(self.probe_name.clone());
        query.set_query_type(RecordType::A);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        let mut buf = Vec::with_capacity(64);
        let mut encoder = BinEncoder::new(&mut buf);
        message.emit(&mut encoder).map_err(|e| {
            DomainError::ConfigError(format!("Failed to serialize probe query: {}", e))
        })?;
        Ok((id, buf))
    }

    fn check_response(id: u16, response: &[u8]) -> Result<(), String> {
        if response.len() < 12 {
            return Err(format!("short response ({} bytes)", response.len()));
        }
        if u16::from_be_bytes([response[0], response[1]]) != id {
            return Err("response ID mismatch".to_string());
        }
        if response[2] & 0x80 == 0 {
            return Err("QR bit not set".to_string());
        }
        let message =
            Message::from_vec(response).map_err(|e| format!("unparsable response: {}", e))?;
        match message.response_code() {
            ResponseCode::ServFail | ResponseCode::Refused => {
                Err(format!("upstream answered {}", message.response_code()))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl HealthProbe for DohHealthProbe {
    async fn check(&self, transport: &dyn DnsTransport, timeout: Duration) -> Result<(), DomainError> {
        let server = transport.endpoint().to_string();
        let (id, query) = self.build_query()?;

        let start = Instant::now();
        let response = tokio::time::timeout(timeout, transport.exchange("", &query, timeout))
            .await
            .map_err(|_| DomainError::TransportTimeout {
                server: server.clone(),
            })??;

        Self::check_response(id, &response).map_err(|reason| DomainError::HealthCheckFailed {
            server: server.clone(),
            reason,
        })?;

        debug!(server = %server, latency_ms = start.elapsed().as_millis() as u64, "Health check: OK");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_for(query: &[u8], flags: [u8; 2]) -> Vec<u8> {
        let mut response = query.to_vec();
        response[2] = flags[0];
        response[3] = flags[1];
        response
    }

    #[test]
    fn test_probe_query_sets_rd_and_random_id() {
        let probe = DohHealthProbe::new("probe-test.dns.nextdns.io").unwrap();
        let (id, bytes) = probe.build_query().unwrap();
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), id);
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
        assert_eq!(u16::from_be_bytes([bytes[4], bytes[5]]), 1);
    }

    #[test]
    fn test_response_checks() {
        let probe = DohHealthProbe::new("probe-test.dns.nextdns.io").unwrap();
        let (id, query) = probe.build_query().unwrap();

        assert!(DohHealthProbe::check_response(id, &response_for(&query, [0x81, 0x80])).is_ok());
        assert!(DohHealthProbe::check_response(id, &response_for(&query, [0x81, 0x83])).is_ok());
        assert!(DohHealthProbe::check_response(id, &response_for(&query, [0x81, 0x82])).is_err());
        assert!(DohHealthProbe::check_response(id, &response_for(&query, [0x81, 0x85])).is_err());
        assert!(DohHealthProbe::check_response(id, &query).is_err());
        assert!(
            DohHealthProbe::check_response(id.wrapping_add(1), &response_for(&query, [0x81, 0x80]))
                .is_err()
        );
        assert!(DohHealthProbe::check_response(id, &[0u8; 4]).is_err());
    }
}
