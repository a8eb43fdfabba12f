#![allow(dead_code)]

use async_trait::async_trait;
use doh_relay_application::ports::{
    DnsTransport, EndpointObserver, EndpointSource, HealthProbe, ServiceLogger, TransportFactory,
};
use doh_relay_domain::{DomainError, Endpoint};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockSource {
    name: String,
    endpoints: Mutex<Vec<Endpoint>>,
    fail: AtomicBool,
    calls: AtomicU64,
}

impl MockSource {
    pub fn new(name: &str, endpoints: Vec<Endpoint>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            endpoints: Mutex::new(endpoints),
            fail: AtomicBool::new(false),
            calls: AtomicU64::new(0),
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointSource for MockSource {
    async fn endpoints(&self) -> Result<Vec<Endpoint>, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::SourceFailed {
                source_name: self.name.clone(),
                reason: "lookup failed".to_string(),
            });
        }
        Ok(self.endpoints.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct MockTransport {
    endpoint: Endpoint,
}

#[async_trait]
impl DnsTransport for MockTransport {
    async fn exchange(
        &self,
        _path: &str,
        query: &[u8],
        _timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        Ok(query.to_vec())
    }

    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

#[derive(Default)]
pub struct MockTransportFactory;

impl TransportFactory for MockTransportFactory {
    fn create(&self, endpoint: &Endpoint) -> Result<Arc<dyn DnsTransport>, DomainError> {
        Ok(Arc::new(MockTransport {
            endpoint: endpoint.clone(),
        }))
    }
}

/// Probe whose verdict per endpoint is set by the test. Unknown endpoints
/// are unhealthy.
#[derive(Default)]
pub struct MockProbe {
    healthy: Mutex<HashSet<Endpoint>>,
    slow: Mutex<HashSet<Endpoint>>,
    probed: Mutex<Vec<Endpoint>>,
    last_verdict: Mutex<HashMap<Endpoint, bool>>,
}

impl MockProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_healthy(&self, endpoint: &Endpoint, healthy: bool) {
        let mut set = self.healthy.lock().unwrap();
        if healthy {
            set.insert(endpoint.clone());
        } else {
            set.remove(endpoint);
        }
    }

    /// The probe for `endpoint` never completes.
    pub fn set_hanging(&self, endpoint: &Endpoint) {
        self.slow.lock().unwrap().insert(endpoint.clone());
    }

    pub fn probed(&self) -> Vec<Endpoint> {
        self.probed.lock().unwrap().clone()
    }

    pub fn clear_probed(&self) {
        self.probed.lock().unwrap().clear();
    }

    /// Outcome of the most recent probe of `endpoint`.
    pub fn last_verdict(&self, endpoint: &Endpoint) -> Option<bool> {
        self.last_verdict.lock().unwrap().get(endpoint).copied()
    }
}

#[async_trait]
impl HealthProbe for MockProbe {
    async fn check(&self, transport: &dyn DnsTransport, _timeout: Duration) -> Result<(), DomainError> {
        let endpoint = transport.endpoint().clone();
        self.probed.lock().unwrap().push(endpoint.clone());

        let hanging = self.slow.lock().unwrap().contains(&endpoint);
        if hanging {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        let healthy = self.healthy.lock().unwrap().contains(&endpoint);
        self.last_verdict
            .lock()
            .unwrap()
            .insert(endpoint.clone(), healthy);
        if healthy {
            Ok(())
        } else {
            Err(DomainError::HealthCheckFailed {
                server: endpoint.to_string(),
                reason: "unhealthy".to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Change(Endpoint),
    Error(Endpoint),
    Unavailable,
}

#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
    installed: Mutex<Option<Arc<dyn DnsTransport>>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn changes(&self) -> Vec<Endpoint> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Change(endpoint) => Some(endpoint),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<Endpoint> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObservedEvent::Error(endpoint) => Some(endpoint),
                _ => None,
            })
            .collect()
    }

    pub fn unavailable_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| **e == ObservedEvent::Unavailable)
            .count()
    }

    /// Endpoint whose transport is currently installed.
    pub fn installed(&self) -> Option<Endpoint> {
        self.installed
            .lock()
            .unwrap()
            .as_ref()
            .map(|t| t.endpoint().clone())
    }

    pub fn installed_transport(&self) -> Option<Arc<dyn DnsTransport>> {
        self.installed.lock().unwrap().clone()
    }
}

impl EndpointObserver for RecordingObserver {
    fn on_change(&self, endpoint: &Endpoint, transport: Arc<dyn DnsTransport>) {
        assert_eq!(transport.endpoint(), endpoint);
        *self.installed.lock().unwrap() = Some(transport);
        self.events
            .lock()
            .unwrap()
            .push(ObservedEvent::Change(endpoint.clone()));
    }

    fn on_error(&self, endpoint: &Endpoint, _error: &DomainError) {
        self.events
            .lock()
            .unwrap()
            .push(ObservedEvent::Error(endpoint.clone()));
    }

    fn on_unavailable(&self) {
        *self.installed.lock().unwrap() = None;
        self.events.lock().unwrap().push(ObservedEvent::Unavailable);
    }
}

#[derive(Default)]
pub struct RecordingLogger {
    queries: Mutex<Vec<String>>,
    infos: Mutex<Vec<String>>,
    errors: Mutex<Vec<DomainError>>,
}

impl RecordingLogger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<DomainError> {
        self.errors.lock().unwrap().clone()
    }
}

impl ServiceLogger for RecordingLogger {
    fn query(&self, qname: &str) {
        self.queries.lock().unwrap().push(qname.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, error: &DomainError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

/// Polls `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

pub fn endpoint(name: &str) -> Endpoint {
    Endpoint::https(name)
}
