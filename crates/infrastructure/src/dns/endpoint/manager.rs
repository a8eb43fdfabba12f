//! Upstream endpoint selection and failover.
//!
//! Sources are evaluated strictly in configured order; within a source the
//! first endpoint whose health probe passes wins. Failures observed on the
//! query path arrive through a [`FailureReporter`] and move the selection to
//! the next candidate. When every candidate failed the observer is told the
//! upstream is unavailable and selection restarts from the top after a
//! backoff, for as long as the manager runs.

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use doh_relay_application::ports::{
    DnsTransport, EndpointObserver, EndpointRecheckPort, EndpointSource, HealthProbe,
    TransportFactory,
};
use doh_relay_domain::{DomainError, Endpoint};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    pub probe_timeout: Duration,
    pub backoff: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(2),
            backoff: Duration::from_secs(5),
        }
    }
}

enum Signal {
    Failure {
        transport: Arc<dyn DnsTransport>,
        error: DomainError,
    },
    Reselect,
}

/// Non-blocking handle used by the query path to report upstream failures.
#[derive(Clone)]
pub struct FailureReporter {
    sender: Option<mpsc::UnboundedSender<Signal>>,
}

impl FailureReporter {
    pub fn new_disabled() -> Self {
        Self { sender: None }
    }

    /// Reports that a query through `transport` failed. Only the transport
    /// currently installed can trigger a failover; reports about an earlier
    /// transport, even one for the same endpoint, are dropped as stale.
    pub fn report(&self, transport: &Arc<dyn DnsTransport>, error: DomainError) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(Signal::Failure {
                transport: Arc::clone(transport),
                error,
            });
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    fn reselect(&self) {
        if let Some(ref tx) = self.sender {
            let _ = tx.send(Signal::Reselect);
        }
    }
}

/// Receiving half of a failure channel, consumed by [`EndpointManager`].
pub struct FailureSignals {
    receiver: mpsc::UnboundedReceiver<Signal>,
}

/// Creates a connected reporter and signal receiver. Lets the query path be
/// built before the manager that consumes its reports.
pub fn failure_channel() -> (FailureReporter, FailureSignals) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        FailureReporter { sender: Some(tx) },
        FailureSignals { receiver: rx },
    )
}

impl std::fmt::Debug for FailureReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureReporter")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// The active endpoint, the position of the source that produced it, and
/// the transport handed to the observer for this activation.
struct Selection {
    endpoint: Endpoint,
    source: usize,
    transport: Arc<dyn DnsTransport>,
}

impl Selection {
    fn installed(&self, transport: &Arc<dyn DnsTransport>) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.transport) as *const (),
            Arc::as_ptr(transport) as *const (),
        )
    }
}

#[derive(Clone, Copy)]
enum Scan<'a> {
    /// Every candidate, from the highest priority down.
    All,
    /// Candidates ranked below the given selection.
    After(&'a Selection),
    /// Candidates ranked above the given selection.
    Before(&'a Selection),
}

pub struct EndpointManager {
    sources: Vec<Arc<dyn EndpointSource>>,
    factory: Arc<dyn TransportFactory>,
    probe: Arc<dyn HealthProbe>,
    observer: Arc<dyn EndpointObserver>,
    config: ManagerConfig,
    active: ArcSwapOption<Selection>,
    // Serializes selection passes; never held across the backoff sleep.
    selection: Mutex<()>,
    reporter: FailureReporter,
    signals: std::sync::Mutex<Option<mpsc::UnboundedReceiver<Signal>>>,
}

impl EndpointManager {
    pub fn new(
        sources: Vec<Arc<dyn EndpointSource>>,
        factory: Arc<dyn TransportFactory>,
        probe: Arc<dyn HealthProbe>,
        observer: Arc<dyn EndpointObserver>,
        config: ManagerConfig,
    ) -> Self {
        let (reporter, signals) = failure_channel();
        Self::with_channel(sources, factory, probe, observer, config, reporter, signals)
    }

    /// Builds a manager that consumes reports sent through `reporter`.
    pub fn with_channel(
        sources: Vec<Arc<dyn EndpointSource>>,
        factory: Arc<dyn TransportFactory>,
        probe: Arc<dyn HealthProbe>,
        observer: Arc<dyn EndpointObserver>,
        config: ManagerConfig,
        reporter: FailureReporter,
        signals: FailureSignals,
    ) -> Self {
        Self {
            sources,
            factory,
            probe,
            observer,
            config,
            active: ArcSwapOption::empty(),
            selection: Mutex::new(()),
            reporter,
            signals: std::sync::Mutex::new(Some(signals.receiver)),
        }
    }

    /// Handle for the query path. Reports sent before [`start`](Self::start)
    /// are queued.
    pub fn reporter(&self) -> FailureReporter {
        self.reporter.clone()
    }

    pub fn active(&self) -> Option<Endpoint> {
        self.active.load().as_ref().map(|s| s.endpoint.clone())
    }

    /// Spawns the monitor loop: initial selection, then failover on every
    /// report about the active endpoint, until `shutdown` is cancelled.
    pub fn start(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let signals = match self.signals.lock() {
            Ok(mut guard) => guard.take(),
            Err(_) => None,
        };
        let manager = Arc::clone(self);

        tokio::spawn(async move {
            let Some(signals) = signals else {
                warn!("Endpoint manager already started");
                return;
            };
            info!(sources = manager.sources.len(), "Endpoint manager running");
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = manager.monitor(signals) => {}
            }
            info!("Endpoint manager stopped");
        })
    }

    async fn monitor(&self, mut signals: mpsc::UnboundedReceiver<Signal>) {
        self.select_until_healthy().await;

        while let Some(signal) = signals.recv().await {
            match signal {
                Signal::Failure { transport, error } => {
                    self.handle_failure(transport, error).await
                }
                Signal::Reselect => {
                    self.wait_backoff().await;
                    self.select_until_healthy().await;
                }
            }
        }
    }

    /// Re-validates the current choice.
    ///
    /// Candidates ranked above the active endpoint are probed first and the
    /// first healthy one takes over. Otherwise the active endpoint itself is
    /// probed and, when it fails, replaced by the next healthy candidate.
    /// With no active endpoint a full selection pass runs.
    pub async fn recheck(&self) {
        let _guard = self.selection.lock().await;
        let Some(current) = self.active.load_full() else {
            debug!("Recheck: no active endpoint, running selection");
            if let Some(candidate) = self.scan(Scan::All).await {
                self.activate(candidate);
            }
            return;
        };

        if let Some(candidate) = self.scan(Scan::Before(&current)).await {
            info!(
                from = %current.endpoint,
                to = %candidate.endpoint,
                "Higher-priority endpoint healthy again"
            );
            self.activate(candidate);
            return;
        }

        if self.try_candidate(&current.endpoint).await.is_some() {
            debug!(endpoint = %current.endpoint, "Recheck: active endpoint healthy");
            return;
        }

        if let Some(candidate) = self.scan(Scan::After(&current)).await {
            self.activate(candidate);
        } else {
            self.deactivate();
            self.reporter.reselect();
        }
    }

    async fn handle_failure(&self, transport: Arc<dyn DnsTransport>, error: DomainError) {
        {
            let _guard = self.selection.lock().await;
            let endpoint = transport.endpoint();
            let current = match self.active.load_full() {
                Some(current) if current.installed(&transport) => current,
                _ => {
                    debug!(endpoint = %endpoint, "Ignoring stale failure report");
                    return;
                }
            };

            warn!(endpoint = %endpoint, error = %error, "Active endpoint failed, failing over");
            self.observer.on_error(endpoint, &error);

            if let Some(candidate) = self.scan(Scan::After(&current)).await {
                self.activate(candidate);
                return;
            }
            self.deactivate();
        }

        self.wait_backoff().await;
        self.select_until_healthy().await;
    }

    /// Full passes from the top, separated by the backoff, until one succeeds
    /// or another path already installed an endpoint.
    async fn select_until_healthy(&self) {
        loop {
            {
                let _guard = self.selection.lock().await;
                if self.active.load().is_some() {
                    return;
                }
                if let Some(candidate) = self.scan(Scan::All).await {
                    self.activate(candidate);
                    return;
                }
                self.deactivate();
            }
            self.wait_backoff().await;
        }
    }

    async fn wait_backoff(&self) {
        warn!(
            backoff_ms = self.config.backoff.as_millis() as u64,
            "All upstream endpoints failed, retrying after backoff"
        );
        tokio::time::sleep(self.config.backoff).await;
    }

    async fn scan(&self, scan: Scan<'_>) -> Option<Selection> {
        let first = match scan {
            Scan::After(s) => s.source,
            _ => 0,
        };

        for (index, source) in self.sources.iter().enumerate().skip(first) {
            if let Scan::Before(s) = scan {
                if index > s.source {
                    break;
                }
            }

            let endpoints = match source.endpoints().await {
                Ok(endpoints) => endpoints,
                Err(e) => {
                    warn!(source = source.name(), error = %e, "Endpoint source failed");
                    continue;
                }
            };

            let candidates: &[Endpoint] = match scan {
                Scan::After(s) if index == s.source => {
                    match endpoints.iter().position(|e| *e == s.endpoint) {
                        Some(pos) => &endpoints[pos + 1..],
                        None => endpoints.as_slice(),
                    }
                }
                Scan::Before(s) if index == s.source => {
                    match endpoints.iter().position(|e| *e == s.endpoint) {
                        Some(pos) => &endpoints[..pos],
                        None => endpoints.as_slice(),
                    }
                }
                _ => endpoints.as_slice(),
            };

            for endpoint in candidates {
                if let Scan::After(s) = scan {
                    if *endpoint == s.endpoint {
                        continue;
                    }
                }
                if let Some(transport) = self.try_candidate(endpoint).await {
                    return Some(Selection {
                        endpoint: endpoint.clone(),
                        source: index,
                        transport,
                    });
                }
            }
        }
        None
    }

    async fn try_candidate(&self, endpoint: &Endpoint) -> Option<Arc<dyn DnsTransport>> {
        let transport = match self.factory.create(endpoint) {
            Ok(t) => t,
            Err(e) => {
                self.candidate_failed(endpoint, &e);
                return None;
            }
        };

        let timeout = self.config.probe_timeout;
        let probe = self.probe.check(transport.as_ref(), timeout);
        let result = match tokio::time::timeout(timeout, probe).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::TransportTimeout {
                server: endpoint.to_string(),
            }),
        };

        match result {
            Ok(()) => Some(transport),
            Err(e) => {
                self.candidate_failed(endpoint, &e);
                None
            }
        }
    }

    fn candidate_failed(&self, endpoint: &Endpoint, error: &DomainError) {
        warn!(endpoint = %endpoint, error = %error, "Endpoint health check failed");
        self.observer.on_error(endpoint, error);
    }

    fn activate(&self, selection: Selection) {
        info!(
            endpoint = %selection.endpoint,
            source = self.sources[selection.source].name(),
            "Switching endpoint"
        );
        self.observer
            .on_change(&selection.endpoint, Arc::clone(&selection.transport));
        self.active.store(Some(Arc::new(selection)));
    }

    fn deactivate(&self) {
        if let Some(previous) = self.active.swap(None) {
            debug!(endpoint = %previous.endpoint, "Dropping failed endpoint");
        }
        self.observer.on_unavailable();
    }
}

#[async_trait]
impl EndpointRecheckPort for EndpointManager {
    async fn recheck(&self) {
        EndpointManager::recheck(self).await;
    }
}
