use doh_relay_application::ports::EndpointRecheckPort;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Periodically re-validates the upstream choice so a recovered
/// higher-priority endpoint takes over again.
pub struct EndpointRecheckJob {
    monitor: Arc<dyn EndpointRecheckPort>,
    interval: Duration,
    shutdown: CancellationToken,
}

impl EndpointRecheckJob {
    pub fn new(monitor: Arc<dyn EndpointRecheckPort>) -> Self {
        Self {
            monitor,
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    pub async fn start(self: Arc<Self>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting endpoint recheck job"
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; initial selection already ran.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("EndpointRecheckJob: shutting down");
                    break;
                }
                _ = interval.tick() => {
                    debug!("Rechecking upstream endpoints");
                    self.monitor.recheck().await;
                }
            }
        }
    }
}
