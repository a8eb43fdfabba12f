use crate::di::{ControlServices, DnsServices};
use doh_relay_application::ports::{ProxyControl, ServiceLogger};
use doh_relay_domain::ServiceConfig;
use doh_relay_infrastructure::system::TracingServiceLogger;
use doh_relay_jobs::{EndpointRecheckJob, JobRunner};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Owns every long-lived component of the relay.
///
/// `start` returns as soon as the control channel is open; whether the proxy
/// runs is decided by the persisted settings once the channel is up.
pub struct ProxyService {
    dns: DnsServices,
    control: ControlServices,
    recheck_interval: Duration,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl ProxyService {
    pub fn new(config: &ServiceConfig) -> anyhow::Result<Self> {
        let logger: Arc<dyn ServiceLogger> = Arc::new(TracingServiceLogger::new());
        let dns = DnsServices::new(config, logger.clone())?;
        let control = ControlServices::new(config, dns.proxy.clone(), logger);

        Ok(Self {
            dns,
            control,
            recheck_interval: Duration::from_secs(config.health.recheck_interval),
            shutdown: CancellationToken::new(),
            tasks: Vec::new(),
        })
    }

    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.tasks.push(self.dns.manager.start(self.shutdown.clone()));

        if !self.recheck_interval.is_zero() {
            let recheck = EndpointRecheckJob::new(self.dns.manager.clone())
                .with_interval(self.recheck_interval);
            let jobs = JobRunner::new()
                .with_endpoint_recheck(recheck)
                .with_shutdown_token(self.shutdown.clone())
                .start()
                .await;
            self.tasks.extend(jobs);
        }

        // Fatal: without the channel no controller can reach the service.
        self.control.server.start().await?;
        info!("Relay service started");
        Ok(())
    }

    pub async fn stop(&mut self) {
        info!("Stopping relay service");
        if let Err(e) = self.dns.proxy.stop().await {
            warn!(error = %e, "Proxy did not stop cleanly");
        }
        self.control.server.stop().await;
        self.shutdown.cancel();

        for task in self.tasks.drain(..) {
            let abort = task.abort_handle();
            if tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, task).await.is_err() {
                abort.abort();
            }
        }
        info!("Relay service stopped");
    }
}
