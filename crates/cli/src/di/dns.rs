use doh_relay_application::ports::{EndpointSource, ServiceLogger};
use doh_relay_domain::ServiceConfig;
use doh_relay_infrastructure::dns::{
    failure_channel, DnsProxy, DnsProxyOptions, DohHealthProbe, EndpointManager, ManagerConfig,
    ProxyEndpointObserver, ReqwestTransportFactory, RouterSource, StaticSource,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub struct DnsServices {
    pub proxy: Arc<DnsProxy>,
    pub manager: Arc<EndpointManager>,
}

impl DnsServices {
    pub fn new(config: &ServiceConfig, logger: Arc<dyn ServiceLogger>) -> anyhow::Result<Self> {
        info!("Initializing DNS proxy and endpoint manager");

        // The query path reports into the manager that is built after it.
        let (reporter, signals) = failure_channel();
        let proxy = Arc::new(DnsProxy::new(
            Self::proxy_options(config)?,
            logger.clone(),
            reporter.clone(),
        ));

        let sources = Self::build_sources(config)?;
        let probe_timeout = Duration::from_millis(config.health.probe_timeout);
        let manager = Arc::new(EndpointManager::with_channel(
            sources,
            Arc::new(ReqwestTransportFactory::new(probe_timeout)),
            Arc::new(DohHealthProbe::new(&config.health.probe_name)?),
            Arc::new(ProxyEndpointObserver::new(proxy.clone(), logger)),
            ManagerConfig {
                probe_timeout,
                backoff: Duration::from_millis(config.health.backoff),
            },
            reporter,
            signals,
        ));

        Ok(Self { proxy, manager })
    }

    fn proxy_options(config: &ServiceConfig) -> anyhow::Result<DnsProxyOptions> {
        Ok(DnsProxyOptions {
            listen: config.proxy.listen.parse()?,
            query_timeout: Duration::from_millis(config.proxy.query_timeout),
            tcp: config.proxy.tcp,
            ..DnsProxyOptions::default()
        })
    }

    /// Routing API first, then every fallback in configured order.
    fn build_sources(config: &ServiceConfig) -> anyhow::Result<Vec<Arc<dyn EndpointSource>>> {
        let upstream = &config.upstream;
        let mut sources: Vec<Arc<dyn EndpointSource>> = Vec::new();

        if upstream.router_enabled() {
            let bootstrap = upstream
                .router_bootstrap
                .iter()
                .map(|ip| ip.parse::<IpAddr>())
                .collect::<Result<Vec<_>, _>>()?;
            sources.push(Arc::new(RouterSource::new(
                &upstream.router_url,
                bootstrap,
                Duration::from_millis(config.health.probe_timeout),
            )?));
        }

        for endpoint in upstream.parse_fallbacks()? {
            sources.push(Arc::new(StaticSource::new(endpoint)));
        }

        info!(
            sources = sources.len(),
            router = upstream.router_enabled(),
            "Endpoint sources configured"
        );
        Ok(sources)
    }
}
