mod control_broadcaster;
mod dns_transport;
mod endpoint_observer;
mod endpoint_recheck;
mod endpoint_source;
mod health_probe;
mod proxy_control;
mod service_logger;
mod settings_store;
mod updater;

pub use control_broadcaster::ControlBroadcaster;
pub use dns_transport::{DnsTransport, TransportFactory};
pub use endpoint_observer::EndpointObserver;
pub use endpoint_recheck::EndpointRecheckPort;
pub use endpoint_source::EndpointSource;
pub use health_probe::HealthProbe;
pub use proxy_control::ProxyControl;
pub use service_logger::ServiceLogger;
pub use settings_store::SettingsStore;
pub use updater::UpdaterPort;
