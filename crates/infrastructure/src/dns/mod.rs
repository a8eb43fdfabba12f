pub mod endpoint;
pub mod proxy;
pub mod transport;
pub mod wire;

pub use endpoint::{
    failure_channel, DohHealthProbe, EndpointManager, FailureReporter, FailureSignals,
    ManagerConfig, RouterSource, StaticSource,
};
pub use proxy::{DnsProxy, DnsProxyOptions, ProxyEndpointObserver};
pub use transport::{HttpsTransport, ReqwestTransportFactory};
