mod forwarder;
mod observer;
mod server;

pub use observer::ProxyEndpointObserver;
pub use server::{DnsProxy, DnsProxyOptions};
