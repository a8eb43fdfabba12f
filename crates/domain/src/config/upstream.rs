use serde::{Deserialize, Serialize};

use crate::{DomainError, Endpoint};

/// Upstream endpoint sources, in priority order: the routing API first, then
/// each entry of `fallbacks` as a static source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Routing API returning the preferred unicast endpoints. Empty disables it.
    #[serde(default = "default_router_url")]
    pub router_url: String,

    /// Fixed addresses of the routing API, so the lookup never needs DNS.
    #[serde(default = "default_router_bootstrap")]
    pub router_bootstrap: Vec<String>,

    /// Static endpoints in `hostname[@ip]` form: anycast first, CDN fronting last.
    #[serde(default = "default_fallbacks")]
    pub fallbacks: Vec<String>,
}

impl UpstreamConfig {
    pub fn router_enabled(&self) -> bool {
        !self.router_url.trim().is_empty()
    }

    pub fn parse_fallbacks(&self) -> Result<Vec<Endpoint>, DomainError> {
        self.fallbacks.iter().map(|s| s.parse()).collect()
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            router_url: default_router_url(),
            router_bootstrap: default_router_bootstrap(),
            fallbacks: default_fallbacks(),
        }
    }
}

fn default_router_url() -> String {
    "https://router.nextdns.io".to_string()
}

fn default_router_bootstrap() -> Vec<String> {
    vec![
        "216.239.32.21".to_string(),
        "216.239.34.21".to_string(),
        "216.239.36.21".to_string(),
        "216.239.38.21".to_string(),
    ]
}

fn default_fallbacks() -> Vec<String> {
    vec![
        "dns1.nextdns.io@45.90.28.0".to_string(),
        "dns2.nextdns.io@45.90.30.0".to_string(),
        "d1xovudkxbl47e.cloudfront.net".to_string(),
    ]
}
