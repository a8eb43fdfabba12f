use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthCheckConfig {
    /// Upper bound for a single probe, in milliseconds.
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout: u64,

    /// Pause before restarting selection once every candidate failed, in milliseconds.
    #[serde(default = "default_backoff")]
    pub backoff: u64,

    /// Interval between re-checks of higher-priority endpoints, in seconds.
    #[serde(default = "default_recheck_interval")]
    pub recheck_interval: u64,

    /// Name queried by the health probe.
    #[serde(default = "default_probe_name")]
    pub probe_name: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout: default_probe_timeout(),
            backoff: default_backoff(),
            recheck_interval: default_recheck_interval(),
            probe_name: default_probe_name(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    2000
}

fn default_backoff() -> u64 {
    5000
}

fn default_recheck_interval() -> u64 {
    300
}

fn default_probe_name() -> String {
    "probe-test.dns.nextdns.io".to_string()
}
