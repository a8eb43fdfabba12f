use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Address the plaintext DNS listener binds to.
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Upper bound for forwarding one query upstream, in milliseconds.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,

    #[serde(default = "default_true")]
    pub tcp: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            query_timeout: default_query_timeout(),
            tcp: true,
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:53".to_string()
}

fn default_query_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}
