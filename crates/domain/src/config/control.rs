use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControlConfig {
    /// Unix socket path, or named pipe name on Windows.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

#[cfg(unix)]
fn default_path() -> String {
    "/var/run/doh-relay.sock".to_string()
}

#[cfg(windows)]
fn default_path() -> String {
    r"\\.\pipe\doh-relay".to_string()
}
