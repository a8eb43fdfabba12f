use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SettingsFileConfig {
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for SettingsFileConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

#[cfg(unix)]
fn default_path() -> String {
    "/var/lib/doh-relay/settings.toml".to_string()
}

#[cfg(windows)]
fn default_path() -> String {
    r"C:\ProgramData\doh-relay\settings.toml".to_string()
}
