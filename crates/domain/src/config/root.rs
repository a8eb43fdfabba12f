use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use super::control::ControlConfig;
use super::errors::ConfigError;
use super::health::HealthCheckConfig;
use super::logging::LoggingConfig;
use super::proxy::ProxyConfig;
use super::settings_file::SettingsFileConfig;
use super::upstream::UpstreamConfig;

const LOCAL_CONFIG_PATH: &str = "doh-relay.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/doh-relay/config.toml";

/// Main configuration structure for the relay service
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ServiceConfig {
    /// Plaintext DNS listener
    #[serde(default)]
    pub proxy: ProxyConfig,

    /// Local control channel
    #[serde(default)]
    pub control: ControlConfig,

    /// Upstream endpoint sources
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Endpoint probing and failover timing
    #[serde(default)]
    pub health: HealthCheckConfig,

    /// Location of the user settings file
    #[serde(default)]
    pub settings: SettingsFileConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. doh-relay.toml in current directory
    /// 3. /etc/doh-relay/config.toml
    /// 4. Default configuration
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new(LOCAL_CONFIG_PATH).exists() {
            Self::from_file(LOCAL_CONFIG_PATH)?
        } else if std::path::Path::new(SYSTEM_CONFIG_PATH).exists() {
            Self::from_file(SYSTEM_CONFIG_PATH)?
        } else {
            Self::default()
        };

        config.apply_cli_overrides(cli_overrides);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(listen) = overrides.listen {
            self.proxy.listen = listen;
        }
        if let Some(path) = overrides.control_path {
            self.control.path = path;
        }
        if let Some(path) = overrides.settings_path {
            self.settings.path = path;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.proxy.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid proxy listen address: {}",
                self.proxy.listen
            )));
        }

        if self.proxy.query_timeout == 0 || self.health.probe_timeout == 0 {
            return Err(ConfigError::Validation(
                "Timeouts must be greater than zero".to_string(),
            ));
        }

        if self.control.path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Control channel path cannot be empty".to_string(),
            ));
        }

        if !self.upstream.router_enabled() && self.upstream.fallbacks.is_empty() {
            return Err(ConfigError::Validation(
                "No upstream endpoints configured".to_string(),
            ));
        }

        if self.upstream.router_enabled() {
            if self.upstream.router_bootstrap.is_empty() {
                return Err(ConfigError::Validation(
                    "Router requires at least one bootstrap address".to_string(),
                ));
            }
            for ip in &self.upstream.router_bootstrap {
                if ip.parse::<IpAddr>().is_err() {
                    return Err(ConfigError::Validation(format!(
                        "Invalid router bootstrap address: {}",
                        ip
                    )));
                }
            }
        }

        self.upstream
            .parse_fallbacks()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        Ok(())
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub listen: Option<String>,
    pub control_path: Option<String>,
    pub settings_path: Option<String>,
    pub log_level: Option<String>,
}
