pub mod control;
pub mod errors;
pub mod health;
pub mod logging;
pub mod proxy;
pub mod root;
pub mod settings_file;
pub mod upstream;

pub use control::ControlConfig;
pub use errors::ConfigError;
pub use health::HealthCheckConfig;
pub use logging::LoggingConfig;
pub use proxy::ProxyConfig;
pub use root::{CliOverrides, ServiceConfig};
pub use settings_file::SettingsFileConfig;
pub use upstream::UpstreamConfig;
