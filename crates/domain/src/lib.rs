//! doh-relay domain layer
pub mod config;
pub mod control_event;
pub mod endpoint;
pub mod errors;
pub mod settings;

pub use config::{CliOverrides, ServiceConfig};
pub use control_event::{ControlCommand, ControlEvent, Notification};
pub use endpoint::{Endpoint, EndpointProtocol};
pub use errors::{DomainError, ErrorKind};
pub use settings::{Settings, SettingsPatch};
