//! Control channel messages.
//!
//! On the wire every message is a [`ControlEvent`]: a name plus an optional
//! untyped key/value payload. Inbound events are decoded into
//! [`ControlCommand`] at the boundary; outbound events are built from
//! [`Notification`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::settings::SettingsPatch;
use crate::{DomainError, Settings};

pub const EVENT_OPEN: &str = "open";
pub const EVENT_ENABLE: &str = "enable";
pub const EVENT_DISABLE: &str = "disable";
pub const EVENT_STATUS: &str = "status";
pub const EVENT_SETTINGS: &str = "settings";
pub const EVENT_ERROR: &str = "error";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlEvent {
    #[serde(alias = "Name")]
    pub name: String,

    #[serde(default, alias = "Data", skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl ControlEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    pub fn with_data(name: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            data: Some(data),
        }
    }
}

/// Inbound commands understood by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Another instance of the controller app was launched.
    Open,
    Enable,
    Disable,
    Status,
    /// `None` is a query; `Some` carries the keys to change.
    Settings(Option<SettingsPatch>),
}

impl TryFrom<&ControlEvent> for ControlCommand {
    type Error = DomainError;

    fn try_from(event: &ControlEvent) -> Result<Self, Self::Error> {
        match event.name.as_str() {
            EVENT_OPEN => Ok(Self::Open),
            EVENT_ENABLE => Ok(Self::Enable),
            EVENT_DISABLE => Ok(Self::Disable),
            EVENT_STATUS => Ok(Self::Status),
            EVENT_SETTINGS => Ok(Self::Settings(
                event.data.as_ref().map(SettingsPatch::from_map),
            )),
            other => Err(DomainError::UnknownEvent(other.to_string())),
        }
    }
}

/// Outbound notifications broadcast to every controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Open,
    Status { enabled: bool },
    Settings(Settings),
    Error { message: String },
}

impl Notification {
    pub fn error(err: &DomainError) -> Self {
        Self::Error {
            message: err.to_string(),
        }
    }

    pub fn into_event(self) -> ControlEvent {
        match self {
            Self::Open => ControlEvent::new(EVENT_OPEN),
            Self::Status { enabled } => {
                let mut data = Map::new();
                data.insert("enabled".to_string(), Value::Bool(enabled));
                ControlEvent::with_data(EVENT_STATUS, data)
            }
            Self::Settings(settings) => ControlEvent::with_data(EVENT_SETTINGS, settings.to_map()),
            Self::Error { message } => {
                let mut data = Map::new();
                data.insert("error".to_string(), Value::String(message));
                ControlEvent::with_data(EVENT_ERROR, data)
            }
        }
    }
}

impl From<Notification> for ControlEvent {
    fn from(n: Notification) -> Self {
        n.into_event()
    }
}
