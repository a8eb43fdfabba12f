pub mod health;
pub mod manager;
pub mod source;

pub use health::DohHealthProbe;
pub use manager::{
    failure_channel, EndpointManager, FailureReporter, FailureSignals, ManagerConfig,
};
pub use source::{RouterSource, StaticSource};
