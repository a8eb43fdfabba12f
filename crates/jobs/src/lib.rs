pub mod endpoint_recheck;
pub mod runner;

pub use endpoint_recheck::EndpointRecheckJob;
pub use runner::JobRunner;
