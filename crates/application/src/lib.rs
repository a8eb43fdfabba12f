//! doh-relay application layer: ports and the service orchestration use cases.
pub mod ports;
pub mod services;
pub mod use_cases;
