pub mod dns;
pub mod doh_server_mock;
pub mod mocks;

pub use dns::*;
pub use doh_server_mock::*;
pub use mocks::*;
