//! Control channel for controller processes (GUI, CLI).
//!
//! A Unix domain socket (or a named pipe on Windows) carrying
//! newline-delimited JSON [`ControlEvent`](doh_relay_domain::ControlEvent)s in
//! both directions. Every outbound event is broadcast to all connections.

pub mod client;
pub mod codec;
pub mod handler;
pub mod registry;
pub mod server;

pub use client::ControlClient;
pub use handler::{ControlHandler, UseCaseControlHandler};
pub use registry::ConnectionRegistry;
pub use server::ControlServer;
