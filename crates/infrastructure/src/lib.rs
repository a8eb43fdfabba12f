//! doh-relay adapters: DoH transport, endpoint selection, the DNS proxy, the
//! control channel, settings persistence and log sinks.
pub mod control;
pub mod dns;
pub mod settings;
pub mod system;
