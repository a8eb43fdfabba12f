mod control;
mod dns;

pub use control::ControlServices;
pub use dns::DnsServices;
