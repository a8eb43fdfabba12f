use doh_relay_domain::DomainError;

/// The three process log sinks.
pub trait ServiceLogger: Send + Sync {
    fn query(&self, qname: &str);

    fn info(&self, message: &str);

    fn error(&self, error: &DomainError);
}
