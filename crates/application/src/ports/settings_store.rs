use doh_relay_domain::{DomainError, Settings};

/// Persistence boundary for [`Settings`].
pub trait SettingsStore: Send + Sync {
    /// Never fails: unreadable settings fall back to defaults.
    fn load(&self) -> Settings;

    fn save(&self, settings: &Settings) -> Result<(), DomainError>;
}
