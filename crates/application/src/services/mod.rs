pub mod settings_cache;

pub use settings_cache::SettingsCache;
