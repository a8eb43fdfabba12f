use doh_relay_application::ports::SettingsStore;
use doh_relay_domain::{DomainError, Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// [`Settings`] persisted as a small TOML file.
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "settings.toml".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Settings {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No settings file, using defaults");
                return Settings::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read settings, using defaults");
                return Settings::default();
            }
        };

        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Corrupt settings file, using defaults");
                Settings::default()
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), DomainError> {
        let persist_failed = |e: &dyn std::fmt::Display| {
            DomainError::PersistenceFailed(format!("{}: {}", self.path.display(), e))
        };

        let content = toml::to_string_pretty(settings).map_err(|e| persist_failed(&e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| persist_failed(&e))?;
            }
        }

        let temp = self.temp_path();
        std::fs::write(&temp, content).map_err(|e| persist_failed(&e))?;
        if let Err(e) = std::fs::rename(&temp, &self.path) {
            let _ = std::fs::remove_file(&temp);
            return Err(persist_failed(&e));
        }

        debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}
