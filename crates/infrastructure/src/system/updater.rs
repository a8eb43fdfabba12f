use doh_relay_application::ports::UpdaterPort;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Keeps the auto-run flag of the self-update checker and logs changes.
#[derive(Debug)]
pub struct LoggingUpdater {
    auto_run: AtomicBool,
}

impl LoggingUpdater {
    pub fn new() -> Self {
        Self {
            auto_run: AtomicBool::new(true),
        }
    }

    pub fn auto_run(&self) -> bool {
        self.auto_run.load(Ordering::SeqCst)
    }
}

impl Default for LoggingUpdater {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdaterPort for LoggingUpdater {
    fn set_auto_run(&self, enabled: bool) {
        let previous = self.auto_run.swap(enabled, Ordering::SeqCst);
        if previous != enabled {
            info!(auto_run = enabled, "Update checker auto-run changed");
        }
    }
}
