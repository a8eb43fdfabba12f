use crate::ports::SettingsStore;
use doh_relay_domain::{DomainError, Settings};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

struct CacheState {
    current: Settings,
    unsaved: bool,
}

/// In-memory copy of [`Settings`] in front of a [`SettingsStore`].
///
/// While the last write reached the store, every read reloads from it. After
/// a failed write the in-memory value stays authoritative until a later write
/// succeeds.
pub struct SettingsCache {
    store: Arc<dyn SettingsStore>,
    state: Mutex<CacheState>,
}

impl SettingsCache {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        let current = store.load();
        Self {
            store,
            state: Mutex::new(CacheState {
                current,
                unsaved: false,
            }),
        }
    }

    pub async fn current(&self) -> Settings {
        let mut state = self.state.lock().await;
        if !state.unsaved {
            state.current = self.store.load();
        }
        state.current.clone()
    }

    /// Applies `change` to the current settings and persists the result.
    ///
    /// The new value is returned even when persisting fails; the error is
    /// returned alongside it.
    pub async fn update<F>(&self, change: F) -> (Settings, Option<DomainError>)
    where
        F: FnOnce(&mut Settings),
    {
        let mut state = self.state.lock().await;
        let mut next = if state.unsaved {
            state.current.clone()
        } else {
            self.store.load()
        };
        change(&mut next);

        let error = match self.store.save(&next) {
            Ok(()) => {
                state.unsaved = false;
                None
            }
            Err(e) => {
                warn!(error = %e, "Settings kept in memory only");
                state.unsaved = true;
                Some(e)
            }
        };
        state.current = next.clone();
        (next, error)
    }
}
