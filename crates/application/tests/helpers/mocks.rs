#![allow(dead_code)]

use async_trait::async_trait;
use doh_relay_application::ports::{
    ControlBroadcaster, ProxyControl, ServiceLogger, SettingsStore, UpdaterPort,
};
use doh_relay_domain::{ControlEvent, DomainError, Settings};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct MockProxy {
    started: AtomicBool,
    fail_start: AtomicBool,
    start_calls: AtomicU64,
    stop_calls: AtomicU64,
    upstream_path: Mutex<String>,
}

impl MockProxy {
    pub fn new() -> Self {
        Self {
            started: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            start_calls: AtomicU64::new(0),
            stop_calls: AtomicU64::new(0),
            upstream_path: Mutex::new(String::new()),
        }
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> u64 {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> u64 {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn upstream_path(&self) -> String {
        self.upstream_path.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyControl for MockProxy {
    async fn start(&self) -> Result<(), DomainError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(DomainError::ProxyBindFailed {
                addr: "127.0.0.1:53".to_string(),
                reason: "address in use".to_string(),
            });
        }
        self.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), DomainError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        self.started.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    fn set_upstream_path(&self, path: &str) {
        *self.upstream_path.lock().unwrap() = path.to_string();
    }
}

pub struct MockSettingsStore {
    settings: Mutex<Settings>,
    fail_save: AtomicBool,
    saves: AtomicU64,
}

impl MockSettingsStore {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            fail_save: AtomicBool::new(false),
            saves: AtomicU64::new(0),
        }
    }

    pub fn set_fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    pub fn saves(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    /// Simulates another process editing the settings file.
    pub fn overwrite(&self, settings: Settings) {
        *self.settings.lock().unwrap() = settings;
    }
}

impl SettingsStore for MockSettingsStore {
    fn load(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    fn save(&self, settings: &Settings) -> Result<(), DomainError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(DomainError::PersistenceFailed("read-only filesystem".to_string()));
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}

pub struct MockUpdater {
    auto_run: Mutex<Option<bool>>,
}

impl MockUpdater {
    pub fn new() -> Self {
        Self {
            auto_run: Mutex::new(None),
        }
    }

    pub fn auto_run(&self) -> Option<bool> {
        *self.auto_run.lock().unwrap()
    }
}

impl UpdaterPort for MockUpdater {
    fn set_auto_run(&self, enabled: bool) {
        *self.auto_run.lock().unwrap() = Some(enabled);
    }
}

pub struct RecordingBroadcaster {
    events: Mutex<Vec<ControlEvent>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ControlEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl ControlBroadcaster for RecordingBroadcaster {
    fn broadcast(&self, event: ControlEvent) -> usize {
        self.events.lock().unwrap().push(event);
        1
    }
}

pub struct RecordingLogger {
    pub queries: Mutex<Vec<String>>,
    pub infos: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<DomainError>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self {
            queries: Mutex::new(Vec::new()),
            infos: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn errors(&self) -> Vec<DomainError> {
        self.errors.lock().unwrap().clone()
    }
}

impl ServiceLogger for RecordingLogger {
    fn query(&self, qname: &str) {
        self.queries.lock().unwrap().push(qname.to_string());
    }

    fn info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, error: &DomainError) {
        self.errors.lock().unwrap().push(error.clone());
    }
}

pub struct Harness {
    pub proxy: Arc<MockProxy>,
    pub store: Arc<MockSettingsStore>,
    pub updater: Arc<MockUpdater>,
    pub broadcaster: Arc<RecordingBroadcaster>,
    pub logger: Arc<RecordingLogger>,
}

impl Harness {
    pub fn new(settings: Settings) -> Self {
        Self {
            proxy: Arc::new(MockProxy::new()),
            store: Arc::new(MockSettingsStore::with_settings(settings)),
            updater: Arc::new(MockUpdater::new()),
            broadcaster: Arc::new(RecordingBroadcaster::new()),
            logger: Arc::new(RecordingLogger::new()),
        }
    }
}
