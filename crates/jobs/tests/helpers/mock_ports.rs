#![allow(dead_code)]

use async_trait::async_trait;
use doh_relay_application::ports::EndpointRecheckPort;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct MockRecheckPort {
    calls: AtomicU64,
}

impl MockRecheckPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointRecheckPort for MockRecheckPort {
    async fn recheck(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
