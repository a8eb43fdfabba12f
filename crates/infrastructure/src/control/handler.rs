use async_trait::async_trait;
use doh_relay_application::use_cases::{HandleControlEventUseCase, RestoreProxyStateUseCase};
use doh_relay_domain::ControlEvent;
use std::sync::Arc;
use tracing::debug;

/// What the control server does with the channel.
#[async_trait]
pub trait ControlHandler: Send + Sync {
    /// Runs once after the channel is bound, before the first connection is served.
    async fn on_start(&self) {}

    /// Applies one inbound event. Events of one connection are handled in
    /// receipt order.
    async fn handle(&self, event: ControlEvent);
}

/// Routes the channel to the service use cases.
pub struct UseCaseControlHandler {
    handle_event: Arc<HandleControlEventUseCase>,
    restore: Arc<RestoreProxyStateUseCase>,
}

impl UseCaseControlHandler {
    pub fn new(
        handle_event: Arc<HandleControlEventUseCase>,
        restore: Arc<RestoreProxyStateUseCase>,
    ) -> Self {
        Self {
            handle_event,
            restore,
        }
    }
}

#[async_trait]
impl ControlHandler for UseCaseControlHandler {
    async fn on_start(&self) {
        self.restore.execute().await;
    }

    async fn handle(&self, event: ControlEvent) {
        // Unknown events are already reported by the use case.
        if let Err(e) = self.handle_event.execute(&event).await {
            debug!(error = %e, "Control event rejected");
        }
    }
}
