use crate::ports::{ControlBroadcaster, ProxyControl, ServiceLogger, UpdaterPort};
use crate::services::SettingsCache;
use doh_relay_domain::settings::SettingsPatch;
use doh_relay_domain::{ControlCommand, ControlEvent, DomainError, Notification};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Applies one inbound control event and broadcasts the resulting state.
///
/// Every command runs inside a single critical section covering the state
/// change, the settings write and the broadcasts, so concurrent controllers
/// observe commands one at a time and in the same order.
pub struct HandleControlEventUseCase {
    proxy: Arc<dyn ProxyControl>,
    settings: Arc<SettingsCache>,
    updater: Arc<dyn UpdaterPort>,
    broadcaster: Arc<dyn ControlBroadcaster>,
    logger: Arc<dyn ServiceLogger>,
    critical: Mutex<()>,
}

impl HandleControlEventUseCase {
    pub fn new(
        proxy: Arc<dyn ProxyControl>,
        settings: Arc<SettingsCache>,
        updater: Arc<dyn UpdaterPort>,
        broadcaster: Arc<dyn ControlBroadcaster>,
        logger: Arc<dyn ServiceLogger>,
    ) -> Self {
        Self {
            proxy,
            settings,
            updater,
            broadcaster,
            logger,
            critical: Mutex::new(()),
        }
    }

    /// Returns an error only for events that are not understood; those are
    /// logged and nothing is broadcast.
    pub async fn execute(&self, event: &ControlEvent) -> Result<(), DomainError> {
        info!(name = %event.name, data = ?event.data, "Received control event");

        let command = match ControlCommand::try_from(event) {
            Ok(c) => c,
            Err(e) => {
                self.logger.error(&e);
                return Err(e);
            }
        };

        let _guard = self.critical.lock().await;
        match command {
            ControlCommand::Open => {
                self.publish(Notification::Open);
            }
            ControlCommand::Enable => self.set_enabled(true).await,
            ControlCommand::Disable => self.set_enabled(false).await,
            ControlCommand::Status => self.publish_status(),
            ControlCommand::Settings(Some(patch)) => self.update_settings(patch).await,
            ControlCommand::Settings(None) => {
                let current = self.settings.current().await;
                self.publish(Notification::Settings(current));
            }
        }
        Ok(())
    }

    async fn set_enabled(&self, enabled: bool) {
        let result = if enabled {
            self.proxy.start().await
        } else {
            self.proxy.stop().await
        };

        let (_, persist_error) = self.settings.update(|s| s.enabled = enabled).await;
        if let Some(e) = persist_error {
            self.report(&e);
        }

        if let Err(e) = result {
            self.report(&e);
        }
        self.publish_status();
    }

    async fn update_settings(&self, mut patch: SettingsPatch) {
        // The running state belongs to enable/disable.
        if patch.enabled.take().is_some() {
            debug!("Ignoring enabled flag in settings payload");
        }

        let (applied, persist_error) = self.settings.update(|s| s.apply(&patch)).await;
        if let Some(e) = persist_error {
            self.report(&e);
        }

        self.proxy.set_upstream_path(&applied.configuration);
        self.updater.set_auto_run(!applied.disable_check_update);
        self.publish(Notification::Settings(applied));
    }

    fn publish_status(&self) {
        self.publish(Notification::Status {
            enabled: self.proxy.started(),
        });
    }

    fn report(&self, error: &DomainError) {
        self.logger.error(error);
        self.publish(Notification::error(error));
    }

    fn publish(&self, notification: Notification) {
        let delivered = self.broadcaster.broadcast(notification.into_event());
        debug!(delivered, "Broadcast control event");
    }
}
