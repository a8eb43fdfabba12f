use crate::ports::{ProxyControl, ServiceLogger, UpdaterPort};
use crate::services::SettingsCache;
use std::sync::Arc;
use tracing::info;

/// Runs once the control channel is open: applies the persisted settings and
/// starts the proxy when it was left enabled.
pub struct RestoreProxyStateUseCase {
    proxy: Arc<dyn ProxyControl>,
    settings: Arc<SettingsCache>,
    updater: Arc<dyn UpdaterPort>,
    logger: Arc<dyn ServiceLogger>,
}

impl RestoreProxyStateUseCase {
    pub fn new(
        proxy: Arc<dyn ProxyControl>,
        settings: Arc<SettingsCache>,
        updater: Arc<dyn UpdaterPort>,
        logger: Arc<dyn ServiceLogger>,
    ) -> Self {
        Self {
            proxy,
            settings,
            updater,
            logger,
        }
    }

    pub async fn execute(&self) {
        let settings = self.settings.current().await;
        self.proxy.set_upstream_path(&settings.configuration);
        self.updater.set_auto_run(!settings.disable_check_update);

        if !settings.enabled {
            info!("Proxy left disabled by persisted settings");
            return;
        }

        match self.proxy.start().await {
            Ok(()) => self.logger.info("Proxy restored to enabled state"),
            Err(e) => self.logger.error(&e),
        }
    }
}
