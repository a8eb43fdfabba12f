use doh_relay_application::ports::{ProxyControl, ServiceLogger};
use doh_relay_application::services::SettingsCache;
use doh_relay_application::use_cases::{HandleControlEventUseCase, RestoreProxyStateUseCase};
use doh_relay_domain::ServiceConfig;
use doh_relay_infrastructure::control::{ConnectionRegistry, ControlServer, UseCaseControlHandler};
use doh_relay_infrastructure::settings::TomlSettingsStore;
use doh_relay_infrastructure::system::LoggingUpdater;
use std::sync::Arc;
use tracing::info;

pub struct ControlServices {
    pub server: ControlServer,
}

impl ControlServices {
    pub fn new(
        config: &ServiceConfig,
        proxy: Arc<dyn ProxyControl>,
        logger: Arc<dyn ServiceLogger>,
    ) -> Self {
        info!(
            settings = %config.settings.path,
            control = %config.control.path,
            "Initializing control channel"
        );

        let store = Arc::new(TomlSettingsStore::new(&config.settings.path));
        let settings = Arc::new(SettingsCache::new(store));
        let updater = Arc::new(LoggingUpdater::new());
        let registry = Arc::new(ConnectionRegistry::new());

        let handle_event = Arc::new(HandleControlEventUseCase::new(
            proxy.clone(),
            settings.clone(),
            updater.clone(),
            registry.clone(),
            logger.clone(),
        ));
        let restore = Arc::new(RestoreProxyStateUseCase::new(
            proxy, settings, updater, logger,
        ));

        let server = ControlServer::new(
            &config.control.path,
            registry,
            Arc::new(UseCaseControlHandler::new(handle_event, restore)),
        );

        Self { server }
    }
}
