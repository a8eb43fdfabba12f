mod logger;
mod updater;

pub use logger::TracingServiceLogger;
pub use updater::LoggingUpdater;
