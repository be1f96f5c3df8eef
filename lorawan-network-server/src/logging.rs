//! Structured logging setup: a plain, human-readable format for a
//! terminal and a JSON format for log aggregation, selected by
//! `logging.json`.

use tracing_subscriber::EnvFilter;

use crate::settings::LoggingSettings;

pub fn init(settings: &LoggingSettings) {
    let filter = EnvFilter::try_new(&settings.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
