//! Startup-time errors, distinct from the per-uplink `EngineError`: these
//! surface a misconfigured deployment before any device traffic is handled.

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
    #[error("failed to set up band '{name}': {source}")]
    Band { name: String, #[source] source: lorawan_band::BandError },
}
