//! Configuration: a TOML file overlaid with `LORAWAN_NS_`-prefixed
//! environment variables, following the same shape the band registry and
//! MAC command engine expect at construction time.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BandSettings {
    pub name: String,
    #[serde(default)]
    pub repeater_compatible: bool,
    #[serde(default)]
    pub downlink_dwell_time_400ms: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtraChannelSettings {
    pub frequency_hz: u32,
    pub min_dr: u8,
    pub max_dr: u8,
}

fn default_sweep_uplinks() -> u32 {
    lorawan_maccommand::tracker::DEFAULT_SWEEP_UPLINKS
}

fn default_error_ceiling() -> u32 {
    lorawan_maccommand::MAC_COMMAND_ERROR_CEILING_DEFAULT
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettings {
    #[serde(default)]
    pub extra_channels: Vec<ExtraChannelSettings>,
    #[serde(default = "default_sweep_uplinks")]
    pub pending_command_sweep_uplinks: u32,
    #[serde(default = "default_error_ceiling")]
    pub mac_command_error_ceiling: u32,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub band: BandSettings,
    #[serde(default = "default_network_settings")]
    pub network_settings: NetworkSettings,
    #[serde(default = "default_logging_settings")]
    pub logging: LoggingSettings,
}

fn default_network_settings() -> NetworkSettings {
    NetworkSettings {
        extra_channels: Vec::new(),
        pending_command_sweep_uplinks: default_sweep_uplinks(),
        mac_command_error_ceiling: default_error_ceiling(),
    }
}

fn default_logging_settings() -> LoggingSettings {
    LoggingSettings { level: default_log_level(), json: false }
}

impl Settings {
    /// Loads `path` (if it exists) and overlays `LORAWAN_NS_`-prefixed
    /// environment variables, e.g. `LORAWAN_NS_BAND__NAME=US915`.
    pub fn load(path: &str) -> Result<Settings, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LORAWAN_NS").separator("__"));
        builder.build()?.try_deserialize()
    }
}
