use lorawan_band::{Band, DwellTime, ExtraChannel};

use crate::error::SetupError;
use crate::settings::Settings;

pub fn setup_band(settings: &Settings) -> Result<Band, SetupError> {
    let dwell_time =
        if settings.band.downlink_dwell_time_400ms { DwellTime::Limit400ms } else { DwellTime::NoLimit };
    let extras: Vec<ExtraChannel> = settings
        .network_settings
        .extra_channels
        .iter()
        .map(|c| ExtraChannel { frequency_hz: c.frequency_hz, min_dr: c.min_dr, max_dr: c.max_dr })
        .collect();
    Band::setup(&settings.band.name, settings.band.repeater_compatible, dwell_time, &extras)
        .map_err(|source| SetupError::Band { name: settings.band.name.clone(), source })
}
