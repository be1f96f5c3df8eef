//! Regional frequency-plan catalog for a LoRaWAN network server.
//!
//! A [`Band`] is built once from a region name, an optional dwell-time
//! setting and a list of extra channels, and is immutable afterwards. It
//! answers the pure queries the MAC command engine needs to apply a
//! `LinkADRReq` burst and to validate a data rate against the channels it
//! names.

use std::collections::BTreeSet;

use lorawan::maccommands::LinkADRReqPayload;

/// A single uplink channel: its center frequency and the data-rate range it
/// permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Channel {
    pub frequency_hz: u32,
    pub min_dr: u8,
    pub max_dr: u8,
}

impl Channel {
    const fn new(frequency_hz: u32, min_dr: u8, max_dr: u8) -> Self {
        Channel { frequency_hz, min_dr, max_dr }
    }

    fn accepts(&self, dr: u8) -> bool {
        dr >= self.min_dr && dr <= self.max_dr
    }
}

/// Downlink dwell-time constraint, configured per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DwellTime {
    NoLimit,
    Limit400ms,
}

/// An extra channel contributed by `network_settings.extra_channels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraChannel {
    pub frequency_hz: u32,
    pub min_dr: u8,
    pub max_dr: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BandError {
    #[error("unknown region {0:?}")]
    UnknownRegion(String),
    #[error("region {0:?} produced an empty channel catalog")]
    EmptyChannelCatalog(String),
    #[error("channel mask control value {0} is not supported")]
    InvalidChannelMaskControl(u8),
    #[error("channel mask references undefined channel index {0}")]
    UndefinedChannel(usize),
    #[error("link_adr request burst would leave no enabled channels")]
    EmptyChannelSet,
    #[error("extra channel index {0} out of range for a 2-byte channel mask block")]
    ExtraChannelOutOfRange(usize),
}

/// Well-known region identifiers this registry ships a built-in table for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Eu868,
    Us915,
}

impl Region {
    fn parse(name: &str) -> Option<Region> {
        match name {
            "EU868" => Some(Region::Eu868),
            "US915" => Some(Region::Us915),
            _ => None,
        }
    }

    /// The region's built-in channel plan, before extra channels are appended.
    fn base_channels(self) -> Vec<Channel> {
        match self {
            Region::Eu868 => vec![
                Channel::new(868_100_000, 0, 5),
                Channel::new(868_300_000, 0, 5),
                Channel::new(868_500_000, 0, 5),
            ],
            Region::Us915 => {
                let mut channels = Vec::with_capacity(72);
                for i in 0..64u32 {
                    channels.push(Channel::new(902_300_000 + i * 200_000, 0, 3));
                }
                for i in 0..8u32 {
                    channels.push(Channel::new(903_000_000 + i * 1_600_000, 4, 4));
                }
                channels
            }
        }
    }
}

/// A configured, immutable regional frequency plan.
///
/// Constructed once via [`Band::setup`] and shared read-only afterwards
/// (typically behind an `Arc`); none of its methods mutate state or perform
/// I/O.
#[derive(Debug)]
pub struct Band {
    name: String,
    repeater_compatible: bool,
    dwell_time: DwellTime,
    channels: Vec<Channel>,
}

impl Band {
    /// Builds a band from a region name plus the extra channels a
    /// deployment wants appended to the region's built-in plan.
    ///
    /// Mirrors the two-step original shape: resolve the named region, then
    /// append each extra channel, failing the whole setup if any step does.
    pub fn setup(
        name: &str,
        repeater_compatible: bool,
        dwell_time: DwellTime,
        extra_channels: &[ExtraChannel],
    ) -> Result<Band, BandError> {
        let region = Region::parse(name).ok_or_else(|| BandError::UnknownRegion(name.to_string()))?;
        let mut channels = region.base_channels();
        for extra in extra_channels {
            channels.push(Channel::new(extra.frequency_hz, extra.min_dr, extra.max_dr));
        }
        if channels.is_empty() {
            return Err(BandError::EmptyChannelCatalog(name.to_string()));
        }
        Ok(Band { name: name.to_string(), repeater_compatible, dwell_time, channels })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn repeater_compatible(&self) -> bool {
        self.repeater_compatible
    }

    pub fn dwell_time(&self) -> DwellTime {
        self.dwell_time
    }

    /// The configured channels: built-ins followed by any extra channels,
    /// in catalog (index) order.
    pub fn channel_catalog(&self) -> &[Channel] {
        &self.channels
    }

    /// Applies a `LinkADRReq` burst's channel-mask-control bytes to
    /// `current_channels`, returning the resulting enabled set.
    ///
    /// Each request in the burst contributes a 16-channel mask block,
    /// indexed by `channel_mask_control` (0..=4 select a 16-channel block of
    /// the catalog; 5 clears every channel; 6 enables every channel; other
    /// values are rejected). This mirrors how the LoRaWAN fixed channel
    /// plans (e.g. US915's 72 channels) are partitioned into mask-sized
    /// blocks; single-block regions such as EU868 only ever see control 0.
    pub fn enabled_channels_after_mask(
        &self,
        current_channels: &BTreeSet<usize>,
        requests: &[LinkADRReqPayload<'_>],
    ) -> Result<BTreeSet<usize>, BandError> {
        let mut working = current_channels.clone();
        for req in requests {
            let control = req.redundancy().channel_mask_control();
            let mask = req.channel_mask();
            match control {
                0..=4 => {
                    let base = control as usize * 16;
                    for bit in 0..16 {
                        let idx = base + bit;
                        let enabled = mask.is_enabled(bit).unwrap_or(false);
                        if idx >= self.channels.len() {
                            if enabled {
                                return Err(BandError::UndefinedChannel(idx));
                            }
                            continue;
                        }
                        if enabled {
                            working.insert(idx);
                        } else {
                            working.remove(&idx);
                        }
                    }
                }
                5 => working.clear(),
                6 => working = (0..self.channels.len()).collect(),
                other => return Err(BandError::InvalidChannelMaskControl(other)),
            }
        }
        if working.is_empty() {
            return Err(BandError::EmptyChannelSet);
        }
        Ok(working)
    }

    /// Whether `dr` is legal on every channel named by `channels`.
    ///
    /// Vacuously true for an empty channel set.
    pub fn is_dr_valid_for_channels(&self, dr: u8, channels: &BTreeSet<usize>) -> bool {
        channels.iter().all(|&idx| match self.channels.get(idx) {
            Some(channel) => channel.accepts(dr),
            None => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorawan::maccommandcreator::LinkADRReqCreator;

    fn link_adr_req(data_rate: u8, tx_power: u8, mask: [u8; 2], redundancy: u8) -> Vec<u8> {
        let mut creator = LinkADRReqCreator::new();
        creator
            .set_data_rate(data_rate)
            .unwrap()
            .set_tx_power(tx_power)
            .unwrap()
            .set_channel_mask(mask)
            .set_redundancy(redundancy);
        creator.build().to_vec()
    }

    fn parse_req(bytes: &[u8]) -> LinkADRReqPayload<'_> {
        LinkADRReqPayload::new_from_raw(&bytes[1..])
    }

    #[test]
    fn eu868_has_three_default_channels() {
        let band = Band::setup("EU868", false, DwellTime::NoLimit, &[]).unwrap();
        assert_eq!(band.channel_catalog().len(), 3);
    }

    #[test]
    fn us915_has_seventy_two_channels() {
        let band = Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap();
        assert_eq!(band.channel_catalog().len(), 72);
    }

    #[test]
    fn unknown_region_is_an_error() {
        let err = Band::setup("EU999", false, DwellTime::NoLimit, &[]).unwrap_err();
        assert_eq!(err, BandError::UnknownRegion("EU999".to_string()));
    }

    #[test]
    fn extra_channels_are_appended_to_the_catalog() {
        let extra = ExtraChannel { frequency_hz: 868_850_000, min_dr: 0, max_dr: 5 };
        let band = Band::setup("EU868", false, DwellTime::NoLimit, &[extra]).unwrap();
        assert_eq!(band.channel_catalog().len(), 4);
        assert_eq!(band.channel_catalog()[3].frequency_hz, 868_850_000);
    }

    #[test]
    fn single_block_mask_enables_and_disables_channels() {
        let band = Band::setup("EU868", false, DwellTime::NoLimit, &[]).unwrap();
        let current: BTreeSet<usize> = (0..3).collect();
        let bytes = link_adr_req(3, 2, [0b0000_0011, 0x00], 0x00);
        let req = parse_req(&bytes);
        let enabled = band.enabled_channels_after_mask(&current, &[req]).unwrap();
        assert_eq!(enabled, BTreeSet::from([0, 1]));
    }

    #[test]
    fn multi_block_burst_unions_across_requests() {
        let band = Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap();
        let current: BTreeSet<usize> = BTreeSet::new();
        let block0 = link_adr_req(0, 0, [0xff, 0xff], 0x00);
        let block4 = link_adr_req(0, 0, [0x01, 0x00], 0x40);
        let req0 = parse_req(&block0);
        let req4 = parse_req(&block4);
        let enabled = band.enabled_channels_after_mask(&current, &[req0, req4]).unwrap();
        assert_eq!(enabled.len(), 17);
        assert!(enabled.contains(&0));
        assert!(enabled.contains(&15));
        assert!(enabled.contains(&64));
        assert!(!enabled.contains(&65));
    }

    #[test]
    fn channel_mask_control_six_enables_every_channel() {
        let band = Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap();
        let current: BTreeSet<usize> = BTreeSet::new();
        let bytes = link_adr_req(0, 0, [0x00, 0x00], 0x60);
        let req = parse_req(&bytes);
        let enabled = band.enabled_channels_after_mask(&current, &[req]).unwrap();
        assert_eq!(enabled.len(), 72);
    }

    #[test]
    fn channel_mask_control_five_clears_every_channel_and_errors_on_empty_result() {
        let band = Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap();
        let current: BTreeSet<usize> = (0..72).collect();
        let bytes = link_adr_req(0, 0, [0x00, 0x00], 0x50);
        let req = parse_req(&bytes);
        let err = band.enabled_channels_after_mask(&current, &[req]).unwrap_err();
        assert_eq!(err, BandError::EmptyChannelSet);
    }

    #[test]
    fn mask_bit_for_undefined_channel_is_an_error() {
        let band = Band::setup("EU868", false, DwellTime::NoLimit, &[]).unwrap();
        let current: BTreeSet<usize> = (0..3).collect();
        let bytes = link_adr_req(0, 0, [0x01, 0x00], 0x10);
        let req = parse_req(&bytes);
        assert!(matches!(
            band.enabled_channels_after_mask(&current, &[req]),
            Err(BandError::UndefinedChannel(_))
        ));
    }

    #[test]
    fn dr_validity_checks_every_named_channel() {
        let band = Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap();
        let dr4_channels: BTreeSet<usize> = BTreeSet::from([64, 65]);
        assert!(band.is_dr_valid_for_channels(4, &dr4_channels));
        assert!(!band.is_dr_valid_for_channels(0, &dr4_channels));
        assert!(band.is_dr_valid_for_channels(7, &BTreeSet::new()));
    }
}
