//! The MAC command engine: pairs an uplink's decoded MAC command blocks
//! with pending requests and applies the specification's per-command
//! acknowledgement rules to the device session.

use lorawan_band::{Band, BandError};
use lorawan_session::{DeviceSession, MACCommandBlock};

use crate::{registry, tracker};

/// Error kinds the engine distinguishes. Propagated verbatim to the caller;
/// CID and `dev_eui` are attached to the log event as `tracing` fields, not
/// formatted into the error message.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("mac command block for cid {cid:#04x} is malformed: {reason}")]
    MalformedBlock { cid: u8, reason: &'static str },
    #[error("no pending request recorded for cid {0:#04x}")]
    MissingPending(u8),
    #[error("band query failed: {0}")]
    Band(#[from] BandError),
    #[error("no handler registered for cid {0:#04x}")]
    UnknownCid(u8),
}

/// Correlation tag threaded through log events for a single uplink's
/// handling. Carries no protocol meaning.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub correlation_id: String,
}

impl RequestContext {
    pub fn new(correlation_id: impl Into<String>) -> Self {
        RequestContext { correlation_id: correlation_id.into() }
    }
}

/// Stateless dispatcher over the static command registry plus a borrowed
/// band. Owns no mutable state of its own; every mutation lands on the
/// `DeviceSession` passed to [`Engine::handle_uplink`].
pub struct Engine<'b> {
    band: &'b Band,
    sweep_uplinks: u32,
}

impl<'b> Engine<'b> {
    pub fn new(band: &'b Band, sweep_uplinks: u32) -> Self {
        registry::debug_assert_registry_complete();
        Engine { band, sweep_uplinks }
    }

    /// Processes one uplink's MAC command blocks in arrival order.
    ///
    /// Sweeps stale pending slots first, so a just-expired slot cannot be
    /// matched against this uplink's answer. A handler error aborts
    /// processing of the remaining blocks; mutations already applied by
    /// earlier blocks (and the sweep) are retained.
    pub fn handle_uplink(
        &self,
        ctx: &RequestContext,
        session: &mut DeviceSession,
        frame_counter: u32,
        blocks: &[MACCommandBlock],
    ) -> Result<Vec<MACCommandBlock>, EngineError> {
        let dev_eui = session.dev_eui;
        for cid in tracker::sweep(session, frame_counter, self.sweep_uplinks) {
            tracing::warn!(
                cid = format!("{cid:#04x}"),
                dev_eui = %hex::encode(dev_eui.as_ref()),
                correlation_id = %ctx.correlation_id,
                "pending mac command swept as lost"
            );
        }

        let mut outbound = Vec::new();
        for block in blocks {
            if !registry::is_registered(block.cid) {
                tracing::warn!(
                    cid = format!("{:#04x}", block.cid),
                    dev_eui = %hex::encode(dev_eui.as_ref()),
                    correlation_id = %ctx.correlation_id,
                    "mac command block with unknown cid"
                );
                return Err(EngineError::UnknownCid(block.cid));
            }
            let pending = tracker::take(session, block.cid);
            match registry::handle_uplink_block(self.band, session, block, pending.as_ref()) {
                Ok(new_blocks) => outbound.extend(new_blocks),
                Err(err) => {
                    tracing::warn!(
                        cid = format!("{:#04x}", block.cid),
                        dev_eui = %hex::encode(dev_eui.as_ref()),
                        correlation_id = %ctx.correlation_id,
                        error = %err,
                        "mac command block handling failed"
                    );
                    return Err(err);
                }
            }
        }
        Ok(outbound)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use lorawan::keys::AES128;
    use lorawan::maccommandcreator::{
        LinkADRAnsCreator, LinkADRReqCreator, PingSlotChannelAnsCreator, RXParamSetupAnsCreator,
    };
    use lorawan::parser::DevAddr;
    use lorawan_band::{Band, DwellTime};

    use super::*;
    use crate::registry::{LINK_ADR_ANS, PING_SLOT_CHANNEL_ANS, RX_PARAM_SETUP_ANS};
    use crate::tracker;

    fn session() -> DeviceSession {
        DeviceSession::new(
            lorawan::keys::DevEui::from([1, 2, 3, 4, 5, 6, 7, 8]),
            DevAddr::from(1u32),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
        )
    }

    fn us915() -> Band {
        Band::setup("US915", false, DwellTime::NoLimit, &[]).unwrap()
    }

    fn link_adr_req_bytes(tx_power: u8, data_rate: u8, mask: [u8; 2], redundancy: u8) -> Vec<u8> {
        let mut creator = LinkADRReqCreator::new();
        creator
            .set_data_rate(data_rate)
            .unwrap()
            .set_tx_power(tx_power)
            .unwrap()
            .set_channel_mask(mask)
            .set_redundancy(redundancy);
        creator.build()[1..].to_vec()
    }

    fn link_adr_ans_bytes(channel_mask_ack: bool, data_rate_ack: bool, power_ack: bool) -> Vec<u8> {
        let mut creator = LinkADRAnsCreator::new();
        creator
            .set_channel_mask_ack(channel_mask_ack)
            .set_data_rate_ack(data_rate_ack)
            .set_tx_power_ack(power_ack);
        creator.build()[1..].to_vec()
    }

    #[test]
    fn scenario_1_link_adr_full_ack() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        s.dr = 5;
        s.tx_power_index = 0;
        s.nb_trans = 1;
        s.mac_command_error_count.insert(LINK_ADR_ANS, 2);

        let req = link_adr_req_bytes(2, 3, [0xff, 0x00], 0x02); // nb_rep=2, control=0
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![req]), 1);

        let ans = link_adr_ans_bytes(true, true, true);
        let ctx = RequestContext::new("t");
        let out = engine
            .handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(LINK_ADR_ANS, vec![ans])])
            .unwrap();
        assert!(out.is_empty());
        assert_eq!(s.dr, 3);
        assert_eq!(s.tx_power_index, 2);
        assert_eq!(s.nb_trans, 2);
        assert_eq!(s.enabled_uplink_channels, (0..8).collect::<BTreeSet<_>>());
        assert_eq!(s.mac_command_error_count.get(&LINK_ADR_ANS), None);
    }

    #[test]
    fn scenario_2_link_adr_nack_on_power_zero() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        s.adr = true;
        s.dr = 5;

        let req = link_adr_req_bytes(0, 3, [0xff, 0x00], 0x00);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![req]), 1);

        let ans = link_adr_ans_bytes(true, true, false);
        let ctx = RequestContext::new("t");
        engine.handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(LINK_ADR_ANS, vec![ans])]).unwrap();

        assert_eq!(s.tx_power_index, 1);
        assert_eq!(s.min_supported_tx_power_index, 1);
        assert_eq!(s.dr, 5);
        assert_eq!(s.mac_command_error_count.get(&LINK_ADR_ANS), Some(&1));
    }

    #[test]
    fn scenario_3_link_adr_nack_on_power_above_zero() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        s.adr = true;
        s.tx_power_index = 7;

        let req = link_adr_req_bytes(5, 3, [0xff, 0x00], 0x00);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![req]), 1);

        let ans = link_adr_ans_bytes(true, true, false);
        let ctx = RequestContext::new("t");
        engine.handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(LINK_ADR_ANS, vec![ans])]).unwrap();

        assert_eq!(s.max_supported_tx_power_index, 4);
        assert_eq!(s.tx_power_index, 7);
        assert_eq!(s.mac_command_error_count.get(&LINK_ADR_ANS), Some(&1));
    }

    #[test]
    fn scenario_4_link_adr_disabled_partial_ack() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        s.adr = false;
        s.dr = 5;
        s.tx_power_index = 1;

        let req = link_adr_req_bytes(2, 3, [0xff, 0x00], 0x02);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![req]), 1);

        let ans = link_adr_ans_bytes(true, false, false);
        let ctx = RequestContext::new("t");
        engine.handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(LINK_ADR_ANS, vec![ans])]).unwrap();

        assert_eq!(s.enabled_uplink_channels, (0..8).collect::<BTreeSet<_>>());
        assert_eq!(s.nb_trans, 2);
        assert_eq!(s.dr, 5);
        assert_eq!(s.tx_power_index, 1);
        assert_eq!(s.mac_command_error_count.get(&LINK_ADR_ANS), None);
    }

    #[test]
    fn scenario_5_ping_slot_channel_nack() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();

        let req_block = crate::registry::request_ping_slot_channel(3, &[0x0a, 0x6e, 0x84]).unwrap();
        tracker::set(&mut s, PING_SLOT_CHANNEL_ANS, req_block, 1);

        let mut ans_creator = PingSlotChannelAnsCreator::new();
        ans_creator.set_channel_frequency_ok(false).set_data_rate_ok(true);
        let ans_bytes = ans_creator.build()[1..].to_vec();

        let ctx = RequestContext::new("t");
        engine
            .handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(PING_SLOT_CHANNEL_ANS, vec![ans_bytes])])
            .unwrap();

        assert_eq!(s.ping_slot_frequency, 0);
        assert_eq!(s.ping_slot_dr, 0);
        assert_eq!(s.mac_command_error_count.get(&PING_SLOT_CHANNEL_ANS), Some(&1));
    }

    #[test]
    fn scenario_6_rx_param_setup_ack() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();

        let req_block = crate::registry::request_rx_param_setup(1, 0, &[0x0a, 0x6e, 0x84]).unwrap();
        tracker::set(&mut s, RX_PARAM_SETUP_ANS, req_block, 1);

        let mut ans_creator = RXParamSetupAnsCreator::new();
        ans_creator.set_channel_ack(true).set_rx2_data_rate_ack(true).set_rx1_data_rate_offset_ack(true);
        let ans_bytes = ans_creator.build()[1..].to_vec();

        let ctx = RequestContext::new("t");
        engine
            .handle_uplink(&ctx, &mut s, 2, &[MACCommandBlock::new(RX_PARAM_SETUP_ANS, vec![ans_bytes])])
            .unwrap();

        assert_eq!(s.rx2_dr, 0);
        assert_eq!(s.rx1_dr_offset, 1);
        assert_eq!(s.rx2_frequency, lorawan::maccommands::Frequency::new_from_raw(&[0x0a, 0x6e, 0x84]).value());
        assert_eq!(s.mac_command_error_count.get(&RX_PARAM_SETUP_ANS), None);
    }

    #[test]
    fn scenario_7_pending_replacement_does_not_touch_error_counter() {
        let mut s = session();
        let burst1 = link_adr_req_bytes(2, 3, [0xff, 0x00], 0x00);
        let burst2 = link_adr_req_bytes(1, 2, [0x0f, 0x00], 0x00);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![burst1]), 10);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![burst2]), 12);
        assert_eq!(s.mac_command_error_count.get(&LINK_ADR_ANS), None);
    }

    #[test]
    fn scenario_8_sweep_discards_stale_pending_commands() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        let req = link_adr_req_bytes(2, 3, [0xff, 0x00], 0x00);
        tracker::set(&mut s, LINK_ADR_ANS, MACCommandBlock::new(LINK_ADR_ANS, vec![req]), 10);

        let ctx = RequestContext::new("t");
        engine.handle_uplink(&ctx, &mut s, 17, &[]).unwrap();
        assert!(s.pending_mac_commands.contains_key(&LINK_ADR_ANS));

        engine.handle_uplink(&ctx, &mut s, 18, &[]).unwrap();
        assert!(!s.pending_mac_commands.contains_key(&LINK_ADR_ANS));
    }

    #[test]
    fn scenario_9_unknown_cid_is_a_typed_error() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();
        let before = s.clone();

        let ctx = RequestContext::new("t");
        let err = engine.handle_uplink(&ctx, &mut s, 1, &[MACCommandBlock::new(0x7f, vec![vec![0]])]).unwrap_err();
        assert!(matches!(err, EngineError::UnknownCid(0x7f)));
        assert_eq!(s, before);
    }

    #[test]
    fn scenario_10_missing_pending_is_a_typed_error() {
        let band = us915();
        let engine = Engine::new(&band, tracker::DEFAULT_SWEEP_UPLINKS);
        let mut s = session();

        let mut ans_creator = RXParamSetupAnsCreator::new();
        ans_creator.set_channel_ack(true).set_rx2_data_rate_ack(true).set_rx1_data_rate_offset_ack(true);
        let ans_bytes = ans_creator.build()[1..].to_vec();

        let ctx = RequestContext::new("t");
        let err = engine
            .handle_uplink(&ctx, &mut s, 1, &[MACCommandBlock::new(RX_PARAM_SETUP_ANS, vec![ans_bytes])])
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingPending(cid) if cid == RX_PARAM_SETUP_ANS));
    }
}
