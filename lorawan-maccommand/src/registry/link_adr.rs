//! `LinkADRAns` (CID `0x03`): applies the channel-mask/data-rate/TX-power
//! acknowledgement rules, including the RN2483 firmware-1.0.3 power-0
//! workaround and the narrow-envelope-on-nACK rule.

use lorawan::maccommands::{LinkADRAnsPayload, LinkADRReqPayload};
use lorawan_band::Band;
use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

use super::LINK_ADR_ANS;
use crate::engine::EngineError;

fn malformed(reason: &'static str) -> EngineError {
    EngineError::MalformedBlock { cid: LINK_ADR_ANS, reason }
}

pub fn handle_answer(
    band: &Band,
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.is_empty() {
        return Err(malformed("at least one mac command expected, got none"));
    }
    let pending = pending.ok_or(EngineError::MissingPending(LINK_ADR_ANS))?;
    if pending.block.commands.is_empty() {
        return Err(malformed("expected pending mac command"));
    }

    let mut channel_mask_ack = true;
    let mut data_rate_ack = true;
    let mut power_ack = true;
    for raw in &block.commands {
        let ans = LinkADRAnsPayload::new(raw).map_err(|_| malformed("malformed LinkADRAns payload"))?;
        channel_mask_ack &= ans.channel_mask_ack();
        data_rate_ack &= ans.data_rate_ack();
        power_ack &= ans.powert_ack();
    }

    let link_adr_payloads: Vec<LinkADRReqPayload<'_>> = pending
        .block
        .commands
        .iter()
        .map(|raw| LinkADRReqPayload::new(raw).map_err(|_| malformed("malformed pending LinkADRReq payload")))
        .collect::<Result<_, _>>()?;
    // The burst sends the same tx_power and redundancy for every channel, so
    // the last request in the burst carries the values that apply.
    let adr_req = link_adr_payloads.last().expect("checked non-empty above");

    if channel_mask_ack && data_rate_ack && power_ack {
        session.mac_command_error_count.remove(&LINK_ADR_ANS);
        let chans = band.enabled_channels_after_mask(&session.enabled_uplink_channels, &link_adr_payloads)?;
        session.tx_power_index = adr_req.tx_power();
        session.dr = adr_req.data_rate();
        session.nb_trans = adr_req.redundancy().number_of_transmissions();
        session.enabled_uplink_channels = chans;
    } else if !session.adr && channel_mask_ack {
        session.mac_command_error_count.remove(&LINK_ADR_ANS);
        let chans = band.enabled_channels_after_mask(&session.enabled_uplink_channels, &link_adr_payloads)?;
        session.enabled_uplink_channels = chans;
        // No explicit status bit confirms nb_trans in this branch; the
        // behavior is preserved exactly as specified even though nothing
        // acknowledges it.
        session.nb_trans = adr_req.redundancy().number_of_transmissions();
        if data_rate_ack {
            session.dr = adr_req.data_rate();
        }
        if power_ack {
            session.tx_power_index = adr_req.tx_power();
        }
    } else {
        *session.mac_command_error_count.entry(LINK_ADR_ANS).or_insert(0) += 1;

        // RN2483 firmware 1.0.3 workaround: the device nACKs tx_power 0
        // instead of operating at its maximum supported power as the spec
        // requires.
        if !power_ack && adr_req.tx_power() == 0 {
            session.tx_power_index = 1;
            session.min_supported_tx_power_index = 1;
        }
        if !power_ack && adr_req.tx_power() > 0 {
            session.max_supported_tx_power_index = adr_req.tx_power() - 1;
        }
    }

    Ok(Vec::new())
}
