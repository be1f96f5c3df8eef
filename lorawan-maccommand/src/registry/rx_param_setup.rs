//! `RXParamSetupReq`/`Ans` (CID `0x05`): RX2 frequency, RX2 data rate and
//! RX1 data rate offset negotiation.

use lorawan::maccommandcreator::RXParamSetupReqCreator;
use lorawan::maccommands::{RXParamSetupAnsPayload, RXParamSetupReqPayload};
use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

use super::RX_PARAM_SETUP_ANS;
use crate::engine::EngineError;

fn malformed(reason: &'static str) -> EngineError {
    EngineError::MalformedBlock { cid: RX_PARAM_SETUP_ANS, reason }
}

pub fn handle_answer(
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.len() != 1 {
        return Err(malformed("expected exactly one RXParamSetupAns"));
    }
    let pending = pending.ok_or(EngineError::MissingPending(RX_PARAM_SETUP_ANS))?;
    if pending.block.commands.len() != 1 {
        return Err(malformed("expected exactly one pending RXParamSetupReq"));
    }

    let ans = RXParamSetupAnsPayload::new(&block.commands[0])
        .map_err(|_| malformed("malformed RXParamSetupAns payload"))?;
    let req = RXParamSetupReqPayload::new(&pending.block.commands[0])
        .map_err(|_| malformed("malformed pending RXParamSetupReq payload"))?;

    if ans.channel_ack() && ans.rx1_dr_offset_ack() && ans.rx2_data_rate_ack() {
        session.mac_command_error_count.remove(&RX_PARAM_SETUP_ANS);
        session.rx2_frequency = req.frequency().value();
        session.rx2_dr = req.dl_settings().rx2_data_rate() as u8;
        session.rx1_dr_offset = req.dl_settings().rx1_dr_offset();
    } else {
        *session.mac_command_error_count.entry(RX_PARAM_SETUP_ANS).or_insert(0) += 1;
    }

    Ok(Vec::new())
}

/// Builds the downlink `RXParamSetupReq` block for the tracker to record
/// as pending.
pub fn request(rx1_dr_offset: u8, rx2_dr: u8, rx2_freq_bytes: &[u8; 3]) -> Result<MACCommandBlock, EngineError> {
    let dl_settings = ((rx1_dr_offset & 0x07) << 4) | (rx2_dr & 0x0f);
    let mut creator = RXParamSetupReqCreator::new();
    creator.set_dl_settings(dl_settings).set_frequency(rx2_freq_bytes);
    let bytes = creator.build();
    Ok(MACCommandBlock::new(RX_PARAM_SETUP_ANS, vec![bytes[1..].to_vec()]))
}
