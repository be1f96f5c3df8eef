//! `PingSlotChannelReq`/`Ans` (CID `0x11`): class-B beacon slot frequency
//! and data rate negotiation.

use lorawan::maccommandcreator::PingSlotChannelReqCreator;
use lorawan::maccommands::{PingSlotChannelAnsPayload, PingSlotChannelReqPayload};
use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

use super::PING_SLOT_CHANNEL_ANS;
use crate::engine::EngineError;

fn malformed(reason: &'static str) -> EngineError {
    EngineError::MalformedBlock { cid: PING_SLOT_CHANNEL_ANS, reason }
}

pub fn handle_answer(
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.len() != 1 {
        return Err(malformed("expected exactly one PingSlotChannelAns"));
    }
    let pending = pending.ok_or(EngineError::MissingPending(PING_SLOT_CHANNEL_ANS))?;
    if pending.block.commands.len() != 1 {
        return Err(malformed("expected exactly one pending PingSlotChannelReq"));
    }

    let ans = PingSlotChannelAnsPayload::new(&block.commands[0])
        .map_err(|_| malformed("malformed PingSlotChannelAns payload"))?;
    let req = PingSlotChannelReqPayload::new(&pending.block.commands[0])
        .map_err(|_| malformed("malformed pending PingSlotChannelReq payload"))?;

    if ans.channel_frequency_ok() && ans.data_rate_ok() {
        session.mac_command_error_count.remove(&PING_SLOT_CHANNEL_ANS);
        session.ping_slot_frequency = req.frequency().value();
        session.ping_slot_dr = req.dr();
    } else {
        *session.mac_command_error_count.entry(PING_SLOT_CHANNEL_ANS).or_insert(0) += 1;
    }

    Ok(Vec::new())
}

/// Builds the downlink `PingSlotChannelReq` block for the tracker to
/// record as pending.
pub fn request(dr: u8, freq_bytes: &[u8; 3]) -> Result<MACCommandBlock, EngineError> {
    let mut creator = PingSlotChannelReqCreator::new();
    creator.set_frequency(freq_bytes).set_dr(dr).map_err(|_| malformed("dr out of range"))?;
    let bytes = creator.build();
    Ok(MACCommandBlock::new(PING_SLOT_CHANNEL_ANS, vec![bytes[1..].to_vec()]))
}
