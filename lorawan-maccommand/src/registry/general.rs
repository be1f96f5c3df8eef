//! The general handler contract (§4.3.4): governs every registered CID
//! that doesn't need a bespoke decision table. Enforces the at-least-one
//! count rule, validates payload shape, and applies the uniform
//! ack/nack-counter discipline.

use lorawan::maccommands::{
    DevStatusAnsPayload, DeviceTimeReqPayload, DlChannelAnsPayload, DutyCycleAnsPayload, LinkCheckReqPayload,
    NewChannelAnsPayload, RXTimingSetupAnsPayload, TXParamSetupAnsPayload,
};
use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

use super::{DEV_STATUS_ANS, DL_CHANNEL_ANS, DUTY_CYCLE_ANS, NEW_CHANNEL_ANS, RX_TIMING_SETUP_ANS, TX_PARAM_SETUP_ANS};
use crate::engine::EngineError;

fn malformed(cid: u8, reason: &'static str) -> EngineError {
    EngineError::MalformedBlock { cid, reason }
}

fn count_ack(cid: u8, raw: &[u8]) -> Result<bool, EngineError> {
    match cid {
        NEW_CHANNEL_ANS => {
            Ok(NewChannelAnsPayload::new(raw).map_err(|_| malformed(cid, "malformed NewChannelAns payload"))?.ack())
        }
        DL_CHANNEL_ANS => {
            Ok(DlChannelAnsPayload::new(raw).map_err(|_| malformed(cid, "malformed DlChannelAns payload"))?.ack())
        }
        _ => unreachable!("count_ack called for a cid outside GENERAL_ACK_CIDS"),
    }
}

/// Handles a CID whose answer carries at least one independent ack bit
/// (`NewChannelAns`, `DlChannelAns`): every command in the block must ack
/// for the burst to count as a positive acknowledgement.
pub fn handle_ack_answer(
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
    cid: u8,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.is_empty() {
        return Err(malformed(cid, "at least one mac command expected, got none"));
    }
    if pending.is_none() {
        return Err(EngineError::MissingPending(cid));
    }

    let mut all_acked = true;
    for raw in &block.commands {
        if !count_ack(cid, raw)? {
            all_acked = false;
        }
    }

    if all_acked {
        session.mac_command_error_count.remove(&cid);
    } else {
        *session.mac_command_error_count.entry(cid).or_insert(0) += 1;
    }
    Ok(Vec::new())
}

fn validate_no_ack_shape(cid: u8, raw: &[u8]) -> Result<(), EngineError> {
    match cid {
        DUTY_CYCLE_ANS => {
            DutyCycleAnsPayload::new(raw);
            Ok(())
        }
        RX_TIMING_SETUP_ANS => {
            RXTimingSetupAnsPayload::new(raw);
            Ok(())
        }
        TX_PARAM_SETUP_ANS => {
            TXParamSetupAnsPayload::new(raw);
            Ok(())
        }
        DEV_STATUS_ANS => {
            DevStatusAnsPayload::new(raw).map_err(|_| malformed(cid, "malformed DevStatusAns payload"))?;
            Ok(())
        }
        _ => unreachable!("validate_no_ack_shape called for a cid outside GENERAL_NO_ACK_CIDS"),
    }
}

/// Handles a CID whose answer carries no ack bit at all. Once the count
/// and shape checks pass there is nothing to nack, so this is always a
/// positive acknowledgement.
pub fn handle_no_ack_answer(
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
    cid: u8,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.is_empty() {
        return Err(malformed(cid, "at least one mac command expected, got none"));
    }
    if pending.is_none() {
        return Err(EngineError::MissingPending(cid));
    }
    for raw in &block.commands {
        validate_no_ack_shape(cid, raw)?;
    }
    session.mac_command_error_count.remove(&cid);
    Ok(Vec::new())
}

/// Handles a request-only CID a device sends upward (`LinkCheckReq`,
/// `DeviceTimeReq`): no pending slot to pair against, just count/shape
/// validation. Deciding whether and how to answer is out of scope here.
pub fn handle_request_only(block: &MACCommandBlock, cid: u8) -> Result<Vec<MACCommandBlock>, EngineError> {
    if block.commands.is_empty() {
        return Err(malformed(cid, "at least one mac command expected, got none"));
    }
    for raw in &block.commands {
        match cid {
            super::LINK_CHECK_REQ => {
                LinkCheckReqPayload::new(raw);
            }
            super::DEVICE_TIME_REQ => {
                DeviceTimeReqPayload::new(raw);
            }
            _ => unreachable!("handle_request_only called for a cid outside GENERAL_REQUEST_ONLY_CIDS"),
        }
    }
    Ok(Vec::new())
}
