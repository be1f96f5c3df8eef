//! Static dispatch table keyed by `(CID, direction)`.
//!
//! Decoding is delegated to `lorawan`'s macro-generated payload structs;
//! this module's job is pairing a CID with the right constructor and the
//! right handler, and enforcing the per-command count and error-counter
//! rules uniformly across the ten commands that don't need a bespoke
//! decision table.

mod general;
mod link_adr;
mod ping_slot_channel;
mod rx_param_setup;

use lorawan_band::Band;
use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

use crate::engine::EngineError;

pub const LINK_CHECK_REQ: u8 = 0x02;
pub const LINK_ADR_ANS: u8 = 0x03;
pub const DUTY_CYCLE_ANS: u8 = 0x04;
pub const RX_PARAM_SETUP_ANS: u8 = 0x05;
pub const DEV_STATUS_ANS: u8 = 0x06;
pub const NEW_CHANNEL_ANS: u8 = 0x07;
pub const RX_TIMING_SETUP_ANS: u8 = 0x08;
pub const TX_PARAM_SETUP_ANS: u8 = 0x09;
pub const DL_CHANNEL_ANS: u8 = 0x0A;
pub const DEVICE_TIME_REQ: u8 = 0x0D;
pub const PING_SLOT_CHANNEL_ANS: u8 = 0x11;

/// Commands that carry at least one independent status bit and therefore
/// follow the general ack/nack discipline (§4.3.4).
const GENERAL_ACK_CIDS: &[u8] = &[NEW_CHANNEL_ANS, DL_CHANNEL_ANS];

/// Commands with no ack bit at all: count/shape-checked, then treated as an
/// unconditional positive acknowledgement.
const GENERAL_NO_ACK_CIDS: &[u8] = &[DUTY_CYCLE_ANS, DEV_STATUS_ANS, RX_TIMING_SETUP_ANS, TX_PARAM_SETUP_ANS];

/// Request-only commands a device sends upward with no pending slot to
/// pair against.
const GENERAL_REQUEST_ONLY_CIDS: &[u8] = &[LINK_CHECK_REQ, DEVICE_TIME_REQ];

/// All CIDs this registry recognizes, across every handling category.
const ALL_REGISTERED_CIDS: &[u8] = &[
    LINK_CHECK_REQ,
    LINK_ADR_ANS,
    DUTY_CYCLE_ANS,
    RX_PARAM_SETUP_ANS,
    DEV_STATUS_ANS,
    NEW_CHANNEL_ANS,
    RX_TIMING_SETUP_ANS,
    TX_PARAM_SETUP_ANS,
    DL_CHANNEL_ANS,
    DEVICE_TIME_REQ,
    PING_SLOT_CHANNEL_ANS,
];

/// Validates, once at setup, that the static table is internally
/// consistent: every CID this module claims to handle actually resolves
/// through [`handle_uplink_block`]'s dispatch. A registry construction
/// site (e.g. the network server binary) should call this during startup.
pub fn debug_assert_registry_complete() {
    debug_assert!(ALL_REGISTERED_CIDS.iter().all(|&cid| is_registered(cid)), "registry table is inconsistent");
}

pub fn is_registered(cid: u8) -> bool {
    ALL_REGISTERED_CIDS.contains(&cid)
}

/// Dispatches one decoded MAC command block to its handler.
pub fn handle_uplink_block(
    band: &Band,
    session: &mut DeviceSession,
    block: &MACCommandBlock,
    pending: Option<&PendingMacCommand>,
) -> Result<Vec<MACCommandBlock>, EngineError> {
    match block.cid {
        LINK_ADR_ANS => link_adr::handle_answer(band, session, block, pending),
        PING_SLOT_CHANNEL_ANS => ping_slot_channel::handle_answer(session, block, pending),
        RX_PARAM_SETUP_ANS => rx_param_setup::handle_answer(session, block, pending),
        cid if GENERAL_ACK_CIDS.contains(&cid) => general::handle_ack_answer(session, block, pending, cid),
        cid if GENERAL_NO_ACK_CIDS.contains(&cid) => general::handle_no_ack_answer(session, block, pending, cid),
        cid if GENERAL_REQUEST_ONLY_CIDS.contains(&cid) => general::handle_request_only(block, cid),
        cid => Err(EngineError::UnknownCid(cid)),
    }
}

/// Builds a `PingSlotChannelReq` downlink block for the tracker to record
/// as pending.
pub fn request_ping_slot_channel(dr: u8, freq_bytes: &[u8; 3]) -> Result<MACCommandBlock, EngineError> {
    ping_slot_channel::request(dr, freq_bytes)
}

/// Builds an `RXParamSetupReq` downlink block for the tracker to record as
/// pending.
pub fn request_rx_param_setup(
    rx1_dr_offset: u8,
    rx2_dr: u8,
    rx2_freq_bytes: &[u8; 3],
) -> Result<MACCommandBlock, EngineError> {
    rx_param_setup::request(rx1_dr_offset, rx2_dr, rx2_freq_bytes)
}
