//! The authoritative per-device runtime record and its storage contract.
//!
//! [`DeviceSession`] is the state the MAC command engine reads and mutates;
//! this crate owns its shape and a typed get/save contract
//! ([`DeviceSessionStore`]) plus an in-memory reference implementation
//! ([`MemoryStore`]) suitable for tests and the debug CLI.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use lorawan::keys::{DevEui, AES128};
use lorawan::parser::DevAddr;
use serde::{Deserialize, Serialize};

/// One or more MAC commands sharing a CID, as raw per-command payload bytes
/// (the CID itself is carried alongside, not repeated per command).
///
/// Stored as owned bytes rather than borrowed `lorawan::maccommands` types
/// because a pending block must outlive the uplink that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MACCommandBlock {
    pub cid: u8,
    pub commands: Vec<Vec<u8>>,
}

impl MACCommandBlock {
    pub fn new(cid: u8, commands: Vec<Vec<u8>>) -> Self {
        MACCommandBlock { cid, commands }
    }
}

/// A MAC command burst sent downward but not yet acknowledged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMacCommand {
    pub cid: u8,
    pub block: MACCommandBlock,
    pub sent_at_frame_counter: u32,
    pub attempts: u32,
}

/// The authoritative runtime record for one active device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSession {
    pub dev_eui: DevEui,
    pub dev_addr: DevAddr<[u8; 4]>,

    pub fcnt_up: u32,
    pub nfcnt_down: u32,
    pub afcnt_down: u32,

    pub nwk_s_enc_key: AES128,
    pub f_nwk_s_int_key: AES128,
    pub s_nwk_s_int_key: AES128,

    pub dr: u8,
    pub tx_power_index: u8,
    pub nb_trans: u8,
    pub enabled_uplink_channels: BTreeSet<usize>,

    pub rx2_frequency: u32,
    pub rx2_dr: u8,
    pub rx1_dr_offset: u8,

    pub ping_slot_frequency: u32,
    pub ping_slot_dr: u8,

    pub adr: bool,
    pub min_supported_tx_power_index: u8,
    pub max_supported_tx_power_index: u8,

    pub mac_command_error_count: HashMap<u8, u32>,
    pub pending_mac_commands: HashMap<u8, PendingMacCommand>,
}

impl DeviceSession {
    /// A freshly activated session with no history: zeroed counters, no
    /// pending commands, default radio parameters left to the caller.
    pub fn new(
        dev_eui: DevEui,
        dev_addr: DevAddr<[u8; 4]>,
        nwk_s_enc_key: AES128,
        f_nwk_s_int_key: AES128,
        s_nwk_s_int_key: AES128,
    ) -> Self {
        DeviceSession {
            dev_eui,
            dev_addr,
            fcnt_up: 0,
            nfcnt_down: 0,
            afcnt_down: 0,
            nwk_s_enc_key,
            f_nwk_s_int_key,
            s_nwk_s_int_key,
            dr: 0,
            tx_power_index: 0,
            nb_trans: 1,
            enabled_uplink_channels: BTreeSet::new(),
            rx2_frequency: 0,
            rx2_dr: 0,
            rx1_dr_offset: 0,
            ping_slot_frequency: 0,
            ping_slot_dr: 0,
            adr: false,
            min_supported_tx_power_index: 0,
            max_supported_tx_power_index: 0,
            mac_command_error_count: HashMap::new(),
            pending_mac_commands: HashMap::new(),
        }
    }

    /// Pretty-printed JSON, keyed by hex-encoded DevEUI, for the debug CLI.
    pub fn to_debug_json(&self) -> serde_json::Result<String> {
        let mut keyed = HashMap::new();
        keyed.insert(hex::encode(self.dev_eui.as_ref()), self);
        serde_json::to_string_pretty(&keyed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no session for dev_eui {0}")]
    NotFound(String),
}

/// Typed get/save contract over a persisted device-identifier-to-session
/// mapping. Implementations must serialize concurrent writes to the same
/// `dev_eui`; the engine itself assumes no durability guarantee beyond a
/// single handling scope.
pub trait DeviceSessionStore {
    fn get(&self, dev_eui: &DevEui) -> Result<DeviceSession, StoreError>;
    fn save(&self, session: DeviceSession) -> Result<(), StoreError>;
}

fn key_bytes(dev_eui: &DevEui) -> [u8; 8] {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(dev_eui.as_ref());
    buf
}

/// Mutex-guarded in-memory reference implementation of
/// [`DeviceSessionStore`]. Not a production persistence layer; intended for
/// the debug CLI and for tests.
#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<[u8; 8], DeviceSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore { sessions: Mutex::new(HashMap::new()) }
    }
}

impl DeviceSessionStore for MemoryStore {
    fn get(&self, dev_eui: &DevEui) -> Result<DeviceSession, StoreError> {
        let sessions = self.sessions.lock().expect("session map lock poisoned");
        sessions
            .get(&key_bytes(dev_eui))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(hex::encode(dev_eui.as_ref())))
    }

    fn save(&self, session: DeviceSession) -> Result<(), StoreError> {
        let mut sessions = self.sessions.lock().expect("session map lock poisoned");
        sessions.insert(key_bytes(&session.dev_eui), session);
        Ok(())
    }
}
