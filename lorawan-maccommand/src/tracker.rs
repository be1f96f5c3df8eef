//! Per-session, per-CID single-slot pending command buffer.

use lorawan_session::{DeviceSession, MACCommandBlock, PendingMacCommand};

/// Default pending-command sweep window, in uplinks. Overridable via
/// `network_settings.pending_command_sweep_uplinks`.
pub const DEFAULT_SWEEP_UPLINKS: u32 = 8;

/// Records a newly emitted request, replacing any existing slot for this
/// CID. The prior request is silently abandoned: abandonment is not a
/// negative acknowledgement, so the error counter is left untouched.
pub fn set(session: &mut DeviceSession, cid: u8, block: MACCommandBlock, frame_counter: u32) {
    session
        .pending_mac_commands
        .insert(cid, PendingMacCommand { cid, block, sent_at_frame_counter: frame_counter, attempts: 1 });
}

/// Removes and returns the pending slot for `cid`, if one is recorded.
pub fn take(session: &mut DeviceSession, cid: u8) -> Option<PendingMacCommand> {
    session.pending_mac_commands.remove(&cid)
}

/// Discards every pending slot older than `sweep_uplinks` relative to
/// `current_frame_counter`, returning the CIDs that were swept as lost.
///
/// Must run before any block in the uplink is paired, so a slot that just
/// expired cannot be matched against this uplink's answer.
pub fn sweep(session: &mut DeviceSession, current_frame_counter: u32, sweep_uplinks: u32) -> Vec<u8> {
    let mut lost = Vec::new();
    session.pending_mac_commands.retain(|cid, pending| {
        let age = current_frame_counter.saturating_sub(pending.sent_at_frame_counter);
        if age >= sweep_uplinks {
            lost.push(*cid);
            false
        } else {
            true
        }
    });
    lost
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorawan::keys::AES128;
    use lorawan::parser::DevAddr;
    use lorawan_session::MACCommandBlock;

    fn session() -> DeviceSession {
        DeviceSession::new(
            lorawan::keys::DevEui::from([1, 2, 3, 4, 5, 6, 7, 8]),
            DevAddr::from(1u32),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
        )
    }

    #[test]
    fn set_then_take_round_trips() {
        let mut s = session();
        set(&mut s, 0x03, MACCommandBlock::new(0x03, vec![vec![0x53, 0xc7, 0x0b, 0x37]]), 10);
        let pending = take(&mut s, 0x03).unwrap();
        assert_eq!(pending.sent_at_frame_counter, 10);
        assert!(take(&mut s, 0x03).is_none());
    }

    #[test]
    fn replacing_a_pending_slot_does_not_touch_error_counter() {
        let mut s = session();
        set(&mut s, 0x03, MACCommandBlock::new(0x03, vec![vec![1]]), 10);
        set(&mut s, 0x03, MACCommandBlock::new(0x03, vec![vec![2]]), 12);
        assert_eq!(s.mac_command_error_count.get(&0x03), None);
        let pending = take(&mut s, 0x03).unwrap();
        assert_eq!(pending.sent_at_frame_counter, 12);
    }

    #[test]
    fn sweep_discards_slots_at_the_default_window() {
        let mut s = session();
        set(&mut s, 0x05, MACCommandBlock::new(0x05, vec![vec![0xcd, 0x12, 0x34, 0x56]]), 100);

        let lost = sweep(&mut s, 107, DEFAULT_SWEEP_UPLINKS);
        assert!(lost.is_empty());
        assert!(s.pending_mac_commands.contains_key(&0x05));

        let lost = sweep(&mut s, 108, DEFAULT_SWEEP_UPLINKS);
        assert_eq!(lost, vec![0x05]);
        assert!(!s.pending_mac_commands.contains_key(&0x05));
    }
}
