pub mod band_setup;
pub mod error;
pub mod logging;
pub mod settings;

use anyhow::{Context, Result};
use lorawan::keys::DevEui;
use lorawan_session::DeviceSessionStore;

pub fn parse_dev_eui(hex_str: &str) -> Result<DevEui> {
    let bytes = hex::decode(hex_str).with_context(|| format!("'{hex_str}' is not valid hex"))?;
    let array: [u8; 8] =
        bytes.try_into().map_err(|_| anyhow::anyhow!("dev_eui must be exactly 8 bytes (16 hex characters)"))?;
    Ok(DevEui::from(array))
}

/// Looks up `dev_eui` in `store` and renders it as pretty JSON, keyed by hex
/// DevEUI. Used by the `print-ds` CLI command.
pub fn render_device_session(store: &dyn DeviceSessionStore, dev_eui: &DevEui) -> Result<String> {
    let session = store.get(dev_eui).context("fetching device session")?;
    session.to_debug_json().context("encoding device session as JSON")
}

#[cfg(test)]
mod tests {
    use lorawan::keys::AES128;
    use lorawan::parser::DevAddr;
    use lorawan_session::{DeviceSession, MemoryStore};

    use super::*;

    #[test]
    fn parse_dev_eui_rejects_wrong_length() {
        assert!(parse_dev_eui("aabb").is_err());
    }

    #[test]
    fn parse_dev_eui_round_trips_valid_hex() {
        let dev_eui = parse_dev_eui("0102030405060708").unwrap();
        assert_eq!(dev_eui.as_ref(), &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn render_device_session_errors_when_not_found() {
        let store = MemoryStore::new();
        let dev_eui = parse_dev_eui("0102030405060708").unwrap();
        assert!(render_device_session(&store, &dev_eui).is_err());
    }

    #[test]
    fn render_device_session_returns_json_keyed_by_hex_dev_eui() {
        let store = MemoryStore::new();
        let dev_eui = DevEui::from([1, 2, 3, 4, 5, 6, 7, 8]);
        let session = DeviceSession::new(
            dev_eui,
            DevAddr::from(0x0102_0304u32),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
            AES128::from([0; 16]),
        );
        store.save(session).unwrap();

        let json = render_device_session(&store, &dev_eui).unwrap();
        assert!(json.contains("0102030405060708"));
        assert!(json.contains("fcnt_up"));
    }
}
