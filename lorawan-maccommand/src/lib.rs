//! MAC command registry, pending-command tracker and engine: the state
//! machine that pairs uplink MAC command answers with the requests a
//! network server sent downward and applies the specification's
//! acknowledgement rules to a [`lorawan_session::DeviceSession`].

pub mod engine;
pub mod registry;
pub mod tracker;

/// Consecutive-nACK ceiling at which a retry policy above this core should
/// stop re-issuing a command. The engine only maintains the counter; no
/// code in this crate branches on this constant.
pub const MAC_COMMAND_ERROR_CEILING_DEFAULT: u32 = 3;
