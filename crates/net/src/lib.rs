//! Replication networking for cubeworld.
//!
//! Layers, bottom up:
//! - [`frame`]: transport datagram header.
//! - [`transport`]: connections, reliability, keep-alive over one UDP socket.
//! - [`protocol`]: application packets (positions, peer-left, map metadata).
//! - [`session`]: the state machine the simulation loop drives each tick.

pub mod config;
pub mod error;
pub mod frame;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::NetConfig;
pub use error::{NetError, ProtocolError};
pub use frame::Channel;
pub use protocol::Packet;
pub use session::{ReplicationSession, SessionEvent, SessionState};
pub use transport::{DisconnectReason, Host, Role, TransportEvent};

pub fn crate_info() -> &'static str {
    "cubeworld-net v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("net"));
    }
}
