//! Remote entity reconciliation.
//!
//! Session events carry sparse position/yaw samples for remote peers; the
//! [`RemoteRoster`] keeps one character per peer in the instance tree and
//! smooths it toward the latest sample every tick.

pub mod config;
pub mod reconciler;
pub mod roster;

pub use config::SyncConfig;
pub use reconciler::{RemoteTarget, reconcile, step_position, step_yaw};
pub use roster::{RemotePeer, RemoteRoster, RosterChange, remote_name};

pub fn crate_info() -> &'static str {
    "cubeworld-sync v0.1.0"
}
