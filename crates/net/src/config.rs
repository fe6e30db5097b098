use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Transport and session tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Maximum concurrent peers a server accepts.
    pub max_peers: u32,
    /// Send a keep-alive when nothing else was sent for this long.
    pub ping_interval_ms: u64,
    /// Drop a peer that has been silent for this long.
    pub peer_timeout_ms: u64,
    /// Give up on an outbound connection attempt after this long.
    pub connect_timeout_ms: u64,
    /// Resend interval for unacknowledged reliable messages and connect requests.
    pub resend_interval_ms: u64,
    /// Drop a connection after this many resends of one reliable message.
    pub max_resends: u32,
    /// Capacity of the decoded event queue drained by the simulation loop.
    pub event_capacity: usize,
    /// Upper bound on datagrams read in one poll.
    pub max_datagrams_per_poll: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            max_peers: 32,
            ping_interval_ms: 500,
            peer_timeout_ms: 5_000,
            connect_timeout_ms: 5_000,
            resend_interval_ms: 200,
            max_resends: 25,
            event_capacity: 1024,
            max_datagrams_per_poll: 4096,
        }
    }
}

impl NetConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn resend_interval(&self) -> Duration {
        Duration::from_millis(self.resend_interval_ms)
    }
}
