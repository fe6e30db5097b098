use serde::{Deserialize, Serialize};
use std::fmt;

/// Transport-assigned identifier for a remote participant.
///
/// Ids are stable for the lifetime of one connection. The server hands out
/// ids starting at 1; id 0 is reserved for the server's own avatar as seen
/// from a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub u32);

impl PeerId {
    /// The hosting server, when observed from a client session.
    pub const HOST: PeerId = PeerId(0);

    pub fn is_host(self) -> bool {
        self == Self::HOST
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "host")
        } else {
            write!(f, "peer#{}", self.0)
        }
    }
}

/// Linear RGB color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color3 {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color3 {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub const GRAY: Color3 = Color3::new(0.64, 0.64, 0.64);
    pub const DARK_GRAY: Color3 = Color3::new(0.43, 0.43, 0.43);
    pub const WHITE: Color3 = Color3::new(1.0, 1.0, 1.0);
    pub const BLACK: Color3 = Color3::new(0.1, 0.1, 0.1);
    pub const RED: Color3 = Color3::new(0.77, 0.16, 0.16);
    pub const GREEN: Color3 = Color3::new(0.16, 0.77, 0.16);
    pub const BLUE: Color3 = Color3::new(0.16, 0.16, 0.77);
    pub const YELLOW: Color3 = Color3::new(0.96, 0.8, 0.19);
    pub const BROWN: Color3 = Color3::new(0.49, 0.36, 0.27);
    pub const BRIGHT_GREEN: Color3 = Color3::new(0.29, 0.59, 0.29);
}

impl Default for Color3 {
    fn default() -> Self {
        Self::GRAY
    }
}
