//! Shared value types used by the instance tree, the replication layer and the
//! reconciler.

pub mod math;
pub mod types;

pub use glam::Vec3;
pub use types::{Color3, PeerId};
