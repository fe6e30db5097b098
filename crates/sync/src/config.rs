use serde::{Deserialize, Serialize};

/// Reconciler tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Fraction of the remaining position error closed each tick, in (0, 1].
    pub position_blend: f32,
    /// Fraction of the remaining (shortest) yaw error closed each tick.
    pub yaw_blend: f32,
    /// Assumed horizontal speed driving remote walk animation.
    pub remote_gait_speed: f32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            position_blend: 0.2,
            yaw_blend: 0.2,
            remote_gait_speed: 16.0,
        }
    }
}
