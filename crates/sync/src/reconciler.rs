//! Per-tick smoothing of a remote character toward its latest sample.
//!
//! Position uses exponential smoothing: each step closes a constant fraction
//! of the remaining gap, so error shrinks geometrically and never overshoots
//! for a blend in (0, 1]. Yaw turns the same fraction of the shortest signed
//! difference.

use crate::config::SyncConfig;
use cubeworld_common::math::{shortest_turn, wrap_degrees};
use cubeworld_kernel::character::{find_humanoid, pose_remote};
use cubeworld_kernel::{InstanceId, InstanceTree};
use glam::Vec3;

/// Latest authoritative sample for one remote peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteTarget {
    pub position: Vec3,
    pub yaw: f32,
}

pub fn step_position(current: Vec3, target: Vec3, blend: f32) -> Vec3 {
    current + (target - current) * blend
}

/// Turn from `current` toward `target` by `blend` of the shortest turn.
/// The result stays in (-180, 180].
pub fn step_yaw(current: f32, target: f32, blend: f32) -> f32 {
    wrap_degrees(current + shortest_turn(current, target) * blend)
}

/// Move `character` one tick toward `target` and re-pose it.
///
/// Returns `false` when the character is gone or lacks a root part or
/// humanoid; nothing is touched in that case.
pub fn reconcile(
    tree: &mut InstanceTree,
    character: InstanceId,
    target: &RemoteTarget,
    config: &SyncConfig,
    dt: f32,
) -> bool {
    let Some(root) = tree.primary_part(character) else {
        return false;
    };
    let (Some(current), Some(humanoid)) = (
        tree.part(root).map(|p| p.position),
        find_humanoid(tree, character),
    ) else {
        return false;
    };

    let next = step_position(current, target.position, config.position_blend);
    if let Some(h) = tree.humanoid_mut(humanoid) {
        h.yaw = step_yaw(h.yaw, target.yaw, config.yaw_blend);
    }
    pose_remote(tree, character, next, config.remote_gait_speed, dt);
    true
}
