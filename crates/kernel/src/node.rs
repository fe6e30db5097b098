//! Strongly typed data carried by the specialised node variants.

use crate::class::ClassKind;
use crate::instance::InstanceId;
use cubeworld_common::Color3;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Spatial node fields. Written by game logic and the physics bridge, read by
/// the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PartData {
    pub position: Vec3,
    pub size: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub color: Color3,
    /// Immovable to physics.
    pub anchored: bool,
    pub can_collide: bool,
    /// 0 = opaque, 1 = invisible.
    pub transparency: f32,
}

impl Default for PartData {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            size: Vec3::new(4.0, 1.2, 2.0),
            rotation: Vec3::ZERO,
            color: Color3::GRAY,
            anchored: false,
            can_collide: true,
            transparency: 0.0,
        }
    }
}

impl PartData {
    pub fn spawn_location() -> Self {
        Self {
            size: Vec3::new(6.0, 1.0, 6.0),
            color: Color3::DARK_GRAY,
            anchored: true,
            ..Self::default()
        }
    }
}

/// Animated actor fields. The animation scalars are eased every tick and
/// never snapped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HumanoidData {
    pub health: f32,
    pub max_health: f32,
    pub walk_speed: f32,
    pub jump_power: f32,
    pub walk_cycle: f32,
    pub breathe_cycle: f32,
    pub leg_angle: f32,
    pub arm_angle: f32,
    pub torso_tilt: f32,
    pub torso_roll: f32,
    /// Body yaw in degrees.
    pub yaw: f32,
    pub bob: f32,
}

impl Default for HumanoidData {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            walk_speed: 16.0,
            jump_power: 50.0,
            walk_cycle: 0.0,
            breathe_cycle: 0.0,
            leg_angle: 0.0,
            arm_angle: 0.0,
            torso_tilt: 0.0,
            torso_roll: 0.0,
            yaw: 0.0,
            bob: 0.0,
        }
    }
}

/// Grouping node fields. `primary_part` is a plain handle with no ownership.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelData {
    pub primary_part: Option<InstanceId>,
}

/// Per-variant payload stored alongside the generic instance fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeData {
    Plain,
    Part(PartData),
    Humanoid(HumanoidData),
    Model(ModelData),
}

impl NodeData {
    /// Default payload for a freshly constructed node of `kind`.
    pub fn for_kind(kind: ClassKind) -> Self {
        match kind {
            ClassKind::Part => NodeData::Part(PartData::default()),
            ClassKind::SpawnLocation => NodeData::Part(PartData::spawn_location()),
            ClassKind::Humanoid => NodeData::Humanoid(HumanoidData::default()),
            ClassKind::Model => NodeData::Model(ModelData::default()),
            _ => NodeData::Plain,
        }
    }
}
