//! Kinematic stand-in for the rigid-body engine used by the headless runner:
//! gravity, velocity integration and a flat floor, nothing else.

use cubeworld_kernel::{InstanceId, InstanceTree, PartData, PhysicsBridge};
use glam::Vec3;
use std::collections::HashMap;

const GRAVITY: Vec3 = Vec3::new(0.0, -196.2, 0.0);

#[derive(Debug, Clone, Copy)]
struct Body {
    velocity: Vec3,
    angular_factor: Vec3,
    friction: f32,
}

pub struct KinematicPhysics {
    bodies: HashMap<InstanceId, Body>,
    floor: f32,
}

impl KinematicPhysics {
    /// Bodies rest on the plane `y = floor`.
    pub fn new(floor: f32) -> Self {
        Self {
            bodies: HashMap::new(),
            floor,
        }
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Rotation is not simulated; the factor is only recorded.
    pub fn angular_factor(&self, part: InstanceId) -> Option<Vec3> {
        self.bodies.get(&part).map(|b| b.angular_factor)
    }

    /// Advance every unanchored, collidable body by `dt`. Destroyed parts are
    /// forgotten.
    pub fn step(&mut self, tree: &mut InstanceTree, dt: f32) {
        let floor = self.floor;
        self.bodies.retain(|id, body| {
            let Some(part) = tree.part_mut(*id) else {
                return false;
            };
            if part.anchored || !part.can_collide {
                return true;
            }
            body.velocity += GRAVITY * dt;
            part.position += body.velocity * dt;
            let half_height = part.size.y * 0.5;
            if part.position.y - half_height <= floor {
                part.position.y = floor + half_height;
                body.velocity.y = 0.0;
                let grip = (1.0 - body.friction * dt).clamp(0.0, 1.0);
                body.velocity.x *= grip;
                body.velocity.z *= grip;
            }
            true
        });
    }
}

impl PhysicsBridge for KinematicPhysics {
    fn add_part(&mut self, part: InstanceId, _data: &PartData) {
        self.bodies.entry(part).or_insert(Body {
            velocity: Vec3::ZERO,
            angular_factor: Vec3::ONE,
            friction: 0.3,
        });
    }

    fn velocity(&self, part: InstanceId) -> Vec3 {
        self.bodies.get(&part).map_or(Vec3::ZERO, |b| b.velocity)
    }

    fn set_velocity(&mut self, part: InstanceId, velocity: Vec3) {
        if let Some(body) = self.bodies.get_mut(&part) {
            body.velocity = velocity;
        }
    }

    fn set_angular_factor(&mut self, part: InstanceId, factor: Vec3) {
        if let Some(body) = self.bodies.get_mut(&part) {
            body.angular_factor = factor;
        }
    }

    fn set_friction(&mut self, part: InstanceId, friction: f32) {
        if let Some(body) = self.bodies.get_mut(&part) {
            body.friction = friction;
        }
    }
}
