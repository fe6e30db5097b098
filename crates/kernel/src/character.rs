//! Character rigs: construction, the local controller, and remote posing.
//!
//! A character is a `Model` holding a `Humanoid`, an invisible collidable
//! `HumanoidRootPart` (the primary part) and six non-colliding visual parts
//! laid out around the root every tick.

use crate::class::ClassKind;
use crate::factory::InstanceFactory;
use crate::instance::{InstanceId, InstanceTree, ROOT_PART_NAME};
use crate::node::HumanoidData;
use crate::physics::PhysicsBridge;
use cubeworld_common::Color3;
use cubeworld_common::math::{lerp, rotate_yaw, shortest_turn, wrap_degrees};
use glam::Vec3;
use std::f32::consts::TAU;

const ROOT_SIZE: Vec3 = Vec3::new(4.0, 10.0, 4.0);
const ROOT_LIFT: Vec3 = Vec3::new(0.0, 5.0, 0.0);
const TORSO_OFFSET: Vec3 = Vec3::new(0.0, 1.0, 0.0);
const HEAD_OFFSET: Vec3 = Vec3::new(0.0, 4.0, 0.0);
const LEFT_HIP: Vec3 = Vec3::new(-1.0, -1.2, 0.0);
const RIGHT_HIP: Vec3 = Vec3::new(1.0, -1.2, 0.0);
const LEFT_SHOULDER: Vec3 = Vec3::new(-3.0, 2.5, 0.0);
const RIGHT_SHOULDER: Vec3 = Vec3::new(3.0, 2.5, 0.0);
/// Limbs are 4 long and pivot at one end.
const LIMB_HALF_LENGTH: f32 = 2.0;

/// Walk-cycle radians per unit of horizontal speed per second.
pub const WALK_ANIM_RATE: f32 = 0.55;
pub const BREATHE_RATE: f32 = 0.8;
/// Peak leg/arm swing in degrees.
pub const WALK_SWING: f32 = 32.0;
const REMOTE_POSE_BLEND: f32 = 0.2;
const REMOTE_BOB: f32 = 0.2;
const LOCAL_TURN_BLEND: f32 = 0.12;

/// Build a character rig named `name` standing at `position`. The rig is
/// returned detached; the caller parents it into the world.
pub fn build_character(
    tree: &mut InstanceTree,
    factory: &InstanceFactory,
    name: &str,
    position: Vec3,
) -> InstanceId {
    let model = factory.create(tree, ClassKind::Model.class_name());
    tree.set_name(model, name);

    let humanoid = factory.create(tree, ClassKind::Humanoid.class_name());
    tree.set_parent(humanoid, Some(model));

    let root_position = position + ROOT_LIFT;
    let root = factory.create(tree, ClassKind::Part.class_name());
    tree.set_name(root, ROOT_PART_NAME);
    if let Some(p) = tree.part_mut(root) {
        p.size = ROOT_SIZE;
        p.position = root_position;
        p.color = Color3::RED;
        p.transparency = 1.0;
        p.anchored = false;
        p.can_collide = true;
    }
    tree.set_parent(root, Some(model));

    let visuals = [
        ("Torso", Vec3::new(4.0, 4.0, 2.0), Color3::YELLOW),
        ("Head", Vec3::new(2.0, 2.0, 2.0), Color3::YELLOW),
        ("LeftLeg", Vec3::new(2.0, 4.0, 2.0), Color3::GREEN),
        ("RightLeg", Vec3::new(2.0, 4.0, 2.0), Color3::GREEN),
        ("LeftArm", Vec3::new(2.0, 4.0, 2.0), Color3::YELLOW),
        ("RightArm", Vec3::new(2.0, 4.0, 2.0), Color3::YELLOW),
    ];
    for (part_name, size, color) in visuals {
        let part = factory.create(tree, ClassKind::Part.class_name());
        tree.set_name(part, part_name);
        if let Some(p) = tree.part_mut(part) {
            p.size = size;
            p.position = root_position;
            p.color = color;
            p.anchored = false;
            p.can_collide = false;
        }
        tree.set_parent(part, Some(model));
    }

    tree.set_primary_part(model, Some(root));
    tracing::debug!(name, ?position, "built character");
    model
}

/// The character's humanoid, if it has one.
pub fn find_humanoid(tree: &InstanceTree, character: InstanceId) -> Option<InstanceId> {
    tree.find_first_child_of_class(character, ClassKind::Humanoid.class_name())
}

/// Advance the animation of an externally driven character and lay it out at
/// `root_position`.
///
/// Every part is forced anchored and non-colliding so local physics cannot
/// fight the replicated position. Remote velocity is unknown, so the gait
/// runs at the fixed `gait_speed`.
pub fn pose_remote(
    tree: &mut InstanceTree,
    character: InstanceId,
    root_position: Vec3,
    gait_speed: f32,
    dt: f32,
) {
    let Some(humanoid) = find_humanoid(tree, character) else {
        return;
    };

    for child in tree.children(character).to_vec() {
        if let Some(p) = tree.part_mut(child) {
            p.anchored = true;
            p.can_collide = false;
        }
    }

    let Some(h) = tree.humanoid_mut(humanoid) else {
        return;
    };
    h.walk_cycle = (h.walk_cycle + gait_speed * dt * WALK_ANIM_RATE) % TAU;
    h.breathe_cycle = (h.breathe_cycle + dt * BREATHE_RATE) % TAU;
    let swing = h.walk_cycle.sin() * WALK_SWING;
    h.leg_angle = lerp(h.leg_angle, swing, REMOTE_POSE_BLEND);
    h.arm_angle = lerp(h.arm_angle, swing, REMOTE_POSE_BLEND);
    h.bob = lerp(h.bob, h.walk_cycle.sin() * REMOTE_BOB, REMOTE_POSE_BLEND);
    let pose = *h;

    layout_visuals(tree, character, root_position, &pose);
    if let Some(root) = tree.primary_part(character) {
        if let Some(p) = tree.part_mut(root) {
            p.position = root_position;
        }
    }
}

/// Drive the locally controlled character for one tick.
///
/// Sets the root body's velocity through the physics bridge from the
/// normalized `move_dir`, turns the body toward the movement direction, and
/// eases the pose toward the walk, idle or airborne targets.
pub fn drive_local(
    tree: &mut InstanceTree,
    character: InstanceId,
    move_dir: Vec3,
    jump: bool,
    physics: &mut dyn PhysicsBridge,
    dt: f32,
) {
    let (Some(root), Some(humanoid)) =
        (tree.primary_part(character), find_humanoid(tree, character))
    else {
        return;
    };
    let Some(stats) = tree.humanoid(humanoid).copied() else {
        return;
    };

    physics.set_angular_factor(root, Vec3::ZERO);
    physics.set_friction(root, 0.0);

    let current = physics.velocity(root);
    let moving_input = move_dir.length() >= 0.01;
    let mut next = if moving_input {
        let target = move_dir * stats.walk_speed;
        Vec3::new(target.x, current.y, target.z)
    } else {
        let mut damped = Vec3::new(current.x * 0.9, current.y, current.z * 0.9);
        if damped.x.abs() < 0.1 {
            damped.x = 0.0;
        }
        if damped.z.abs() < 0.1 {
            damped.z = 0.0;
        }
        damped
    };
    if jump && current.y.abs() < 0.5 {
        next.y = stats.jump_power;
    }
    physics.set_velocity(root, next);

    let horizontal_speed = Vec3::new(current.x, 0.0, current.z).length();
    let is_moving = horizontal_speed > 1.0;
    let airborne = current.y.abs() > 1.0;

    let Some(h) = tree.humanoid_mut(humanoid) else {
        return;
    };
    if move_dir.length() > 0.1 {
        let target_yaw = move_dir.x.atan2(move_dir.z).to_degrees();
        h.yaw = wrap_degrees(h.yaw + shortest_turn(h.yaw, target_yaw) * LOCAL_TURN_BLEND);
    }

    h.walk_cycle = (h.walk_cycle + horizontal_speed * dt * WALK_ANIM_RATE) % TAU;
    h.breathe_cycle = (h.breathe_cycle + dt * BREATHE_RATE) % TAU;

    let (leg, arm, tilt, roll, bob) = if airborne {
        (-10.0, 170.0, -5.0, 0.0, 0.0)
    } else if is_moving {
        let s = h.walk_cycle.sin();
        (
            s * WALK_SWING,
            s * WALK_SWING,
            horizontal_speed / h.walk_speed.max(f32::EPSILON) * 8.0,
            s * 4.0,
            s.abs() * 0.25,
        )
    } else {
        (
            0.0,
            h.breathe_cycle.sin() * 3.5,
            0.0,
            (h.breathe_cycle * 0.5).sin() * 1.5,
            h.breathe_cycle.sin() * 0.05,
        )
    };

    h.leg_angle = lerp(h.leg_angle, leg, 0.15);
    h.arm_angle = lerp(h.arm_angle, arm, 0.15);
    h.torso_tilt = lerp(h.torso_tilt, tilt, 0.1);
    h.torso_roll = lerp(h.torso_roll, roll, 0.1);
    h.bob = lerp(h.bob, bob, 0.2);
    let pose = *h;

    if let Some(root_position) = tree.part(root).map(|p| p.position) {
        layout_visuals(tree, character, root_position, &pose);
    }
}

fn layout_visuals(tree: &mut InstanceTree, character: InstanceId, root: Vec3, pose: &HumanoidData) {
    let bob = Vec3::new(0.0, pose.bob, 0.0);
    let level = Vec3::new(0.0, pose.yaw, 0.0);

    place(
        tree,
        character,
        "Torso",
        root + TORSO_OFFSET + bob,
        Vec3::new(pose.torso_tilt, pose.yaw, pose.torso_roll),
    );
    place(tree, character, "Head", root + HEAD_OFFSET + bob, level);

    let limbs = [
        ("LeftLeg", LEFT_HIP, pose.leg_angle),
        ("RightLeg", RIGHT_HIP, -pose.leg_angle),
        ("LeftArm", LEFT_SHOULDER, -pose.arm_angle),
        ("RightArm", RIGHT_SHOULDER, pose.arm_angle),
    ];
    for (name, pivot, angle) in limbs {
        let (sin, cos) = angle.to_radians().sin_cos();
        let center = Vec3::new(0.0, -LIMB_HALF_LENGTH * cos, -LIMB_HALF_LENGTH * sin);
        let offset = rotate_yaw(pivot + center + bob, pose.yaw);
        place(tree, character, name, root + offset, Vec3::new(angle, pose.yaw, 0.0));
    }
}

fn place(
    tree: &mut InstanceTree,
    character: InstanceId,
    name: &str,
    position: Vec3,
    rotation: Vec3,
) {
    if let Some(id) = tree.find_first_child(character, name) {
        if let Some(p) = tree.part_mut(id) {
            p.position = position;
            p.rotation = rotation;
        }
    }
}
