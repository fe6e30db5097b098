//! Seam to the external rigid-body simulation.
//!
//! The kernel never steps physics. It registers parts with the bridge and
//! reads or writes per-part motion through these accessors; the bridge
//! implementation owns the bodies.

use crate::instance::{InstanceId, InstanceTree};
use crate::node::PartData;
use glam::Vec3;

pub trait PhysicsBridge {
    /// Start simulating `part` with its current spatial data.
    fn add_part(&mut self, part: InstanceId, data: &PartData);

    fn velocity(&self, part: InstanceId) -> Vec3;

    fn set_velocity(&mut self, part: InstanceId, velocity: Vec3);

    /// Per-axis multiplier on angular motion; zero locks rotation.
    fn set_angular_factor(&mut self, part: InstanceId, factor: Vec3);

    fn set_friction(&mut self, part: InstanceId, friction: f32);
}

/// Register `root` and every `BasePart` below it with the bridge.
/// Returns the number of parts registered.
pub fn register_parts(
    tree: &InstanceTree,
    root: InstanceId,
    physics: &mut dyn PhysicsBridge,
) -> usize {
    let mut count = 0;
    for id in std::iter::once(root).chain(tree.descendants(root)) {
        if let Some(data) = tree.part(id) {
            physics.add_part(id, data);
            count += 1;
        }
    }
    count
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingPhysics;
    use super::*;
    use crate::class::ClassKind;

    #[test]
    fn registers_only_parts_in_subtree() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        let hum = tree.create(ClassKind::Humanoid);
        let a = tree.create(ClassKind::Part);
        let b = tree.create(ClassKind::SpawnLocation);
        let outside = tree.create(ClassKind::Part);
        tree.set_parent(hum, Some(model));
        tree.set_parent(a, Some(model));
        tree.set_parent(b, Some(a));

        let mut physics = RecordingPhysics::default();
        assert_eq!(register_parts(&tree, model, &mut physics), 2);
        assert_eq!(physics.added, vec![a, b]);
        assert!(!physics.added.contains(&outside));
    }
}
