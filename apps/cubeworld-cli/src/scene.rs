//! The built-in map every session starts from.

use cubeworld_common::Color3;
use cubeworld_kernel::services::{create_data_model, get_service};
use cubeworld_kernel::{ClassKind, InstanceFactory, InstanceId, InstanceTree};
use glam::Vec3;

pub const DEFAULT_MAP: &str = "Baseplate";
/// Top surface of the baseplate.
pub const FLOOR_HEIGHT: f32 = 0.0;
pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 10.0, 0.0);

pub struct Scene {
    pub game: InstanceId,
    pub workspace: InstanceId,
}

/// Build `Game` with its services, a baseplate and a spawn pad.
pub fn build(tree: &mut InstanceTree, factory: &InstanceFactory) -> Scene {
    let game = create_data_model(tree, factory);
    let workspace = get_service(tree, factory, game, ClassKind::Workspace);
    for service in [
        ClassKind::Lighting,
        ClassKind::Players,
        ClassKind::ReplicatedStorage,
        ClassKind::StarterPack,
    ] {
        get_service(tree, factory, game, service);
    }

    let baseplate = factory.create(tree, ClassKind::Part.class_name());
    tree.set_name(baseplate, "Baseplate");
    if let Some(p) = tree.part_mut(baseplate) {
        p.size = Vec3::new(100.0, 1.0, 100.0);
        p.position = Vec3::new(0.0, FLOOR_HEIGHT - 0.5, 0.0);
        p.color = Color3::GRAY;
        p.anchored = true;
    }
    tree.set_parent(baseplate, Some(workspace));

    let spawn = factory.create(tree, ClassKind::SpawnLocation.class_name());
    if let Some(p) = tree.part_mut(spawn) {
        p.position = Vec3::new(0.0, FLOOR_HEIGHT + 0.5, 0.0);
    }
    tree.set_parent(spawn, Some(workspace));

    Scene { game, workspace }
}
