//! The `DataModel` root and its singleton services.

use crate::class::ClassKind;
use crate::factory::InstanceFactory;
use crate::instance::{InstanceId, InstanceTree};

/// Create the game root (`DataModel`, named `Game`).
pub fn create_data_model(tree: &mut InstanceTree, factory: &InstanceFactory) -> InstanceId {
    factory.create(tree, ClassKind::DataModel.class_name())
}

/// Return the first child of `game` of the service's class, creating and
/// parenting it when absent.
pub fn get_service(
    tree: &mut InstanceTree,
    factory: &InstanceFactory,
    game: InstanceId,
    service: ClassKind,
) -> InstanceId {
    let class_name = service.class_name();
    if let Some(existing) = tree.find_first_child_of_class(game, class_name) {
        return existing;
    }
    let created = factory.create(tree, class_name);
    tree.set_parent(created, Some(game));
    tracing::debug!(service = class_name, "created service");
    created
}
