//! Instance kernel: the scene graph shared by client and server.
//!
//! # Invariants
//! - Every node has at most one owning parent; the relation is acyclic.
//! - Destroy cascades to all descendants before unlinking from the parent.
//! - Lifecycle misuse (stale handles, cyclic re-parenting) is a silent no-op.

pub mod character;
pub mod class;
pub mod factory;
pub mod instance;
pub mod node;
pub mod physics;
pub mod property;
pub mod services;

pub use class::{Capability, ClassKind};
pub use factory::InstanceFactory;
pub use instance::{Instance, InstanceId, InstanceTree, ROOT_PART_NAME, TreeEvent};
pub use node::{HumanoidData, ModelData, NodeData, PartData};
pub use physics::PhysicsBridge;
pub use property::{PropertyBag, PropertyType, PropertyValue};

pub fn crate_info() -> &'static str {
    "cubeworld-kernel v0.1.0"
}
