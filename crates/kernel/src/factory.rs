//! Construct-by-class-name registry.

use crate::class::ClassKind;
use crate::instance::{Instance, InstanceId, InstanceTree};
use std::collections::HashMap;

/// Builds a detached instance of one class.
pub type Creator = fn() -> Instance;

/// Registry mapping class names to constructors.
///
/// Built once at startup and handed by reference to whatever needs to
/// instantiate nodes by name (scripting, map loading, remote spawning).
#[derive(Debug, Clone, Default)]
pub struct InstanceFactory {
    creators: HashMap<String, Creator>,
}

impl InstanceFactory {
    /// An empty registry. Every `create` falls back to a generic instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in class registered.
    pub fn with_builtin_classes() -> Self {
        let mut factory = Self::new();
        factory.register("DataModel", || Instance::new(ClassKind::DataModel).with_name("Game"));
        factory.register("Workspace", || Instance::new(ClassKind::Workspace));
        factory.register("Lighting", || {
            Instance::new(ClassKind::Lighting)
                .with_property("Ambient", 0.5_f32)
                .with_property("Brightness", 1.0_f32)
                .with_property("TimeOfDay", 14.0_f32)
        });
        factory.register("Players", || Instance::new(ClassKind::Players));
        factory.register("ReplicatedStorage", || Instance::new(ClassKind::ReplicatedStorage));
        factory.register("StarterPack", || Instance::new(ClassKind::StarterPack));
        factory.register("Model", || Instance::new(ClassKind::Model));
        factory.register("Part", || Instance::new(ClassKind::Part));
        factory.register("SpawnLocation", || Instance::new(ClassKind::SpawnLocation));
        factory.register("Humanoid", || Instance::new(ClassKind::Humanoid));
        factory
    }

    /// Register (or replace) the constructor for `class_name`.
    pub fn register(&mut self, class_name: impl Into<String>, creator: Creator) {
        self.creators.insert(class_name.into(), creator);
    }

    pub fn is_registered(&self, class_name: &str) -> bool {
        self.creators.contains_key(class_name)
    }

    /// Build a detached instance without inserting it into a tree.
    pub fn build(&self, class_name: &str) -> Instance {
        match self.creators.get(class_name) {
            Some(creator) => creator(),
            None => {
                tracing::debug!(class_name, "unregistered class, creating generic instance");
                Instance::generic(class_name)
            }
        }
    }

    /// Create a new, parentless instance of `class_name` in `tree`.
    ///
    /// Unregistered names yield a generic instance tagged with that name.
    pub fn create(&self, tree: &mut InstanceTree, class_name: &str) -> InstanceId {
        tree.insert(self.build(class_name))
    }
}
