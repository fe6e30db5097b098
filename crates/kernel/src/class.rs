//! Closed set of node classes and the capability table behind `is_a` queries.

use serde::{Deserialize, Serialize};

/// A named trait a node class may satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    Instance,
    DataModel,
    Workspace,
    Lighting,
    Players,
    ReplicatedStorage,
    StarterPack,
    Model,
    BasePart,
    Part,
    SpawnLocation,
    Humanoid,
}

impl Capability {
    pub fn name(self) -> &'static str {
        match self {
            Capability::Instance => "Instance",
            Capability::DataModel => "DataModel",
            Capability::Workspace => "Workspace",
            Capability::Lighting => "Lighting",
            Capability::Players => "Players",
            Capability::ReplicatedStorage => "ReplicatedStorage",
            Capability::StarterPack => "StarterPack",
            Capability::Model => "Model",
            Capability::BasePart => "BasePart",
            Capability::Part => "Part",
            Capability::SpawnLocation => "SpawnLocation",
            Capability::Humanoid => "Humanoid",
        }
    }
}

/// Concrete node variant. `Instance` is the generic variant and may carry any
/// class-name string (see [`crate::Instance::class_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassKind {
    Instance,
    DataModel,
    Workspace,
    Lighting,
    Players,
    ReplicatedStorage,
    StarterPack,
    Model,
    Part,
    SpawnLocation,
    Humanoid,
}

impl ClassKind {
    /// Every kind, in declaration order.
    pub const ALL: [ClassKind; 11] = [
        ClassKind::Instance,
        ClassKind::DataModel,
        ClassKind::Workspace,
        ClassKind::Lighting,
        ClassKind::Players,
        ClassKind::ReplicatedStorage,
        ClassKind::StarterPack,
        ClassKind::Model,
        ClassKind::Part,
        ClassKind::SpawnLocation,
        ClassKind::Humanoid,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            ClassKind::Instance => "Instance",
            ClassKind::DataModel => "DataModel",
            ClassKind::Workspace => "Workspace",
            ClassKind::Lighting => "Lighting",
            ClassKind::Players => "Players",
            ClassKind::ReplicatedStorage => "ReplicatedStorage",
            ClassKind::StarterPack => "StarterPack",
            ClassKind::Model => "Model",
            ClassKind::Part => "Part",
            ClassKind::SpawnLocation => "SpawnLocation",
            ClassKind::Humanoid => "Humanoid",
        }
    }

    pub fn from_class_name(name: &str) -> Option<ClassKind> {
        Self::ALL.into_iter().find(|k| k.class_name() == name)
    }

    /// Capability membership, most specific first. Always ends in `Instance`.
    pub fn capabilities(self) -> &'static [Capability] {
        use Capability as C;
        match self {
            ClassKind::Instance => &[C::Instance],
            ClassKind::DataModel => &[C::DataModel, C::Instance],
            ClassKind::Workspace => &[C::Workspace, C::Instance],
            ClassKind::Lighting => &[C::Lighting, C::Instance],
            ClassKind::Players => &[C::Players, C::Instance],
            ClassKind::ReplicatedStorage => &[C::ReplicatedStorage, C::Instance],
            ClassKind::StarterPack => &[C::StarterPack, C::Instance],
            ClassKind::Model => &[C::Model, C::Instance],
            ClassKind::Part => &[C::Part, C::BasePart, C::Instance],
            ClassKind::SpawnLocation => &[C::SpawnLocation, C::BasePart, C::Instance],
            ClassKind::Humanoid => &[C::Humanoid, C::Instance],
        }
    }

    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    pub fn satisfies(self, name: &str) -> bool {
        self.capabilities().iter().any(|c| c.name() == name)
    }

    pub fn is_base_part(self) -> bool {
        self.has(Capability::BasePart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_is_an_instance() {
        for kind in ClassKind::ALL {
            assert!(kind.satisfies("Instance"), "{kind:?}");
            assert_eq!(kind.capabilities().last(), Some(&Capability::Instance));
        }
    }

    #[test]
    fn parts_answer_base_part() {
        assert!(ClassKind::Part.satisfies("BasePart"));
        assert!(ClassKind::SpawnLocation.satisfies("BasePart"));
        assert!(!ClassKind::Humanoid.satisfies("BasePart"));
        assert!(!ClassKind::Part.satisfies("SpawnLocation"));
    }

    #[test]
    fn class_name_lookup_is_inverse() {
        for kind in ClassKind::ALL {
            assert_eq!(ClassKind::from_class_name(kind.class_name()), Some(kind));
        }
        assert_eq!(ClassKind::from_class_name("UnknownWidget"), None);
        // BasePart is a capability, not a constructible class.
        assert_eq!(ClassKind::from_class_name("BasePart"), None);
    }
}
