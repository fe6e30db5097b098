use crate::class::{Capability, ClassKind};
use crate::node::{HumanoidData, ModelData, NodeData, PartData};
use crate::property::{PropertyBag, PropertyType, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name a `Model` looks for when adopting its primary part.
pub const ROOT_PART_NAME: &str = "HumanoidRootPart";

/// Stable handle to a node in an [`InstanceTree`].
///
/// Handles are generational: destroying a node bumps its slot generation, so
/// every outstanding handle to it goes stale instead of dangling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId {
    index: u32,
    generation: u32,
}

impl InstanceId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// A scene-graph node: class identity, name, links and a property bag, plus
/// the typed payload of its variant.
#[derive(Debug, Clone)]
pub struct Instance {
    kind: ClassKind,
    class_name: String,
    name: String,
    parent: Option<InstanceId>,
    children: Vec<InstanceId>,
    properties: PropertyBag,
    data: NodeData,
}

impl Instance {
    /// Construct a node of a built-in class, named after its class.
    pub fn new(kind: ClassKind) -> Self {
        Self {
            kind,
            class_name: kind.class_name().to_string(),
            name: kind.class_name().to_string(),
            parent: None,
            children: Vec::new(),
            properties: PropertyBag::new(),
            data: NodeData::for_kind(kind),
        }
    }

    /// Construct an inert generic node tagged with an arbitrary class name.
    pub fn generic(class_name: impl Into<String>) -> Self {
        let class_name = class_name.into();
        Self {
            kind: ClassKind::Instance,
            name: class_name.clone(),
            class_name,
            parent: None,
            children: Vec::new(),
            properties: PropertyBag::new(),
            data: NodeData::Plain,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_property<T: PropertyType>(mut self, name: &str, value: T) -> Self {
        self.properties.set(name, value);
        self
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<InstanceId> {
        self.parent
    }

    pub fn children(&self) -> &[InstanceId] {
        &self.children
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// True for the node's own class name and every capability of its kind.
    pub fn is_a(&self, class_name: &str) -> bool {
        self.class_name == class_name || self.kind.satisfies(class_name)
    }
}

/// Structural change notifications recorded by the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    ChildAdded { parent: InstanceId, child: InstanceId },
    ChildRemoved { parent: InstanceId, child: InstanceId },
    Destroyed { id: InstanceId },
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

/// Arena owning every instance of one process-wide scene graph.
///
/// # Invariants
/// - Each node has at most one parent, and the parent lists it exactly once.
/// - The parent relation is acyclic.
/// - Destroying a node destroys all of its descendants before it is unlinked
///   from its own parent.
///
/// Operations on destroyed (stale) handles are silent no-ops, and queries on
/// them return empty results. Callers that care check [`Self::is_destroyed`].
#[derive(Debug, Clone, Default)]
pub struct InstanceTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    events: Vec<TreeEvent>,
}

impl InstanceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Drain and return the structural event log.
    pub fn drain_events(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[TreeEvent] {
        &self.events
    }

    /// Take ownership of a detached instance and return its handle.
    pub fn insert(&mut self, mut instance: Instance) -> InstanceId {
        instance.parent = None;
        instance.children.clear();
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(instance);
            InstanceId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                instance: Some(instance),
            });
            InstanceId {
                index,
                generation: 0,
            }
        }
    }

    /// Construct and insert a built-in node of `kind`.
    pub fn create(&mut self, kind: ClassKind) -> InstanceId {
        self.insert(Instance::new(kind))
    }

    pub fn get(&self, id: InstanceId) -> Option<&Instance> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.instance.as_ref())
    }

    fn get_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.instance.as_mut())
    }

    pub fn is_alive(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn is_destroyed(&self, id: InstanceId) -> bool {
        !self.is_alive(id)
    }

    pub fn class_name(&self, id: InstanceId) -> Option<&str> {
        self.get(id).map(Instance::class_name)
    }

    pub fn name(&self, id: InstanceId) -> Option<&str> {
        self.get(id).map(Instance::name)
    }

    pub fn set_name(&mut self, id: InstanceId, name: impl Into<String>) {
        if let Some(inst) = self.get_mut(id) {
            inst.name = name.into();
        }
    }

    pub fn is_a(&self, id: InstanceId, class_name: &str) -> bool {
        self.get(id).is_some_and(|i| i.is_a(class_name))
    }

    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.get(id).and_then(Instance::parent)
    }

    pub fn children(&self, id: InstanceId) -> &[InstanceId] {
        self.get(id).map(Instance::children).unwrap_or(&[])
    }

    /// Live parentless instances, in slot order.
    pub fn roots(&self) -> impl Iterator<Item = InstanceId> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.instance
                .as_ref()
                .filter(|i| i.parent.is_none())
                .map(|_| InstanceId {
                    index: index as u32,
                    generation: slot.generation,
                })
        })
    }

    /// True if `ancestor` appears on the parent chain of `node`.
    pub fn is_ancestor_of(&self, ancestor: InstanceId, node: InstanceId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(p) = cursor {
            if p == ancestor {
                return true;
            }
            cursor = self.parent(p);
        }
        false
    }

    /// Detach `child` from its current parent and attach it under `parent`
    /// (or leave it detached for `None`).
    ///
    /// No-op when either node is destroyed, when `parent` is `child` itself or
    /// one of its descendants, or when `parent` is already the parent.
    pub fn set_parent(&mut self, child: InstanceId, parent: Option<InstanceId>) {
        if !self.is_alive(child) {
            return;
        }
        if let Some(p) = parent {
            if !self.is_alive(p) || p == child || self.is_ancestor_of(child, p) {
                tracing::trace!(?child, ?p, "rejected re-parent");
                return;
            }
        }
        let old = self.parent(child);
        if old == parent {
            return;
        }
        if let Some(old) = old {
            self.unlink(old, child);
        }
        if let Some(p) = parent {
            if let Some(inst) = self.get_mut(child) {
                inst.parent = Some(p);
            }
            if let Some(inst) = self.get_mut(p) {
                inst.children.push(child);
            }
            self.events.push(TreeEvent::ChildAdded { parent: p, child });
            self.on_child_added(p, child);
        }
    }

    fn unlink(&mut self, parent: InstanceId, child: InstanceId) {
        if let Some(inst) = self.get_mut(parent) {
            if let Some(pos) = inst.children.iter().position(|c| *c == child) {
                inst.children.remove(pos);
            }
        }
        if let Some(inst) = self.get_mut(child) {
            inst.parent = None;
        }
        self.events.push(TreeEvent::ChildRemoved { parent, child });
        self.on_child_removed(parent, child);
    }

    fn on_child_added(&mut self, parent: InstanceId, child: InstanceId) {
        let adopt = self.model(parent).is_some_and(|m| m.primary_part.is_none())
            && self.name(child) == Some(ROOT_PART_NAME)
            && self.is_base_part(child);
        if adopt {
            self.set_primary_part(parent, Some(child));
        }
    }

    fn on_child_removed(&mut self, parent: InstanceId, child: InstanceId) {
        if self.model(parent).and_then(|m| m.primary_part) == Some(child) {
            self.set_primary_part(parent, None);
        }
    }

    /// First direct child, in insertion order, named `name`.
    pub fn find_first_child(&self, id: InstanceId, name: &str) -> Option<InstanceId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.name(*c) == Some(name))
    }

    /// First direct child, in insertion order, satisfying `is_a(class_name)`.
    pub fn find_first_child_of_class(
        &self,
        id: InstanceId,
        class_name: &str,
    ) -> Option<InstanceId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.is_a(*c, class_name))
    }

    /// Pre-order flattening of the subtree below `id` (excluding `id`).
    pub fn descendants(&self, id: InstanceId) -> Vec<InstanceId> {
        let mut out = Vec::new();
        let mut stack: Vec<InstanceId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Dot-joined names from the root down to `id`, e.g. `Game.Workspace.Part`.
    pub fn full_name(&self, id: InstanceId) -> String {
        let mut path = Vec::new();
        let mut cursor = Some(id);
        while let Some(node) = cursor {
            match self.get(node) {
                Some(inst) => path.push(inst.name()),
                None => break,
            }
            cursor = self.parent(node);
        }
        path.reverse();
        path.join(".")
    }

    /// Destroy `id` and every descendant. Idempotent.
    pub fn destroy(&mut self, id: InstanceId) {
        if !self.is_alive(id) {
            return;
        }
        for child in self.children(id).to_vec() {
            self.destroy(child);
        }
        if let Some(parent) = self.parent(id) {
            self.unlink(parent, id);
        }
        let slot = &mut self.slots[id.index as usize];
        slot.instance = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        self.events.push(TreeEvent::Destroyed { id });
    }

    /// Destroy every child of `id`, leaving `id` itself alive.
    pub fn clear_children(&mut self, id: InstanceId) {
        for child in self.children(id).to_vec() {
            self.destroy(child);
        }
    }

    /// Deep-copy `id` and its subtree. The copy is live and has no parent.
    ///
    /// A model's primary part is remapped onto the copied part when the
    /// source part lies inside the copied subtree, and cleared otherwise.
    pub fn clone_subtree(&mut self, id: InstanceId) -> Option<InstanceId> {
        let mut mapping = HashMap::new();
        let root = self.clone_node(id, &mut mapping)?;
        let copies: Vec<InstanceId> = mapping.values().copied().collect();
        for copy in copies {
            if let Some(primary) = self.model(copy).and_then(|m| m.primary_part) {
                let remapped = mapping.get(&primary).copied();
                self.set_primary_part(copy, remapped);
            }
        }
        Some(root)
    }

    fn clone_node(
        &mut self,
        id: InstanceId,
        mapping: &mut HashMap<InstanceId, InstanceId>,
    ) -> Option<InstanceId> {
        let source = self.get(id)?;
        let copy = Instance {
            kind: source.kind,
            class_name: source.class_name.clone(),
            name: source.name.clone(),
            parent: None,
            children: Vec::new(),
            properties: source.properties.clone(),
            data: source.data.clone(),
        };
        let children = source.children.clone();
        let copy_id = self.insert(copy);
        mapping.insert(id, copy_id);
        for child in children {
            if let Some(child_copy) = self.clone_node(child, mapping) {
                self.set_parent(child_copy, Some(copy_id));
            }
        }
        Some(copy_id)
    }

    // --- Properties ---

    pub fn get_property<T: PropertyType>(&self, id: InstanceId, name: &str) -> T {
        self.get(id)
            .map(|i| i.properties.get(name))
            .unwrap_or_else(T::zero)
    }

    pub fn set_property<T: PropertyType>(&mut self, id: InstanceId, name: &str, value: T) {
        if let Some(inst) = self.get_mut(id) {
            inst.properties.set(name, value);
        }
    }

    pub fn property_raw(&self, id: InstanceId, name: &str) -> Option<&PropertyValue> {
        self.get(id).and_then(|i| i.properties.get_raw(name))
    }

    pub fn has_property(&self, id: InstanceId, name: &str) -> bool {
        self.get(id).is_some_and(|i| i.properties.contains(name))
    }

    // --- Typed payloads ---

    pub fn is_base_part(&self, id: InstanceId) -> bool {
        self.get(id).is_some_and(|i| i.kind.has(Capability::BasePart))
    }

    pub fn part(&self, id: InstanceId) -> Option<&PartData> {
        match &self.get(id)?.data {
            NodeData::Part(p) => Some(p),
            _ => None,
        }
    }

    pub fn part_mut(&mut self, id: InstanceId) -> Option<&mut PartData> {
        match &mut self.get_mut(id)?.data {
            NodeData::Part(p) => Some(p),
            _ => None,
        }
    }

    pub fn humanoid(&self, id: InstanceId) -> Option<&HumanoidData> {
        match &self.get(id)?.data {
            NodeData::Humanoid(h) => Some(h),
            _ => None,
        }
    }

    pub fn humanoid_mut(&mut self, id: InstanceId) -> Option<&mut HumanoidData> {
        match &mut self.get_mut(id)?.data {
            NodeData::Humanoid(h) => Some(h),
            _ => None,
        }
    }

    pub fn model(&self, id: InstanceId) -> Option<&ModelData> {
        match &self.get(id)?.data {
            NodeData::Model(m) => Some(m),
            _ => None,
        }
    }

    /// The model's primary part, if set and still alive.
    pub fn primary_part(&self, model: InstanceId) -> Option<InstanceId> {
        self.model(model)
            .and_then(|m| m.primary_part)
            .filter(|p| self.is_alive(*p))
    }

    pub fn set_primary_part(&mut self, model: InstanceId, part: Option<InstanceId>) {
        if let Some(NodeData::Model(m)) = self.get_mut(model).map(|i| &mut i.data) {
            m.primary_part = part;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn named(tree: &mut InstanceTree, kind: ClassKind, name: &str) -> InstanceId {
        tree.insert(Instance::new(kind).with_name(name))
    }

    #[test]
    fn new_instance_is_named_after_class() {
        let mut tree = InstanceTree::new();
        let id = tree.create(ClassKind::Part);
        assert_eq!(tree.name(id), Some("Part"));
        assert_eq!(tree.class_name(id), Some("Part"));
        assert!(tree.is_a(id, "Part"));
        assert!(tree.is_a(id, "BasePart"));
        assert!(tree.is_a(id, "Instance"));
        assert!(!tree.is_a(id, "Model"));
    }

    #[test]
    fn parent_chain_terminates() {
        let mut tree = InstanceTree::new();
        let mut ids = vec![tree.create(ClassKind::Model)];
        for _ in 0..20 {
            let child = tree.create(ClassKind::Part);
            tree.set_parent(child, ids.last().copied());
            ids.push(child);
        }
        // Attempt to close a cycle at every depth.
        for i in 1..ids.len() {
            tree.set_parent(ids[0], Some(ids[i]));
        }
        for id in &ids {
            let mut seen = std::collections::HashSet::new();
            let mut cursor = Some(*id);
            let mut steps = 0;
            while let Some(node) = cursor {
                assert!(seen.insert(node), "revisited {node:?}");
                cursor = tree.parent(node);
                steps += 1;
            }
            assert!(steps <= ids.len());
        }
        assert_eq!(tree.parent(ids[0]), None);
    }

    #[test]
    fn reparent_to_self_is_ignored() {
        let mut tree = InstanceTree::new();
        let a = tree.create(ClassKind::Model);
        tree.set_parent(a, Some(a));
        assert_eq!(tree.parent(a), None);
        assert!(tree.children(a).is_empty());
    }

    #[test]
    fn destroy_cascades_to_descendants() {
        let mut tree = InstanceTree::new();
        let root = tree.create(ClassKind::Workspace);
        let model = tree.create(ClassKind::Model);
        let part = tree.create(ClassKind::Part);
        let nested = tree.create(ClassKind::Part);
        tree.set_parent(model, Some(root));
        tree.set_parent(part, Some(model));
        tree.set_parent(nested, Some(part));

        tree.destroy(model);

        for id in [model, part, nested] {
            assert!(tree.is_destroyed(id));
            assert_eq!(tree.parent(id), None);
        }
        assert!(tree.children(root).is_empty());
        assert!(tree.is_alive(root));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn destroy_order_is_descendants_first() {
        let mut tree = InstanceTree::new();
        let root = tree.create(ClassKind::Workspace);
        let model = tree.create(ClassKind::Model);
        let part = tree.create(ClassKind::Part);
        tree.set_parent(model, Some(root));
        tree.set_parent(part, Some(model));
        tree.drain_events();

        tree.destroy(model);
        let events = tree.drain_events();
        assert_eq!(
            events,
            vec![
                TreeEvent::ChildRemoved { parent: model, child: part },
                TreeEvent::Destroyed { id: part },
                TreeEvent::ChildRemoved { parent: root, child: model },
                TreeEvent::Destroyed { id: model },
            ]
        );
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut tree = InstanceTree::new();
        let a = tree.create(ClassKind::Part);
        tree.destroy(a);
        tree.destroy(a);
        assert_eq!(tree.len(), 0);
    }

    #[test]
    fn destroyed_handles_are_inert() {
        let mut tree = InstanceTree::new();
        let parent = tree.create(ClassKind::Model);
        let dead = tree.create(ClassKind::Part);
        tree.destroy(dead);

        tree.set_parent(dead, Some(parent));
        assert!(tree.children(parent).is_empty());

        let orphan = tree.create(ClassKind::Part);
        tree.set_parent(orphan, Some(dead));
        assert_eq!(tree.parent(orphan), None);

        tree.set_property(dead, "Speed", 3.0_f32);
        assert_eq!(tree.get_property::<f32>(dead, "Speed"), 0.0);
        assert_eq!(tree.find_first_child(dead, "x"), None);
        assert!(tree.descendants(dead).is_empty());
    }

    #[test]
    fn slot_reuse_does_not_revive_stale_handles() {
        let mut tree = InstanceTree::new();
        let old = tree.create(ClassKind::Part);
        tree.destroy(old);
        let fresh = tree.create(ClassKind::Humanoid);
        assert_eq!(old.index(), fresh.index());
        assert!(tree.is_destroyed(old));
        assert!(tree.is_alive(fresh));
        assert!(tree.part(old).is_none());
    }

    #[test]
    fn find_first_child_respects_insertion_order() {
        let mut tree = InstanceTree::new();
        let parent = tree.create(ClassKind::Model);
        let first = named(&mut tree, ClassKind::Part, "Arm");
        let second = named(&mut tree, ClassKind::Part, "Arm");
        tree.set_parent(first, Some(parent));
        tree.set_parent(second, Some(parent));
        assert_eq!(tree.find_first_child(parent, "Arm"), Some(first));

        tree.set_parent(first, None);
        let third = named(&mut tree, ClassKind::Part, "Arm");
        tree.set_parent(third, Some(parent));
        assert_eq!(tree.find_first_child(parent, "Arm"), Some(second));
        assert_eq!(tree.find_first_child(parent, "Leg"), None);
    }

    #[test]
    fn find_first_child_does_not_search_descendants() {
        let mut tree = InstanceTree::new();
        let root = tree.create(ClassKind::Model);
        let mid = tree.create(ClassKind::Model);
        let deep = named(&mut tree, ClassKind::Part, "Deep");
        tree.set_parent(mid, Some(root));
        tree.set_parent(deep, Some(mid));
        assert_eq!(tree.find_first_child(root, "Deep"), None);
        assert_eq!(tree.find_first_child(mid, "Deep"), Some(deep));
    }

    #[test]
    fn find_first_child_of_class_uses_capabilities() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        let hum = tree.create(ClassKind::Humanoid);
        let spawn = tree.create(ClassKind::SpawnLocation);
        tree.set_parent(hum, Some(model));
        tree.set_parent(spawn, Some(model));
        assert_eq!(tree.find_first_child_of_class(model, "BasePart"), Some(spawn));
        assert_eq!(tree.find_first_child_of_class(model, "Instance"), Some(hum));
        assert_eq!(tree.find_first_child_of_class(model, "Part"), None);
    }

    #[test]
    fn reparent_moves_child_exactly_once() {
        let mut tree = InstanceTree::new();
        let a = tree.create(ClassKind::Model);
        let b = tree.create(ClassKind::Model);
        let child = tree.create(ClassKind::Part);
        tree.set_parent(child, Some(a));
        tree.set_parent(child, Some(b));
        tree.set_parent(child, Some(b));

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b).iter().filter(|c| **c == child).count(), 1);
        assert_eq!(tree.parent(child), Some(b));
    }

    #[test]
    fn reparent_into_own_descendant_is_ignored() {
        let mut tree = InstanceTree::new();
        let top = tree.create(ClassKind::Model);
        let mid = tree.create(ClassKind::Model);
        let leaf = tree.create(ClassKind::Part);
        tree.set_parent(mid, Some(top));
        tree.set_parent(leaf, Some(mid));

        tree.set_parent(top, Some(leaf));
        assert_eq!(tree.parent(top), None);
        assert_eq!(tree.parent(mid), Some(top));
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut tree = InstanceTree::new();
        let root = tree.create(ClassKind::Model);
        let a = named(&mut tree, ClassKind::Model, "a");
        let a1 = named(&mut tree, ClassKind::Part, "a1");
        let a2 = named(&mut tree, ClassKind::Part, "a2");
        let b = named(&mut tree, ClassKind::Part, "b");
        tree.set_parent(a, Some(root));
        tree.set_parent(b, Some(root));
        tree.set_parent(a1, Some(a));
        tree.set_parent(a2, Some(a));
        assert_eq!(tree.descendants(root), vec![a, a1, a2, b]);
    }

    #[test]
    fn full_name_joins_ancestors() {
        let mut tree = InstanceTree::new();
        let game = named(&mut tree, ClassKind::DataModel, "Game");
        let ws = tree.create(ClassKind::Workspace);
        let part = named(&mut tree, ClassKind::Part, "Brick");
        tree.set_parent(ws, Some(game));
        tree.set_parent(part, Some(ws));
        assert_eq!(tree.full_name(part), "Game.Workspace.Brick");
    }

    #[test]
    fn clone_copies_subtree_without_parent() {
        let mut tree = InstanceTree::new();
        let world = tree.create(ClassKind::Workspace);
        let model = named(&mut tree, ClassKind::Model, "Car");
        let wheel = named(&mut tree, ClassKind::Part, "Wheel");
        tree.set_parent(model, Some(world));
        tree.set_parent(wheel, Some(model));
        tree.set_property(model, "Speed", 12.5_f32);
        if let Some(p) = tree.part_mut(wheel) {
            p.position = Vec3::new(1.0, 2.0, 3.0);
        }

        let copy = tree.clone_subtree(model).unwrap();
        assert_ne!(copy, model);
        assert_eq!(tree.parent(copy), None);
        assert_eq!(tree.name(copy), Some("Car"));
        assert_eq!(tree.get_property::<f32>(copy, "Speed"), 12.5);

        let wheel_copy = tree.find_first_child(copy, "Wheel").unwrap();
        assert_ne!(wheel_copy, wheel);
        assert_eq!(tree.part(wheel_copy).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
        // The source is untouched.
        assert_eq!(tree.children(model), &[wheel]);
    }

    #[test]
    fn clone_of_generic_keeps_class_tag() {
        let mut tree = InstanceTree::new();
        let w = tree.insert(Instance::generic("UnknownWidget"));
        let copy = tree.clone_subtree(w).unwrap();
        assert_eq!(tree.class_name(copy), Some("UnknownWidget"));
        assert!(tree.is_a(copy, "UnknownWidget"));
    }

    #[test]
    fn model_adopts_root_part_and_forgets_it_on_removal() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        let root = named(&mut tree, ClassKind::Part, ROOT_PART_NAME);
        tree.set_parent(root, Some(model));
        assert_eq!(tree.primary_part(model), Some(root));

        tree.set_parent(root, None);
        assert_eq!(tree.primary_part(model), None);
    }

    #[test]
    fn clone_remaps_primary_part() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        let root = named(&mut tree, ClassKind::Part, ROOT_PART_NAME);
        tree.set_parent(root, Some(model));

        let copy = tree.clone_subtree(model).unwrap();
        let copied_root = tree.find_first_child(copy, ROOT_PART_NAME).unwrap();
        assert_eq!(tree.primary_part(copy), Some(copied_root));
        assert_eq!(tree.primary_part(model), Some(root));
    }

    #[test]
    fn primary_part_handle_goes_stale_on_destroy() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        let part = tree.create(ClassKind::Part);
        tree.set_primary_part(model, Some(part));
        tree.destroy(part);
        assert_eq!(tree.primary_part(model), None);
    }

    #[test]
    fn clear_children_keeps_parent() {
        let mut tree = InstanceTree::new();
        let model = tree.create(ClassKind::Model);
        for _ in 0..3 {
            let p = tree.create(ClassKind::Part);
            tree.set_parent(p, Some(model));
        }
        tree.clear_children(model);
        assert!(tree.children(model).is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn roots_lists_only_parentless() {
        let mut tree = InstanceTree::new();
        let a = tree.create(ClassKind::Workspace);
        let b = tree.create(ClassKind::Part);
        let c = tree.create(ClassKind::Lighting);
        tree.set_parent(b, Some(a));
        let roots: Vec<_> = tree.roots().collect();
        assert_eq!(roots, vec![a, c]);
    }
}
