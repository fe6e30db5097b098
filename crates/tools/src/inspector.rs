use cubeworld_kernel::{ClassKind, InstanceId, InstanceTree, PartData, PropertyBag};
use serde::Serialize;

/// Instance tree inspector for developer tooling.
///
/// Read-only queries for debugging and the CLI's `tree` command.
pub struct TreeInspector;

impl TreeInspector {
    pub fn summary(tree: &InstanceTree) -> TreeSummary {
        let mut summary = TreeSummary {
            live_instances: tree.len(),
            roots: 0,
            parts: 0,
            models: 0,
            humanoids: 0,
            pending_events: tree.events().len(),
        };
        for root in tree.roots() {
            summary.roots += 1;
            for id in std::iter::once(root).chain(tree.descendants(root)) {
                if tree.is_base_part(id) {
                    summary.parts += 1;
                }
                if tree.humanoid(id).is_some() {
                    summary.humanoids += 1;
                }
                if tree.model(id).is_some() {
                    summary.models += 1;
                }
            }
        }
        summary
    }

    pub fn inspect(tree: &InstanceTree, id: InstanceId) -> Option<InstanceInfo> {
        let instance = tree.get(id)?;
        Some(InstanceInfo {
            id,
            class_name: instance.class_name().to_string(),
            full_name: tree.full_name(id),
            child_count: instance.children().len(),
            property_count: instance.properties().len(),
            part: tree.part(id).copied(),
        })
    }

    /// All live instances under `root` (inclusive) that satisfy `class_name`.
    pub fn find_all(tree: &InstanceTree, root: InstanceId, class_name: &str) -> Vec<InstanceId> {
        if !tree.is_alive(root) {
            return Vec::new();
        }
        std::iter::once(root)
            .chain(tree.descendants(root))
            .filter(|id| tree.is_a(*id, class_name))
            .collect()
    }

    /// Indented outline of the subtree, one instance per line.
    pub fn outline(tree: &InstanceTree, root: InstanceId) -> String {
        let mut out = String::new();
        Self::outline_into(tree, root, 0, &mut out);
        out
    }

    fn outline_into(tree: &InstanceTree, id: InstanceId, depth: usize, out: &mut String) {
        let Some(instance) = tree.get(id) else {
            return;
        };
        out.push_str(&"  ".repeat(depth));
        out.push_str(instance.name());
        out.push_str(" (");
        out.push_str(instance.class_name());
        out.push(')');
        if let Some(part) = tree.part(id) {
            let p = part.position;
            out.push_str(&format!(" @ ({:.2}, {:.2}, {:.2})", p.x, p.y, p.z));
        }
        out.push('\n');
        for child in instance.children() {
            Self::outline_into(tree, *child, depth + 1, out);
        }
    }

    /// Serializable copy of the subtree.
    pub fn dump(tree: &InstanceTree, root: InstanceId) -> Option<NodeDump> {
        let instance = tree.get(root)?;
        Some(NodeDump {
            class_name: instance.class_name().to_string(),
            name: instance.name().to_string(),
            properties: instance.properties().clone(),
            part: tree.part(root).copied(),
            children: instance
                .children()
                .iter()
                .filter_map(|child| Self::dump(tree, *child))
                .collect(),
        })
    }

    pub fn dump_json(tree: &InstanceTree, root: InstanceId) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::dump(tree, root))
    }

    /// Count of live instances per class, in class-table order.
    pub fn class_histogram(tree: &InstanceTree) -> Vec<(ClassKind, usize)> {
        let mut counts: Vec<(ClassKind, usize)> = ClassKind::ALL.iter().map(|k| (*k, 0)).collect();
        for root in tree.roots() {
            for id in std::iter::once(root).chain(tree.descendants(root)) {
                if let Some(instance) = tree.get(id) {
                    if let Some(entry) = counts.iter_mut().find(|(k, _)| *k == instance.kind()) {
                        entry.1 += 1;
                    }
                }
            }
        }
        counts.retain(|(_, n)| *n > 0);
        counts
    }
}

/// Summary of tree state for the inspector.
#[derive(Debug, Clone)]
pub struct TreeSummary {
    pub live_instances: usize,
    pub roots: usize,
    pub parts: usize,
    pub models: usize,
    pub humanoids: usize,
    pub pending_events: usize,
}

impl std::fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tree: instances={} roots={} parts={} models={} humanoids={} pending_events={}",
            self.live_instances,
            self.roots,
            self.parts,
            self.models,
            self.humanoids,
            self.pending_events
        )
    }
}

/// Detailed info about a single instance.
#[derive(Debug, Clone)]
pub struct InstanceInfo {
    pub id: InstanceId,
    pub class_name: String,
    pub full_name: String,
    pub child_count: usize,
    pub property_count: usize,
    pub part: Option<PartData>,
}

impl std::fmt::Display for InstanceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}#{}] children={} properties={}",
            self.full_name,
            self.class_name,
            self.id.index(),
            self.child_count,
            self.property_count
        )?;
        if let Some(part) = &self.part {
            write!(
                f,
                " pos=({:.2}, {:.2}, {:.2}) size=({:.2}, {:.2}, {:.2})",
                part.position.x,
                part.position.y,
                part.position.z,
                part.size.x,
                part.size.y,
                part.size.z,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeDump {
    pub class_name: String,
    pub name: String,
    #[serde(skip_serializing_if = "PropertyBag::is_empty")]
    pub properties: PropertyBag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<PartData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDump>,
}
