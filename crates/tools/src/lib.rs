//! Developer tooling: read-only inspection of the instance tree.
//!
//! # Invariants
//! - Inspection never mutates the tree or drains its event log.

pub mod inspector;

pub use inspector::{InstanceInfo, NodeDump, TreeInspector, TreeSummary};

pub fn crate_info() -> &'static str {
    "cubeworld-tools v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("tools"));
    }
}
