//! Hierarchy derivation from flat person and relationship records.
//!
//! # Responsibility
//! - Index relationships into adjacency lookups.
//! - Choose forest roots, expand them into nested nodes, and project the
//!   result into the rich and compact output shapes.
//!
//! # Invariants
//! - Derivation is pure: it reads a [`ScopeSnapshot`] and never touches
//!   storage.
//! - Output is deterministic for a given snapshot order.
//! - Malformed input (dangling edges, cycles) shrinks the forest instead of
//!   failing the build.

pub mod assembler;
pub mod edge_index;
pub mod projection;
pub mod roots;

pub use assembler::{
    AssemblyOptions, AssemblyReport, HierarchyAssembler, SharedDescendantPolicy, TreeNode,
};
pub use edge_index::EdgeIndex;
pub use projection::{
    RichTreeView, SimpleTreeNode, SimpleTreeView, RICH_ROOT_NAME, SIMPLE_ROOT_NAME,
};
pub use roots::{resolve_roots, RootEntry, RootKind, RootSet};

use crate::model::person::Person;
use crate::model::relationship::Relationship;
use log::info;
use std::time::Instant;

/// Records loaded for one scope, already in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSnapshot {
    pub persons: Vec<Person>,
    pub parent_edges: Vec<Relationship>,
    pub spouse_edges: Vec<Relationship>,
}

impl ScopeSnapshot {
    /// Parent edges followed by spouse edges.
    pub fn edges(&self) -> impl Iterator<Item = &Relationship> {
        self.parent_edges.iter().chain(self.spouse_edges.iter())
    }
}

/// Derived forest plus what the build observed along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest {
    pub roots: Vec<TreeNode>,
    pub root_set: RootSet,
    pub report: AssemblyReport,
    pub dropped_edges: usize,
}

impl Forest {
    pub fn rich_view(&self) -> RichTreeView {
        RichTreeView::from_forest(self.roots.clone())
    }

    pub fn into_rich_view(self) -> RichTreeView {
        RichTreeView::from_forest(self.roots)
    }

    pub fn simple_view(&self) -> SimpleTreeView {
        SimpleTreeView::from_forest(&self.roots)
    }
}

/// Runs index, root resolution and assembly for one scope.
///
/// # Side effects
/// - Emits one `tree_build` info event with counters and duration.
pub fn build_forest(snapshot: &ScopeSnapshot, options: AssemblyOptions) -> Forest {
    let started_at = Instant::now();

    let index = EdgeIndex::build(&snapshot.persons, snapshot.edges());
    let root_set = resolve_roots(&snapshot.persons, &index);
    let assembler = HierarchyAssembler::new(&snapshot.persons, &index, options);
    let (roots, report) = assembler.assemble_forest(&root_set);

    info!(
        "event=tree_build module=tree status=ok persons={} roots={} cycle_break_roots={} nodes={} cycles_broken={} shared_skipped={} depth_pruned={} dropped_edges={} policy={} duration_ms={}",
        snapshot.persons.len(),
        root_set.len(),
        root_set.cycle_break_count(),
        report.nodes,
        report.cycles_broken,
        report.shared_skipped,
        report.depth_pruned,
        index.dropped_edges(),
        options.policy.as_str(),
        started_at.elapsed().as_millis()
    );

    Forest {
        roots,
        root_set,
        report,
        dropped_edges: index.dropped_edges(),
    }
}
