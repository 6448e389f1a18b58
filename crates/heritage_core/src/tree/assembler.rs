//! Iterative expansion of roots into nested tree nodes.
//!
//! # Responsibility
//! - Expand each root through `children_of` without call-stack recursion.
//! - Break parent cycles at the point of re-entry.
//! - Apply the configured shared-descendant policy and depth cap.
//!
//! # Invariants
//! - A person never appears twice on one root-to-leaf path.
//! - Child order equals `EdgeIndex::children_of` order.
//! - Spouses and parents are referenced by id and never expanded.
//! - Assembly never fails; anomalies only make the forest smaller.

use crate::model::person::{Gender, Person, PersonId};
use crate::tree::edge_index::EdgeIndex;
use crate::tree::roots::RootSet;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// What to do with a person reachable from more than one ancestor path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedDescendantPolicy {
    /// Repeat the descendant's subtree under every path that reaches it.
    #[default]
    DuplicatePerRoot,
    /// Attach the descendant only where the forest walk first reaches it.
    FirstVisitWins,
}

impl SharedDescendantPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicatePerRoot => "duplicate",
            Self::FirstVisitWins => "first-visit",
        }
    }

    /// Parses `duplicate` / `first-visit` (underscore spelling accepted).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "duplicate" | "duplicate_per_root" | "duplicate-per-root" => {
                Some(Self::DuplicatePerRoot)
            }
            "first-visit" | "first_visit" | "first_visit_wins" | "first-visit-wins" => {
                Some(Self::FirstVisitWins)
            }
            _ => None,
        }
    }
}

/// Tree build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AssemblyOptions {
    pub policy: SharedDescendantPolicy,
    /// Deepest expanded level; roots are depth 0. `None` means uncapped.
    pub max_depth: Option<usize>,
}

/// One person in the derived hierarchy.
///
/// `children` is omitted from JSON when empty so leaves stay compact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: PersonId,
    pub name: String,
    pub gender: Option<Gender>,
    #[serde(rename = "birthdate")]
    pub birth_date: Option<String>,
    #[serde(rename = "deathdate")]
    pub death_date: Option<String>,
    pub is_alive: bool,
    pub birthplace: Option<String>,
    pub photo_url: Option<String>,
    pub spouses: Vec<PersonId>,
    pub parents: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        let mut total = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

// Unlinks children onto a heap stack; the derived drop recurses per generation.
impl Drop for TreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Counters collected while assembling a forest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    pub nodes: usize,
    pub cycles_broken: usize,
    pub shared_skipped: usize,
    pub depth_pruned: usize,
}

struct Frame<'a> {
    node: TreeNode,
    pending: std::slice::Iter<'a, PersonId>,
    depth: usize,
}

/// Expands roots of one scope into [`TreeNode`] hierarchies.
pub struct HierarchyAssembler<'a> {
    persons: HashMap<PersonId, &'a Person>,
    index: &'a EdgeIndex,
    options: AssemblyOptions,
}

impl<'a> HierarchyAssembler<'a> {
    pub fn new(persons: &'a [Person], index: &'a EdgeIndex, options: AssemblyOptions) -> Self {
        Self {
            persons: persons.iter().map(|person| (person.id, person)).collect(),
            index,
            options,
        }
    }

    /// Expands every root in order. Unknown root ids are skipped.
    pub fn assemble_forest(&self, roots: &RootSet) -> (Vec<TreeNode>, AssemblyReport) {
        let mut report = AssemblyReport::default();
        let mut visited = HashSet::new();
        let mut forest = Vec::with_capacity(roots.len());

        for entry in roots.entries() {
            if self.options.policy == SharedDescendantPolicy::FirstVisitWins
                && visited.contains(&entry.person_id)
            {
                report.shared_skipped += 1;
                continue;
            }
            if let Some(node) = self.expand(entry.person_id, &mut visited, &mut report) {
                forest.push(node);
            }
        }

        (forest, report)
    }

    /// Expands a single root with a fresh visited set.
    pub fn assemble(&self, root: PersonId) -> Option<TreeNode> {
        let mut report = AssemblyReport::default();
        self.expand(root, &mut HashSet::new(), &mut report)
    }

    fn expand(
        &self,
        root: PersonId,
        visited: &mut HashSet<PersonId>,
        report: &mut AssemblyReport,
    ) -> Option<TreeNode> {
        let person = self.persons.get(&root)?;
        let mut on_path = HashSet::from([root]);
        visited.insert(root);
        report.nodes += 1;
        let mut stack = vec![self.open_frame(person, 0)];

        loop {
            let next = match stack.last_mut() {
                Some(frame) => frame.pending.next().map(|child| (*child, frame.depth)),
                None => return None,
            };

            match next {
                Some((child_id, depth)) => {
                    let Some(child) = self.persons.get(&child_id) else {
                        continue;
                    };
                    if on_path.contains(&child_id) {
                        debug!(
                            "event=cycle_broken module=tree person_id={child_id} depth={}",
                            depth + 1
                        );
                        report.cycles_broken += 1;
                        continue;
                    }
                    if self.options.policy == SharedDescendantPolicy::FirstVisitWins
                        && visited.contains(&child_id)
                    {
                        report.shared_skipped += 1;
                        continue;
                    }
                    if self.options.max_depth.is_some_and(|max| depth + 1 > max) {
                        report.depth_pruned += 1;
                        continue;
                    }

                    on_path.insert(child_id);
                    visited.insert(child_id);
                    report.nodes += 1;
                    stack.push(self.open_frame(child, depth + 1));
                }
                None => {
                    let done = stack.pop()?;
                    on_path.remove(&done.node.id);
                    match stack.last_mut() {
                        Some(parent) => parent.node.children.push(done.node),
                        None => return Some(done.node),
                    }
                }
            }
        }
    }

    fn open_frame(&self, person: &Person, depth: usize) -> Frame<'a> {
        Frame {
            node: TreeNode {
                id: person.id,
                name: person.full_name.clone(),
                gender: person.gender,
                birth_date: person.birth_date.clone(),
                death_date: person.death_date.clone(),
                is_alive: person.is_alive,
                birthplace: person.birthplace.clone(),
                photo_url: person.photo_url.clone(),
                spouses: self.index.spouses_of(person.id).to_vec(),
                parents: self.index.parents_of(person.id).to_vec(),
                children: Vec::new(),
            },
            pending: self.index.children_of(person.id).iter(),
            depth,
        }
    }
}
