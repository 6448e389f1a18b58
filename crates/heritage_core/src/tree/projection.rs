//! Output shapes for a derived forest.
//!
//! # Responsibility
//! - Wrap the forest under a synthetic top-level node.
//! - Reduce rich nodes to the compact display shape.
//!
//! # Invariants
//! - Projection keeps node order, nesting and cardinality.
//! - The synthetic wrapper carries a name and children only.

use crate::model::person::{Gender, PersonId};
use crate::tree::assembler::TreeNode;
use serde::{Deserialize, Serialize};

/// Name of the synthetic wrapper in the rich shape.
pub const RICH_ROOT_NAME: &str = "Root";
/// Name of the synthetic wrapper in the compact shape.
pub const SIMPLE_ROOT_NAME: &str = "Family Tree";

/// Forest wrapped under a synthetic `Root` node.
///
/// `children` is always serialized, even for an empty scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichTreeView {
    pub name: String,
    pub children: Vec<TreeNode>,
}

impl RichTreeView {
    pub fn from_forest(roots: Vec<TreeNode>) -> Self {
        Self {
            name: RICH_ROOT_NAME.to_string(),
            children: roots,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// Display-only node: identity and life dates, no relation references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTreeNode {
    pub name: String,
    pub id: PersonId,
    pub gender: Option<Gender>,
    #[serde(rename = "birthdate")]
    pub birth_date: Option<String>,
    #[serde(rename = "deathdate")]
    pub death_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SimpleTreeNode>,
}

impl Drop for SimpleTreeNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Forest wrapped under a synthetic `Family Tree` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleTreeView {
    pub name: String,
    pub children: Vec<SimpleTreeNode>,
}

impl SimpleTreeView {
    pub fn from_forest(roots: &[TreeNode]) -> Self {
        Self {
            name: SIMPLE_ROOT_NAME.to_string(),
            children: roots.iter().map(project_node).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::from_forest(&[])
    }
}

impl From<&RichTreeView> for SimpleTreeView {
    fn from(view: &RichTreeView) -> Self {
        Self::from_forest(&view.children)
    }
}

fn shell(node: &TreeNode) -> SimpleTreeNode {
    SimpleTreeNode {
        name: node.name.clone(),
        id: node.id,
        gender: node.gender,
        birth_date: node.birth_date.clone(),
        death_date: node.death_date.clone(),
        children: Vec::with_capacity(node.children.len()),
    }
}

/// Projects one subtree without recursion so deep chains stay safe.
fn project_node(root: &TreeNode) -> SimpleTreeNode {
    let mut stack = vec![(shell(root), root.children.iter())];
    let mut finished = None;

    while let Some((_, pending)) = stack.last_mut() {
        if let Some(child) = pending.next() {
            stack.push((shell(child), child.children.iter()));
            continue;
        }
        if let Some((done, _)) = stack.pop() {
            match stack.last_mut() {
                Some((parent, _)) => parent.children.push(done),
                None => finished = Some(done),
            }
        }
    }

    finished.unwrap_or_else(|| shell(root))
}
