//! Adjacency lookups built from a flat relationship list.
//!
//! # Invariants
//! - Only edges whose both endpoints are in the loaded person set are indexed.
//! - Spouse adjacency is symmetric.
//! - Each adjacency list holds an id at most once, in first-seen edge order.

use crate::model::person::{Person, PersonId};
use crate::model::relationship::{RelationKind, Relationship};
use log::debug;
use std::collections::{HashMap, HashSet};

const ALL_KINDS: &[RelationKind] = &[RelationKind::Parent, RelationKind::Spouse];

/// Parent, child and spouse lookups for one scope.
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    children_of: HashMap<PersonId, Vec<PersonId>>,
    parents_of: HashMap<PersonId, Vec<PersonId>>,
    spouses_of: HashMap<PersonId, Vec<PersonId>>,
    dropped_edges: usize,
}

impl EdgeIndex {
    /// Indexes parent and spouse edges.
    pub fn build<'a>(
        persons: &[Person],
        edges: impl IntoIterator<Item = &'a Relationship>,
    ) -> Self {
        Self::build_with(persons, edges, ALL_KINDS)
    }

    /// Indexes only edges whose kind is listed in `kinds`.
    ///
    /// Edges of other kinds are skipped silently; they are not counted as
    /// dropped.
    pub fn build_with<'a>(
        persons: &[Person],
        edges: impl IntoIterator<Item = &'a Relationship>,
        kinds: &[RelationKind],
    ) -> Self {
        let known: HashSet<PersonId> = persons.iter().map(|person| person.id).collect();
        let mut index = Self::default();

        for edge in edges {
            if !kinds.contains(&edge.kind) {
                continue;
            }
            if !known.contains(&edge.from_person) || !known.contains(&edge.to_person) {
                debug!(
                    "event=edge_dropped module=tree reason=dangling relationship_id={} kind={}",
                    edge.id,
                    edge.kind.as_str()
                );
                index.dropped_edges += 1;
                continue;
            }
            if edge.from_person == edge.to_person {
                debug!(
                    "event=edge_dropped module=tree reason=self_relation relationship_id={}",
                    edge.id
                );
                index.dropped_edges += 1;
                continue;
            }

            match edge.kind {
                RelationKind::Parent => {
                    push_unique(
                        index.children_of.entry(edge.from_person).or_default(),
                        edge.to_person,
                    );
                    push_unique(
                        index.parents_of.entry(edge.to_person).or_default(),
                        edge.from_person,
                    );
                }
                RelationKind::Spouse => {
                    push_unique(
                        index.spouses_of.entry(edge.from_person).or_default(),
                        edge.to_person,
                    );
                    push_unique(
                        index.spouses_of.entry(edge.to_person).or_default(),
                        edge.from_person,
                    );
                }
            }
        }

        index
    }

    pub fn children_of(&self, id: PersonId) -> &[PersonId] {
        self.children_of.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn parents_of(&self, id: PersonId) -> &[PersonId] {
        self.parents_of.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn spouses_of(&self, id: PersonId) -> &[PersonId] {
        self.spouses_of.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether `id` has at least one in-scope parent.
    pub fn has_parent(&self, id: PersonId) -> bool {
        !self.parents_of(id).is_empty()
    }

    /// Number of edges ignored because an endpoint was missing or self-referencing.
    pub fn dropped_edges(&self) -> usize {
        self.dropped_edges
    }
}

fn push_unique(list: &mut Vec<PersonId>, id: PersonId) {
    if !list.contains(&id) {
        list.push(id);
    }
}
