//! Root discovery for one scope.
//!
//! # Invariants
//! - Lineage roots are exactly the persons without an in-scope parent, in
//!   person presentation order.
//! - Every person is reachable from some returned root. Persons only reachable
//!   through a parent cycle get a cycle-break root, listed after all lineage
//!   roots.

use crate::model::person::{Person, PersonId};
use crate::tree::edge_index::EdgeIndex;
use std::collections::HashSet;

/// Why a person was chosen as a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Person has no recorded parent in scope.
    Lineage,
    /// Person has parents, but none of its ancestors is parentless; it was
    /// promoted so its cyclic component still appears in the forest.
    CycleBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootEntry {
    pub person_id: PersonId,
    pub kind: RootKind,
}

/// Ordered forest roots of a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootSet {
    entries: Vec<RootEntry>,
}

impl RootSet {
    pub fn entries(&self) -> &[RootEntry] {
        &self.entries
    }

    /// Root ids in output order.
    pub fn ids(&self) -> Vec<PersonId> {
        self.entries.iter().map(|entry| entry.person_id).collect()
    }

    pub fn cycle_break_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.kind == RootKind::CycleBreak)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves the root set for `persons` using the parent lookups in `index`.
pub fn resolve_roots(persons: &[Person], index: &EdgeIndex) -> RootSet {
    let mut seen = HashSet::new();
    let mut entries: Vec<RootEntry> = persons
        .iter()
        .filter(|person| seen.insert(person.id) && !index.has_parent(person.id))
        .map(|person| RootEntry {
            person_id: person.id,
            kind: RootKind::Lineage,
        })
        .collect();

    let mut reached = HashSet::new();
    for entry in &entries {
        mark_reachable(entry.person_id, index, &mut reached);
    }

    for person in persons {
        if reached.contains(&person.id) {
            continue;
        }
        entries.push(RootEntry {
            person_id: person.id,
            kind: RootKind::CycleBreak,
        });
        mark_reachable(person.id, index, &mut reached);
    }

    RootSet { entries }
}

fn mark_reachable(start: PersonId, index: &EdgeIndex, reached: &mut HashSet<PersonId>) {
    if !reached.insert(start) {
        return;
    }
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        for child in index.children_of(current) {
            if reached.insert(*child) {
                stack.push(*child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{resolve_roots, RootKind};
    use crate::model::person::Person;
    use crate::model::relationship::Relationship;
    use crate::tree::edge_index::EdgeIndex;

    fn people(names: &[&str]) -> Vec<Person> {
        names.iter().map(|name| Person::new(*name)).collect()
    }

    #[test]
    fn parentless_persons_are_roots_in_presentation_order() {
        let persons = people(&["A", "B", "C"]);
        let (a, b, c) = (persons[0].id, persons[1].id, persons[2].id);
        let index = EdgeIndex::build(&persons, &[Relationship::parent(a, c)]);

        let roots = resolve_roots(&persons, &index);

        assert_eq!(roots.ids(), vec![a, b]);
        assert_eq!(roots.cycle_break_count(), 0);
    }

    #[test]
    fn empty_scope_has_no_roots() {
        let index = EdgeIndex::default();
        let roots = resolve_roots(&[], &index);
        assert!(roots.is_empty());
        assert_eq!(roots.len(), 0);
    }

    #[test]
    fn pure_cycle_is_entered_at_first_person_in_order() {
        let persons = people(&["A", "B"]);
        let (a, b) = (persons[0].id, persons[1].id);
        let edges = vec![Relationship::parent(a, b), Relationship::parent(b, a)];
        let index = EdgeIndex::build(&persons, &edges);

        let roots = resolve_roots(&persons, &index);

        assert_eq!(roots.ids(), vec![a]);
        assert_eq!(roots.entries()[0].kind, RootKind::CycleBreak);
    }

    #[test]
    fn cycle_below_a_lineage_root_needs_no_extra_root() {
        let persons = people(&["A", "B", "C"]);
        let (a, b, c) = (persons[0].id, persons[1].id, persons[2].id);
        let edges = vec![
            Relationship::parent(a, b),
            Relationship::parent(b, c),
            Relationship::parent(c, b),
        ];
        let index = EdgeIndex::build(&persons, &edges);

        let roots = resolve_roots(&persons, &index);

        assert_eq!(roots.ids(), vec![a]);
        assert_eq!(roots.cycle_break_count(), 0);
    }

    #[test]
    fn cycle_break_roots_follow_lineage_roots() {
        let persons = people(&["X", "Y", "Lone"]);
        let (x, y, lone) = (persons[0].id, persons[1].id, persons[2].id);
        let edges = vec![Relationship::parent(x, y), Relationship::parent(y, x)];
        let index = EdgeIndex::build(&persons, &edges);

        let roots = resolve_roots(&persons, &index);

        assert_eq!(roots.ids(), vec![lone, x]);
        assert_eq!(roots.entries()[0].kind, RootKind::Lineage);
        assert_eq!(roots.entries()[1].kind, RootKind::CycleBreak);
    }

    #[test]
    fn no_lineage_root_has_an_in_scope_parent() {
        let persons = people(&["A", "B", "C", "D"]);
        let (a, b, c, d) = (persons[0].id, persons[1].id, persons[2].id, persons[3].id);
        let edges = vec![
            Relationship::parent(a, c),
            Relationship::parent(b, c),
            Relationship::parent(c, d),
        ];
        let index = EdgeIndex::build(&persons, &edges);

        let roots = resolve_roots(&persons, &index);

        for entry in roots.entries() {
            assert_eq!(entry.kind, RootKind::Lineage);
            assert!(!index.has_parent(entry.person_id));
        }
        assert_eq!(roots.ids(), vec![a, b]);
    }
}
