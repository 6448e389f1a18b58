//! Whole-forest checks over generated graphs, including cyclic ones.

use heritage_core::tree::{resolve_roots, EdgeIndex, RootKind};
use heritage_core::{
    build_forest, AssemblyOptions, Person, Relationship, ScopeSnapshot, SharedDescendantPolicy,
    SimpleTreeNode, SimpleTreeView, TreeNode,
};
use rand::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

fn generated_snapshot(seed: u64, persons: usize, parent_edges: usize) -> ScopeSnapshot {
    let mut rng = StdRng::seed_from_u64(seed);
    let people: Vec<Person> = (0..persons)
        .map(|n| Person::new(format!("P{seed}-{n}")))
        .collect();

    let mut parents = Vec::new();
    for _ in 0..parent_edges {
        let from = people[rng.gen_range(0..persons)].id;
        let to = people[rng.gen_range(0..persons)].id;
        parents.push(Relationship::parent(from, to));
    }
    let mut spouses = Vec::new();
    for _ in 0..persons / 3 {
        let a = people[rng.gen_range(0..persons)].id;
        let b = people[rng.gen_range(0..persons)].id;
        spouses.push(Relationship::spouse(a, b));
    }
    // One edge pointing outside the scope.
    parents.push(Relationship::parent(Uuid::new_v4(), people[0].id));

    ScopeSnapshot {
        persons: people,
        parent_edges: parents,
        spouse_edges: spouses,
    }
}

fn collect_ids(nodes: &[TreeNode], into: &mut HashSet<Uuid>) {
    let mut stack: Vec<&TreeNode> = nodes.iter().collect();
    while let Some(node) = stack.pop() {
        into.insert(node.id);
        stack.extend(node.children.iter());
    }
}

fn assert_no_repeat_on_any_path(root: &TreeNode) {
    let mut stack = vec![(root, vec![root.id])];
    while let Some((node, path)) = stack.pop() {
        for child in &node.children {
            assert!(
                !path.contains(&child.id),
                "person {} repeats on its own ancestor path",
                child.id
            );
            let mut next = path.clone();
            next.push(child.id);
            stack.push((child, next));
        }
    }
}

fn assert_same_shape(rich: &TreeNode, simple: &SimpleTreeNode) {
    let mut stack = vec![(rich, simple)];
    while let Some((r, s)) = stack.pop() {
        assert_eq!(r.id, s.id);
        assert_eq!(r.name, s.name);
        assert_eq!(r.children.len(), s.children.len());
        stack.extend(r.children.iter().zip(s.children.iter()));
    }
}

#[test]
fn every_person_is_reachable_and_paths_are_acyclic() {
    for seed in 1..=40u64 {
        let snapshot = generated_snapshot(seed, 12, 18);
        let forest = build_forest(&snapshot, AssemblyOptions::default());

        let mut seen = HashSet::new();
        collect_ids(&forest.roots, &mut seen);
        for person in &snapshot.persons {
            assert!(seen.contains(&person.id), "seed {seed}: {} missing", person.id);
        }
        for root in &forest.roots {
            assert_no_repeat_on_any_path(root);
        }
        assert!(forest.dropped_edges >= 1, "seed {seed}: outside edge kept");
    }
}

#[test]
fn first_visit_places_each_person_exactly_once() {
    let options = AssemblyOptions {
        policy: SharedDescendantPolicy::FirstVisitWins,
        max_depth: None,
    };
    for seed in 1..=40u64 {
        let snapshot = generated_snapshot(seed, 10, 20);
        let forest = build_forest(&snapshot, options);

        let total: usize = forest.roots.iter().map(TreeNode::subtree_len).sum();
        assert_eq!(total, snapshot.persons.len(), "seed {seed}");
    }
}

#[test]
fn lineage_roots_never_have_parents() {
    for seed in 1..=40u64 {
        let snapshot = generated_snapshot(seed, 15, 12);
        let index = EdgeIndex::build(&snapshot.persons, snapshot.edges());
        let roots = resolve_roots(&snapshot.persons, &index);

        for entry in roots.entries() {
            match entry.kind {
                RootKind::Lineage => assert!(!index.has_parent(entry.person_id)),
                RootKind::CycleBreak => assert!(index.has_parent(entry.person_id)),
            }
        }
        let unique: HashSet<Uuid> = roots.ids().into_iter().collect();
        assert_eq!(unique.len(), roots.len(), "seed {seed}: duplicate root");
    }
}

#[test]
fn simple_projection_preserves_structure() {
    for seed in 1..=20u64 {
        let snapshot = generated_snapshot(seed, 9, 11);
        let forest = build_forest(&snapshot, AssemblyOptions::default());

        let from_rich = SimpleTreeView::from(&forest.rich_view());
        let direct = forest.simple_view();
        assert_eq!(from_rich, direct);
        for (rich, simple) in forest.roots.iter().zip(direct.children.iter()) {
            assert_same_shape(rich, simple);
        }
    }
}

#[test]
fn builds_are_deterministic_for_the_same_snapshot() {
    let snapshot = generated_snapshot(7, 14, 20);
    let first = build_forest(&snapshot, AssemblyOptions::default());
    let second = build_forest(&snapshot, AssemblyOptions::default());
    assert_eq!(first, second);
}

#[test]
fn complete_cycle_is_rendered_once_from_its_cycle_break_root() {
    let people: Vec<Person> = ["A", "B", "C", "D"].iter().map(|n| Person::new(*n)).collect();
    let ring: Vec<Relationship> = (0..people.len())
        .map(|i| Relationship::parent(people[i].id, people[(i + 1) % people.len()].id))
        .collect();
    let snapshot = ScopeSnapshot {
        persons: people.clone(),
        parent_edges: ring,
        spouse_edges: Vec::new(),
    };

    let forest = build_forest(&snapshot, AssemblyOptions::default());

    assert_eq!(forest.roots.len(), 1);
    assert_eq!(forest.root_set.cycle_break_count(), 1);
    assert_eq!(forest.roots[0].id, people[0].id);
    assert_eq!(forest.roots[0].subtree_len(), 4);
    assert_eq!(forest.report.cycles_broken, 1);
}
