//! # Closure Engine
//!
//! Transitive closure over a role-restricted relation graph.
//!
//! The expansion tracks an explicit visited set with monotonic growth and
//! terminates on the first step that discovers no new nodes. Cyclic graphs
//! (group A contains B contains A) therefore terminate correctly; this is
//! a required property, not an optimization.

use crate::types::ObjectId;
use std::collections::{BTreeSet, VecDeque};

/// Compute the set of nodes reachable from `seed` by repeatedly applying
/// `step` (the immediate-neighbor function).
///
/// The seed itself is part of the result, matching the convention that
/// closures start from the immediate neighbor set: a start node appears in
/// its own closure iff it lies on a cycle.
#[must_use]
pub fn transitive_reach(
    seed: BTreeSet<ObjectId>,
    step: impl Fn(&ObjectId) -> BTreeSet<ObjectId>,
) -> BTreeSet<ObjectId> {
    let mut visited = seed.clone();
    let mut frontier: VecDeque<ObjectId> = seed.into_iter().collect();

    while let Some(node) = frontier.pop_front() {
        for neighbor in step(&node) {
            // Only newly discovered nodes re-enter the frontier.
            if visited.insert(neighbor.clone()) {
                frontier.push_back(neighbor);
            }
        }
    }
    visited
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relation::{Direction, RelationSet};
    use crate::types::RoleId;

    fn oid(s: &str) -> ObjectId {
        ObjectId::new(s)
    }

    fn reach(rel: &RelationSet, start: &str, role: &str) -> BTreeSet<ObjectId> {
        let role = RoleId::new(role);
        let step = |n: &ObjectId| rel.get_roleset(n, &role, Direction::Forward);
        transitive_reach(step(&oid(start)), step)
    }

    #[test]
    fn chain_reaches_every_descendant() {
        let mut rel = RelationSet::new();
        rel.insert(oid("g1"), RoleId::new("contains"), oid("g2"));
        rel.insert(oid("g2"), RoleId::new("contains"), oid("g3"));
        rel.insert(oid("g3"), RoleId::new("contains"), oid("g4"));

        assert_eq!(
            reach(&rel, "g1", "contains"),
            BTreeSet::from([oid("g2"), oid("g3"), oid("g4")])
        );
        assert!(reach(&rel, "g4", "contains").is_empty());
    }

    #[test]
    fn cycle_terminates_and_includes_start() {
        let mut rel = RelationSet::new();
        rel.insert(oid("a"), RoleId::new("contains"), oid("b"));
        rel.insert(oid("b"), RoleId::new("contains"), oid("c"));
        rel.insert(oid("c"), RoleId::new("contains"), oid("a"));

        // A lies on the cycle, so it appears in its own closure.
        assert_eq!(
            reach(&rel, "a", "contains"),
            BTreeSet::from([oid("a"), oid("b"), oid("c")])
        );
    }

    #[test]
    fn self_loop_terminates() {
        let mut rel = RelationSet::new();
        rel.insert(oid("a"), RoleId::new("contains"), oid("a"));
        assert_eq!(reach(&rel, "a", "contains"), BTreeSet::from([oid("a")]));
    }

    #[test]
    fn diamond_visits_each_node_once() {
        let mut rel = RelationSet::new();
        rel.insert(oid("top"), RoleId::new("contains"), oid("l"));
        rel.insert(oid("top"), RoleId::new("contains"), oid("r"));
        rel.insert(oid("l"), RoleId::new("contains"), oid("bottom"));
        rel.insert(oid("r"), RoleId::new("contains"), oid("bottom"));

        assert_eq!(
            reach(&rel, "top", "contains"),
            BTreeSet::from([oid("l"), oid("r"), oid("bottom")])
        );
    }

    #[test]
    fn immediate_set_is_subset_of_closure() {
        let mut rel = RelationSet::new();
        rel.insert(oid("x"), RoleId::new("contains"), oid("y"));
        rel.insert(oid("y"), RoleId::new("contains"), oid("z"));

        let role = RoleId::new("contains");
        let immediate = rel.get_roleset(&oid("x"), &role, Direction::Forward);
        let closure = reach(&rel, "x", "contains");
        assert!(immediate.is_subset(&closure));
    }
}
