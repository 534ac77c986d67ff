//! # Relation Store
//!
//! A set of `(subject, role, object)` triples with directional neighbor
//! queries. This is the set-backed sibling of
//! [`crate::collection::Collection`]: edges are immutable by identity,
//! compared by value, and duplicates collapse under set semantics.
//!
//! Iteration order over the set is an implementation detail; callers must
//! not rely on it except through explicit sorting.

use crate::criteria::CriteriaSpec;
use crate::types::{Edge, ObjectId, RoleId, StoreError};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// DIRECTION
// =============================================================================

/// Direction of a neighbor query over the relation graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow edges from subject to object.
    Forward,
    /// Follow edges from object back to subject.
    Reverse,
}

impl Direction {
    /// The endpoint an edge is anchored at in this direction.
    #[must_use]
    pub fn anchor<'a>(&self, edge: &'a Edge) -> &'a ObjectId {
        match self {
            Direction::Forward => &edge.subject,
            Direction::Reverse => &edge.object,
        }
    }

    /// The endpoint opposite the anchor in this direction.
    #[must_use]
    pub fn opposite<'a>(&self, edge: &'a Edge) -> &'a ObjectId {
        match self {
            Direction::Forward => &edge.object,
            Direction::Reverse => &edge.subject,
        }
    }
}

// =============================================================================
// RELATION SET
// =============================================================================

/// The store of relation edges.
#[derive(Debug, Clone, Default)]
pub struct RelationSet {
    edges: BTreeSet<Edge>,
}

impl RelationSet {
    /// Create a new empty relation set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Check whether the set holds no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Add an edge. Duplicate triples collapse silently; the returned edge
    /// is the caller's copy of what the set now contains.
    pub fn insert(&mut self, subject: ObjectId, role: RoleId, object: ObjectId) -> Edge {
        let edge = Edge::new(subject, role, object);
        self.edges.insert(edge.clone());
        edge
    }

    /// Check whether an edge is present.
    #[must_use]
    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    /// Remove every edge whose record view satisfies `criteria`.
    /// Returns the removal count.
    ///
    /// Edge fields are addressed as `subject_id`, `role_id` and
    /// `object_id`; see [`Edge::as_record`].
    pub fn delete(&mut self, criteria: &CriteriaSpec) -> Result<usize, StoreError> {
        let predicate = criteria.compile()?;
        let doomed: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| predicate.matches(&e.as_record()))
            .cloned()
            .collect();
        for edge in &doomed {
            self.edges.remove(edge);
        }
        Ok(doomed.len())
    }

    /// The single neighbor-query primitive all higher traversal builds on.
    ///
    /// Returns the opposite endpoints of all edges carrying `role` that are
    /// anchored at `anchor` in the given direction.
    #[must_use]
    pub fn get_roleset(
        &self,
        anchor: &ObjectId,
        role: &RoleId,
        direction: Direction,
    ) -> BTreeSet<ObjectId> {
        self.edges
            .iter()
            .filter(|e| e.role == *role && direction.anchor(e) == anchor)
            .map(|e| direction.opposite(e).clone())
            .collect()
    }

    /// Group all edges carrying `role`, mapping each anchor endpoint to the
    /// set of opposite endpoints.
    ///
    /// Candidate edges are selected by comparing the stored role id to the
    /// supplied `role` value.
    #[must_use]
    pub fn get_all_related_by(
        &self,
        role: &RoleId,
        direction: Direction,
    ) -> BTreeMap<ObjectId, BTreeSet<ObjectId>> {
        let mut out: BTreeMap<ObjectId, BTreeSet<ObjectId>> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| e.role == *role) {
            out.entry(direction.anchor(edge).clone())
                .or_default()
                .insert(direction.opposite(edge).clone());
        }
        out
    }

    /// Undirected all-neighbors query: the union of all subjects and all
    /// objects connected to `id` by any role.
    #[must_use]
    pub fn get_all_related(&self, id: &ObjectId) -> BTreeSet<ObjectId> {
        let mut out = BTreeSet::new();
        for edge in &self.edges {
            if edge.object == *id {
                out.insert(edge.subject.clone());
            }
            if edge.subject == *id {
                out.insert(edge.object.clone());
            }
        }
        out
    }

    /// Group the edges anchored at `id` by role, into sets of opposite
    /// endpoints.
    #[must_use]
    pub fn get_related_role_map(
        &self,
        id: &ObjectId,
        direction: Direction,
    ) -> BTreeMap<RoleId, BTreeSet<ObjectId>> {
        let mut out: BTreeMap<RoleId, BTreeSet<ObjectId>> = BTreeMap::new();
        for edge in self.edges.iter().filter(|e| direction.anchor(e) == id) {
            out.entry(edge.role.clone())
                .or_default()
                .insert(direction.opposite(edge).clone());
        }
        out
    }

    /// Iterate over all edges in value order.
    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Remove every edge.
    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Rebuild a relation set from a list of edges (duplicates collapse).
    #[must_use]
    pub fn from_edges(edges: Vec<Edge>) -> Self {
        Self {
            edges: edges.into_iter().collect(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::Matcher;
    use crate::types::{FIELD_OBJECT, FIELD_ROLE, FIELD_SUBJECT, Value};

    fn oid(s: &str) -> ObjectId {
        ObjectId::new(s)
    }

    fn rid(s: &str) -> RoleId {
        RoleId::new(s)
    }

    fn seeded() -> RelationSet {
        let mut rel = RelationSet::new();
        rel.insert(oid("a"), rid("r1"), oid("b"));
        rel.insert(oid("a"), rid("r1"), oid("c"));
        rel.insert(oid("b"), rid("r1"), oid("c"));
        rel.insert(oid("a"), rid("r2"), oid("d"));
        rel.insert(oid("e"), rid("r2"), oid("a"));
        rel
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut rel = RelationSet::new();
        rel.insert(oid("a"), rid("r"), oid("b"));
        rel.insert(oid("a"), rid("r"), oid("b"));
        assert_eq!(rel.len(), 1);
    }

    #[test]
    fn roleset_symmetry() {
        let mut rel = RelationSet::new();
        rel.insert(oid("a"), rid("r"), oid("b"));

        let forward = rel.get_roleset(&oid("a"), &rid("r"), Direction::Forward);
        assert!(forward.contains(&oid("b")));

        let reverse = rel.get_roleset(&oid("b"), &rid("r"), Direction::Reverse);
        assert!(reverse.contains(&oid("a")));
    }

    #[test]
    fn roleset_filters_by_role_and_anchor() {
        let rel = seeded();
        let under_r1 = rel.get_roleset(&oid("a"), &rid("r1"), Direction::Forward);
        assert_eq!(under_r1, BTreeSet::from([oid("b"), oid("c")]));

        let under_r2 = rel.get_roleset(&oid("a"), &rid("r2"), Direction::Forward);
        assert_eq!(under_r2, BTreeSet::from([oid("d")]));

        let unknown = rel.get_roleset(&oid("a"), &rid("r9"), Direction::Forward);
        assert!(unknown.is_empty());
    }

    #[test]
    fn all_related_by_groups_by_anchor() {
        let rel = seeded();
        let grouped = rel.get_all_related_by(&rid("r1"), Direction::Forward);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[&oid("a")], BTreeSet::from([oid("b"), oid("c")]));
        assert_eq!(grouped[&oid("b")], BTreeSet::from([oid("c")]));

        // Selection is by role value: r2 edges are not swept in.
        assert!(!grouped.contains_key(&oid("e")));

        let reversed = rel.get_all_related_by(&rid("r1"), Direction::Reverse);
        assert_eq!(reversed[&oid("c")], BTreeSet::from([oid("a"), oid("b")]));
    }

    #[test]
    fn all_related_unions_both_directions() {
        let rel = seeded();
        let neighbors = rel.get_all_related(&oid("a"));
        assert_eq!(
            neighbors,
            BTreeSet::from([oid("b"), oid("c"), oid("d"), oid("e")])
        );
    }

    #[test]
    fn related_role_map_is_incident_only() {
        let rel = seeded();
        let map = rel.get_related_role_map(&oid("a"), Direction::Forward);
        assert_eq!(map.len(), 2);
        assert_eq!(map[&rid("r1")], BTreeSet::from([oid("b"), oid("c")]));
        assert_eq!(map[&rid("r2")], BTreeSet::from([oid("d")]));

        let reverse = rel.get_related_role_map(&oid("a"), Direction::Reverse);
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[&rid("r2")], BTreeSet::from([oid("e")]));
    }

    #[test]
    fn delete_by_full_triple() {
        let mut rel = seeded();
        let criteria = CriteriaSpec::field_eq(FIELD_SUBJECT, "a")
            .and(FIELD_ROLE, Matcher::Eq(Value::Str("r1".into())))
            .and(FIELD_OBJECT, Matcher::Eq(Value::Str("b".into())));
        let removed = rel.delete(&criteria).expect("delete");
        assert_eq!(removed, 1);
        assert!(!rel.contains(&Edge::new(oid("a"), rid("r1"), oid("b"))));
        assert_eq!(rel.len(), 4);
    }

    #[test]
    fn delete_by_role_sweeps_all_matching() {
        let mut rel = seeded();
        let removed = rel
            .delete(&CriteriaSpec::field_eq(FIELD_ROLE, "r1"))
            .expect("delete");
        assert_eq!(removed, 3);
        assert!(
            rel.get_roleset(&oid("a"), &rid("r1"), Direction::Forward)
                .is_empty()
        );
    }

    #[test]
    fn delete_with_scalar_is_invalid_argument() {
        let mut rel = seeded();
        let result = rel.delete(&CriteriaSpec::Scalar(Value::Str("a".into())));
        assert!(matches!(result, Err(StoreError::InvalidArgument(_))));
        assert_eq!(rel.len(), 5);
    }
}
