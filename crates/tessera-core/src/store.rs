//! # Store Facade
//!
//! The `Store` owns one [`Collection`] per meta kind, the [`RelationSet`],
//! and the per-class instance table, and exposes the tag/group convenience
//! operations built on the closure engine.
//!
//! There is no process-wide registry: each `Store` instance is
//! independently constructible and disposable, and owns all of its state.
//!
//! ## Concurrency Contract
//!
//! Every operation is a synchronous in-memory computation with no
//! suspension point. The store defines no internal locking; concurrent
//! callers must serialize access externally, or they can observe torn
//! reads and lost updates on `update`/`delete`.

use crate::closure::transitive_reach;
use crate::collection::{Collection, FindQuery};
use crate::criteria::{CriteriaSpec, Matcher};
use crate::ident::{IdSource, UuidSource};
use crate::oid::{ClassCodec, DotCodec};
use crate::primitives::{
    DEFAULT_ID_LENGTH, META_KINDS, ROLE_CONTAINS_GROUP, ROLE_GROUP_CONTAINS, ROLE_NAME_FIELD,
    ROLE_TAG_APPLIES, ROLES_KIND,
};
use crate::relation::{Direction, RelationSet};
use crate::types::{
    ClassId, Edge, FIELD_OBJECT, FIELD_ROLE, FIELD_SUBJECT, ObjectId, Record, RoleId, StoreError,
    Value,
};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// =============================================================================
// STORE
// =============================================================================

/// The in-memory object store facade.
pub struct Store {
    collections: BTreeMap<String, Collection>,
    related: RelationSet,
    class_instances: BTreeMap<ClassId, BTreeMap<ObjectId, Record>>,
    ids: Box<dyn IdSource>,
    codec: Box<dyn ClassCodec>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("collections", &self.collections.len())
            .field("edges", &self.related.len())
            .field("classes_with_instances", &self.class_instances.len())
            .finish()
    }
}

impl Store {
    /// Create a store with the default identifier source (UUID v4) and the
    /// default class codec (`<class>.<token>`).
    #[must_use]
    pub fn new() -> Self {
        Self::with_sources(Box::new(UuidSource), Box::new(DotCodec))
    }

    /// Create a store with caller-supplied identifier and codec
    /// collaborators.
    ///
    /// The meta collections ([`META_KINDS`]) are constructed eagerly and
    /// live for the lifetime of the store.
    #[must_use]
    pub fn with_sources(ids: Box<dyn IdSource>, codec: Box<dyn ClassCodec>) -> Self {
        let collections = META_KINDS
            .iter()
            .map(|kind| ((*kind).to_string(), Collection::new()))
            .collect();
        Self {
            collections,
            related: RelationSet::new(),
            class_instances: BTreeMap::new(),
            ids,
            codec,
        }
    }

    // =========================================================================
    // NAMED COLLECTIONS
    // =========================================================================

    /// Get the named collection, lazily creating an empty one for unknown
    /// names.
    pub fn get_collection(&mut self, name: &str) -> &mut Collection {
        self.collections.entry(name.to_string()).or_default()
    }

    /// Read-only view of a named collection, if it exists.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&Collection> {
        self.collections.get(name)
    }

    /// Insert a record into the named collection, assigning an id when the
    /// record carries none.
    pub fn insert_into(&mut self, name: &str, record: Record) -> Result<ObjectId, StoreError> {
        let ids: &dyn IdSource = self.ids.as_ref();
        self.collections
            .entry(name.to_string())
            .or_default()
            .insert(record, ids)
    }

    /// Run a find query against the named collection.
    ///
    /// An unknown collection behaves as the empty one it would lazily
    /// become.
    pub fn find_in(&self, name: &str, query: &FindQuery) -> Result<Vec<Record>, StoreError> {
        match self.collections.get(name) {
            Some(coll) => coll.find(query),
            None => {
                // Still surface malformed criteria on the empty path.
                query.criteria.compile()?;
                Ok(Vec::new())
            }
        }
    }

    /// Find exactly one record in the named collection; empty is `NotFound`.
    pub fn find_one_in(
        &self,
        name: &str,
        criteria: CriteriaSpec,
        projection: Option<BTreeSet<String>>,
    ) -> Result<Record, StoreError> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("collection '{}' is empty", name)))?
            .find_one(criteria, projection)
    }

    /// Merge a patch into every matching record of the named collection.
    pub fn update_in(
        &mut self,
        name: &str,
        criteria: &CriteriaSpec,
        patch: &Record,
    ) -> Result<Vec<Record>, StoreError> {
        self.get_collection(name).update(criteria, patch)
    }

    /// Delete every matching record from the named collection.
    pub fn delete_in(&mut self, name: &str, criteria: &CriteriaSpec) -> Result<usize, StoreError> {
        self.get_collection(name).delete(criteria)
    }

    /// Point lookup in the named collection; absence is a value.
    #[must_use]
    pub fn get_record(&self, name: &str, id: &ObjectId) -> Option<Record> {
        self.collections.get(name).and_then(|c| c.get(id))
    }

    // =========================================================================
    // ROLE RESOLUTION
    // =========================================================================

    /// Resolve a well-known role name to its role id.
    ///
    /// Roles are records in the `roles` collection carrying a `name` field;
    /// an unregistered name is a `ConfigurationError`, never a silent empty
    /// result.
    pub fn role_id(&self, name: &str) -> Result<RoleId, StoreError> {
        let roles = self.collections.get(ROLES_KIND).ok_or_else(|| {
            StoreError::ConfigurationError("roles collection does not exist".to_string())
        })?;
        let record = roles
            .find_one(CriteriaSpec::field_eq(ROLE_NAME_FIELD, name), None)
            .map_err(|_| {
                StoreError::ConfigurationError(format!("role '{}' is not registered", name))
            })?;
        record
            .id()
            .map(|id| RoleId::new(id.as_str()))
            .ok_or_else(|| {
                StoreError::ConfigurationError(format!("role '{}' has no id", name))
            })
    }

    /// Register a role under a well-known name, returning its id.
    pub fn add_role(&mut self, name: &str) -> Result<RoleId, StoreError> {
        let record = Record::new().with(ROLE_NAME_FIELD, name);
        let id = self.insert_into(ROLES_KIND, record)?;
        Ok(RoleId::new(id.as_str()))
    }

    // =========================================================================
    // RELATIONS
    // =========================================================================

    /// Record a `(subject, role, object)` fact.
    pub fn relate(&mut self, subject: ObjectId, role: RoleId, object: ObjectId) -> Edge {
        self.related.insert(subject, role, object)
    }

    /// Remove the `(subject, role, object)` fact, if present.
    pub fn unrelate(
        &mut self,
        subject: &ObjectId,
        role: &RoleId,
        object: &ObjectId,
    ) -> Result<usize, StoreError> {
        let criteria = CriteriaSpec::field_eq(FIELD_SUBJECT, Value::from(subject))
            .and(FIELD_ROLE, Matcher::Eq(Value::from(role)))
            .and(FIELD_OBJECT, Matcher::Eq(Value::from(object)));
        self.related.delete(&criteria)
    }

    /// Directional neighbor query; see [`RelationSet::get_roleset`].
    #[must_use]
    pub fn get_roleset(
        &self,
        anchor: &ObjectId,
        role: &RoleId,
        direction: Direction,
    ) -> BTreeSet<ObjectId> {
        self.related.get_roleset(anchor, role, direction)
    }

    /// Group all edges carrying `role` by endpoint; see
    /// [`RelationSet::get_all_related_by`].
    #[must_use]
    pub fn get_all_related_by(
        &self,
        role: &RoleId,
        direction: Direction,
    ) -> BTreeMap<ObjectId, BTreeSet<ObjectId>> {
        self.related.get_all_related_by(role, direction)
    }

    /// All neighbors of `id` regardless of role or direction.
    #[must_use]
    pub fn get_all_related(&self, id: &ObjectId) -> BTreeSet<ObjectId> {
        self.related.get_all_related(id)
    }

    /// Edges anchored at `id`, grouped by role.
    #[must_use]
    pub fn get_related_role_map(&self, id: &ObjectId) -> BTreeMap<RoleId, BTreeSet<ObjectId>> {
        self.related.get_related_role_map(id, Direction::Forward)
    }

    /// Read-only view of the relation store.
    #[must_use]
    pub fn related(&self) -> &RelationSet {
        &self.related
    }

    // =========================================================================
    // TAGS & GROUPS (closure-backed convenience surface)
    // =========================================================================

    /// Objects the given tag applies to.
    pub fn get_tagset(&self, tag: &ObjectId) -> Result<BTreeSet<ObjectId>, StoreError> {
        let role = self.role_id(ROLE_TAG_APPLIES)?;
        Ok(self.related.get_roleset(tag, &role, Direction::Forward))
    }

    /// Tags applied to the given object.
    pub fn get_object_tags(&self, object: &ObjectId) -> Result<BTreeSet<ObjectId>, StoreError> {
        let role = self.role_id(ROLE_TAG_APPLIES)?;
        Ok(self.related.get_roleset(object, &role, Direction::Reverse))
    }

    /// Objects directly contained in the given group.
    pub fn get_groupset(&self, group: &ObjectId) -> Result<BTreeSet<ObjectId>, StoreError> {
        let role = self.role_id(ROLE_GROUP_CONTAINS)?;
        Ok(self.related.get_roleset(group, &role, Direction::Forward))
    }

    /// Groups directly containing the given object.
    pub fn get_object_groups(&self, object: &ObjectId) -> Result<BTreeSet<ObjectId>, StoreError> {
        let role = self.role_id(ROLE_GROUP_CONTAINS)?;
        Ok(self.related.get_roleset(object, &role, Direction::Reverse))
    }

    /// Subgroups of the given group: immediate when `recursive` is false,
    /// the full cycle-safe transitive closure otherwise.
    pub fn groups_in_group(
        &self,
        group: &ObjectId,
        recursive: bool,
    ) -> Result<BTreeSet<ObjectId>, StoreError> {
        self.group_reach(group, recursive, Direction::Forward)
    }

    /// Groups containing the given group, immediate or transitive.
    pub fn groups_containing_group(
        &self,
        group: &ObjectId,
        recursive: bool,
    ) -> Result<BTreeSet<ObjectId>, StoreError> {
        self.group_reach(group, recursive, Direction::Reverse)
    }

    fn group_reach(
        &self,
        group: &ObjectId,
        recursive: bool,
        direction: Direction,
    ) -> Result<BTreeSet<ObjectId>, StoreError> {
        let role = self.role_id(ROLE_CONTAINS_GROUP)?;
        let step = |node: &ObjectId| self.related.get_roleset(node, &role, direction);
        let immediate = step(group);
        Ok(if recursive {
            transitive_reach(immediate, step)
        } else {
            immediate
        })
    }

    // =========================================================================
    // CLASS INSTANCES
    // =========================================================================

    /// Look up an object by its class-qualified id.
    ///
    /// The owning class is decoded from the id itself; an object missing
    /// from its class bucket is `None`, not an error.
    pub fn get_object(&self, uuid: &ObjectId) -> Result<Option<Record>, StoreError> {
        let class = self.codec.decode_class(uuid)?;
        Ok(self
            .class_instances
            .get(&class)
            .and_then(|bucket| bucket.get(uuid))
            .cloned())
    }

    /// Store an object under its class bucket. The record must already
    /// carry a class-qualified id.
    pub fn put_object(&mut self, record: Record) -> Result<ObjectId, StoreError> {
        let id = record.id().ok_or_else(|| {
            StoreError::InvalidArgument("object record has no id".to_string())
        })?;
        let class = self.codec.decode_class(&id)?;
        self.class_instances
            .entry(class)
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    /// Create an object of the given class: encode a fresh class-qualified
    /// id, stamp it into the record, and store it.
    pub fn create_object(
        &mut self,
        class: &ClassId,
        mut record: Record,
    ) -> Result<ObjectId, StoreError> {
        let token = self.ids.generate(DEFAULT_ID_LENGTH);
        let id = self.codec.encode(class, &token);
        record.set_id(&id);
        self.class_instances
            .entry(class.clone())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    /// Remove the entire instance bucket of a class.
    ///
    /// Dropping a class that has no bucket is a `NotFound`, not a silent
    /// no-op.
    pub fn drop_class_instances(&mut self, class: &ClassId) -> Result<(), StoreError> {
        self.class_instances.remove(class).map(|_| ()).ok_or_else(|| {
            StoreError::NotFound(format!("class '{}' has no instances", class))
        })
    }

    /// Read-only view of a class's instance bucket.
    #[must_use]
    pub fn instances(&self, class: &ClassId) -> Option<&BTreeMap<ObjectId, Record>> {
        self.class_instances.get(class)
    }

    // =========================================================================
    // LIFECYCLE & INTROSPECTION
    // =========================================================================

    /// Drop all data: collections are reset to the eager meta set, the
    /// relation store and instance table are emptied.
    pub fn drop_database(&mut self) {
        self.collections = META_KINDS
            .iter()
            .map(|kind| ((*kind).to_string(), Collection::new()))
            .collect();
        self.related.clear();
        self.class_instances.clear();
    }

    /// Names of all existing collections, in deterministic order.
    #[must_use]
    pub fn list_collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    /// All records of the meta collections, keyed by kind.
    #[must_use]
    pub fn get_metadata(&self) -> BTreeMap<String, Vec<Record>> {
        META_KINDS
            .iter()
            .map(|kind| {
                let records = self
                    .collections
                    .get(*kind)
                    .map(|c| c.records().cloned().collect())
                    .unwrap_or_default();
                ((*kind).to_string(), records)
            })
            .collect()
    }

    // =========================================================================
    // SNAPSHOT SUPPORT (crate-internal)
    // =========================================================================

    /// Iterate over all collections by name.
    pub(crate) fn collections(&self) -> impl Iterator<Item = (&String, &Collection)> {
        self.collections.iter()
    }

    /// Full instance table, for snapshot capture.
    pub(crate) fn instance_table(&self) -> &BTreeMap<ClassId, BTreeMap<ObjectId, Record>> {
        &self.class_instances
    }

    /// Replace a collection wholesale, for snapshot restore.
    pub(crate) fn install_collection(&mut self, name: String, collection: Collection) {
        self.collections.insert(name, collection);
    }

    /// Replace the relation store wholesale, for snapshot restore.
    pub(crate) fn install_related(&mut self, related: RelationSet) {
        self.related = related;
    }

    /// Replace one class's instance bucket, for snapshot restore.
    pub(crate) fn install_instances(
        &mut self,
        class: ClassId,
        bucket: BTreeMap<ObjectId, Record>,
    ) {
        self.class_instances.insert(class, bucket);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::SequentialSource;

    fn oid(s: &str) -> ObjectId {
        ObjectId::new(s)
    }

    /// A store with the three well-known roles registered.
    fn store_with_roles() -> Store {
        let mut store = Store::new();
        store.add_role(ROLE_TAG_APPLIES).expect("role");
        store.add_role(ROLE_CONTAINS_GROUP).expect("role");
        store.add_role(ROLE_GROUP_CONTAINS).expect("role");
        store
    }

    #[test]
    fn meta_collections_exist_eagerly() {
        let store = Store::new();
        let names = store.list_collection_names();
        for kind in META_KINDS {
            assert!(names.iter().any(|n| n == kind), "missing {kind}");
        }
    }

    #[test]
    fn stores_are_independent() {
        let mut a = Store::new();
        let mut b = Store::new();
        a.insert_into("tags", Record::new().with("name", "urgent"))
            .expect("insert");
        assert_eq!(a.collection("tags").map(Collection::len), Some(1));
        assert_eq!(b.collection("tags").map(Collection::len), Some(0));
        b.drop_database();
        assert_eq!(a.collection("tags").map(Collection::len), Some(1));
    }

    #[test]
    fn get_collection_lazily_creates() {
        let mut store = Store::new();
        assert!(store.collection("custom").is_none());
        store.get_collection("custom");
        assert!(store.collection("custom").is_some());
        assert!(store.list_collection_names().contains(&"custom".to_string()));
    }

    #[test]
    fn find_in_unknown_collection_is_empty_but_validates() {
        let store = Store::new();
        let empty = store
            .find_in("custom", &FindQuery::everything())
            .expect("find");
        assert!(empty.is_empty());

        let bad = store.find_in(
            "custom",
            &FindQuery::matching(CriteriaSpec::Scalar(Value::Int(1))),
        );
        assert!(matches!(bad, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn role_resolution_round_trip() {
        let mut store = Store::new();
        let role = store.add_role("tag_applies").expect("add");
        assert_eq!(store.role_id("tag_applies").expect("resolve"), role);
    }

    #[test]
    fn missing_role_is_configuration_error() {
        let store = Store::new();
        let result = store.role_id("tag_applies");
        assert!(matches!(result, Err(StoreError::ConfigurationError(_))));

        // Closure surface propagates the same error, never an empty set.
        let result = store.get_object_tags(&oid("o1"));
        assert!(matches!(result, Err(StoreError::ConfigurationError(_))));
    }

    #[test]
    fn relate_and_roleset_symmetry() {
        let mut store = store_with_roles();
        let role = store.role_id(ROLE_TAG_APPLIES).expect("role");
        store.relate(oid("a"), role.clone(), oid("b"));

        assert!(
            store
                .get_roleset(&oid("a"), &role, Direction::Forward)
                .contains(&oid("b"))
        );
        assert!(
            store
                .get_roleset(&oid("b"), &role, Direction::Reverse)
                .contains(&oid("a"))
        );
    }

    #[test]
    fn unrelate_removes_the_fact() {
        let mut store = store_with_roles();
        let role = store.role_id(ROLE_TAG_APPLIES).expect("role");
        store.relate(oid("a"), role.clone(), oid("b"));

        let removed = store.unrelate(&oid("a"), &role, &oid("b")).expect("unrelate");
        assert_eq!(removed, 1);
        assert!(
            store
                .get_roleset(&oid("a"), &role, Direction::Forward)
                .is_empty()
        );

        // Removing an absent fact removes nothing.
        let removed = store.unrelate(&oid("a"), &role, &oid("b")).expect("unrelate");
        assert_eq!(removed, 0);
    }

    #[test]
    fn tagging_end_to_end() {
        let mut store = store_with_roles();
        let tag_role = store.role_id(ROLE_TAG_APPLIES).expect("role");

        let tag = store
            .insert_into("tags", Record::new().with("name", "urgent"))
            .expect("tag");
        store.relate(oid("o1"), tag_role, tag.clone());

        assert_eq!(
            store.get_object_tags(&oid("o1")).expect("tags"),
            BTreeSet::from([tag.clone()])
        );
        assert_eq!(
            store.get_tagset(&tag).expect("tagset"),
            BTreeSet::from([oid("o1")])
        );
    }

    #[test]
    fn group_membership_end_to_end() {
        let mut store = store_with_roles();
        let member_role = store.role_id(ROLE_GROUP_CONTAINS).expect("role");
        store.relate(oid("g1"), member_role, oid("o1"));

        assert_eq!(
            store.get_groupset(&oid("g1")).expect("groupset"),
            BTreeSet::from([oid("o1")])
        );
        assert_eq!(
            store.get_object_groups(&oid("o1")).expect("groups"),
            BTreeSet::from([oid("g1")])
        );
    }

    #[test]
    fn group_nesting_chain_closure() {
        let mut store = store_with_roles();
        let contains = store.role_id(ROLE_CONTAINS_GROUP).expect("role");
        store.relate(oid("g1"), contains.clone(), oid("g2"));
        store.relate(oid("g2"), contains, oid("g3"));

        assert_eq!(
            store.groups_in_group(&oid("g1"), true).expect("closure"),
            BTreeSet::from([oid("g2"), oid("g3")])
        );
        assert_eq!(
            store.groups_in_group(&oid("g1"), false).expect("immediate"),
            BTreeSet::from([oid("g2")])
        );
        assert!(store.groups_in_group(&oid("g3"), true).expect("leaf").is_empty());

        assert_eq!(
            store
                .groups_containing_group(&oid("g3"), true)
                .expect("ancestors"),
            BTreeSet::from([oid("g1"), oid("g2")])
        );
    }

    #[test]
    fn group_cycle_closure_terminates() {
        let mut store = store_with_roles();
        let contains = store.role_id(ROLE_CONTAINS_GROUP).expect("role");
        store.relate(oid("a"), contains.clone(), oid("b"));
        store.relate(oid("b"), contains.clone(), oid("c"));
        store.relate(oid("c"), contains, oid("a"));

        // The start lies on the cycle, so it is a member of its own closure.
        assert_eq!(
            store.groups_in_group(&oid("a"), true).expect("closure"),
            BTreeSet::from([oid("a"), oid("b"), oid("c")])
        );
    }

    #[test]
    fn immediate_is_subset_of_recursive() {
        let mut store = store_with_roles();
        let contains = store.role_id(ROLE_CONTAINS_GROUP).expect("role");
        store.relate(oid("x"), contains.clone(), oid("y"));
        store.relate(oid("y"), contains, oid("z"));

        let immediate = store.groups_in_group(&oid("x"), false).expect("immediate");
        let recursive = store.groups_in_group(&oid("x"), true).expect("closure");
        assert!(immediate.is_subset(&recursive));
    }

    #[test]
    fn object_round_trip_via_class_codec() {
        let mut store = Store::with_sources(
            Box::new(SequentialSource::new("t")),
            Box::new(DotCodec),
        );
        let class = ClassId::new("person");
        let id = store
            .create_object(&class, Record::new().with("name", "ada"))
            .expect("create");

        assert!(id.as_str().starts_with("person."));
        let fetched = store.get_object(&id).expect("get").expect("present");
        assert_eq!(fetched.get("name"), Some(&Value::Str("ada".into())));
        assert_eq!(fetched.id(), Some(id));
    }

    #[test]
    fn get_object_absent_is_none() {
        let mut store = Store::new();
        let class = ClassId::new("person");
        store
            .create_object(&class, Record::new())
            .expect("create");

        let ghost = oid("person.unknown-token");
        assert!(store.get_object(&ghost).expect("get").is_none());

        // Undecodable id is an error, not a silent miss.
        let bad = store.get_object(&oid("no-class-prefix"));
        assert!(matches!(bad, Err(StoreError::InvalidArgument(_))));
    }

    #[test]
    fn drop_class_instances_requires_bucket() {
        let mut store = Store::new();
        let class = ClassId::new("person");
        assert!(matches!(
            store.drop_class_instances(&class),
            Err(StoreError::NotFound(_))
        ));

        store
            .create_object(&class, Record::new())
            .expect("create");
        store.drop_class_instances(&class).expect("drop");
        assert!(store.instances(&class).is_none());
    }

    #[test]
    fn drop_database_resets_everything() {
        let mut store = store_with_roles();
        let role = store.role_id(ROLE_TAG_APPLIES).expect("role");
        store.relate(oid("a"), role, oid("b"));
        store
            .create_object(&ClassId::new("person"), Record::new())
            .expect("create");
        store.get_collection("custom");

        store.drop_database();

        assert_eq!(store.related().len(), 0);
        assert_eq!(store.list_collection_names().len(), META_KINDS.len());
        assert!(store.collection("custom").is_none());
        assert!(
            store
                .collection(ROLES_KIND)
                .map(Collection::is_empty)
                .unwrap_or(true)
        );
    }

    #[test]
    fn metadata_covers_meta_kinds() {
        let mut store = store_with_roles();
        store
            .insert_into("tags", Record::new().with("name", "urgent"))
            .expect("insert");

        let meta = store.get_metadata();
        assert_eq!(meta.len(), META_KINDS.len());
        assert_eq!(meta["roles"].len(), 3);
        assert_eq!(meta["tags"].len(), 1);
        assert!(meta["schemas"].is_empty());
    }
}
