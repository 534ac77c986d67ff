//! # Collection Store
//!
//! A named, keyed container of schema-free records with criteria-based
//! query, update and delete.
//!
//! ## Invariants
//!
//! - Every stored record carries an `id` field equal to its storage key
//! - Query operations return owned copies, never views into live storage
//! - Iteration order is the deterministic `BTreeMap` key order
//!
//! ## Concurrency Contract
//!
//! All operations are synchronous, in-memory and non-blocking. The
//! collection defines no internal locking; the embedding caller must
//! serialize concurrent access (single writer or external synchronization).

use crate::criteria::CriteriaSpec;
use crate::ident::IdSource;
use crate::primitives::DEFAULT_ID_LENGTH;
use crate::types::{ID_FIELD, ObjectId, Record, StoreError, Value};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// FIND QUERY
// =============================================================================

/// Parameters of a [`Collection::find`] query.
#[derive(Debug, Clone)]
pub struct FindQuery {
    /// Criteria selecting the matching records.
    pub criteria: CriteriaSpec,
    /// Optional restriction of result records to a field subset.
    pub projection: Option<BTreeSet<String>>,
    /// Sort fields; results are ordered ascending by this field tuple.
    /// When a projection is given, sort fields outside it are ignored.
    pub order_by: Vec<String>,
    /// Truncate the result to the first N records.
    pub limit: Option<usize>,
    /// Project each match to its id field only (overrides `projection`).
    pub ids_only: bool,
}

impl FindQuery {
    /// Query matching the given criteria with no projection or ordering.
    #[must_use]
    pub fn matching(criteria: CriteriaSpec) -> Self {
        Self {
            criteria,
            projection: None,
            order_by: Vec::new(),
            limit: None,
            ids_only: false,
        }
    }

    /// Query matching every record.
    #[must_use]
    pub fn everything() -> Self {
        Self::matching(CriteriaSpec::all())
    }

    /// Restrict result records to the given fields.
    #[must_use]
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sort ascending by the given field tuple.
    #[must_use]
    pub fn order_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Truncate the result to the first `n` records.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    /// Project each match to its id only.
    #[must_use]
    pub fn ids_only(mut self) -> Self {
        self.ids_only = true;
        self
    }
}

// =============================================================================
// COLLECTION
// =============================================================================

/// A dictionary collection: id → record.
///
/// The set-backed sibling for relation edges lives in
/// [`crate::relation::RelationSet`].
#[derive(Debug, Clone, Default)]
pub struct Collection {
    records: BTreeMap<ObjectId, Record>,
}

impl Collection {
    /// Create a new empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Insert a record, assigning a fresh id from `ids` when the record
    /// carries none. Returns the id under which the record was stored.
    ///
    /// # Collision Policy
    ///
    /// A caller-supplied id that collides with an existing record
    /// **overwrites** it. This is the documented policy, applied
    /// consistently; callers wanting rejection must check [`Self::get`]
    /// first.
    pub fn insert(
        &mut self,
        mut record: Record,
        ids: &dyn IdSource,
    ) -> Result<ObjectId, StoreError> {
        let id = match record.get(ID_FIELD) {
            Some(Value::Str(s)) if !s.is_empty() => ObjectId::new(s.clone()),
            Some(other) => {
                return Err(StoreError::InvalidArgument(format!(
                    "record id must be a non-empty string, got {:?}",
                    other
                )));
            }
            None => {
                let id = ObjectId::new(ids.generate(DEFAULT_ID_LENGTH));
                record.set_id(&id);
                id
            }
        };
        self.records.insert(id.clone(), record);
        Ok(id)
    }

    /// Point lookup by id. Absence is a value, not an error.
    ///
    /// Returns an owned copy; mutation goes through [`Self::update`].
    #[must_use]
    pub fn get(&self, id: &ObjectId) -> Option<Record> {
        self.records.get(id).cloned()
    }

    /// Evaluate a query, producing a concrete ordered sequence of owned
    /// records.
    ///
    /// Pipeline: criteria filter → sort (ascending by the `order_by` field
    /// tuple, missing fields ordering first as null) → projection or
    /// id-only reduction → limit.
    pub fn find(&self, query: &FindQuery) -> Result<Vec<Record>, StoreError> {
        let predicate = query.criteria.compile()?;

        let mut matches: Vec<&Record> = self
            .records
            .values()
            .filter(|r| predicate.matches(r))
            .collect();

        // Sort fields outside the projection are ignored.
        let order_fields: Vec<&String> = match &query.projection {
            Some(projection) if !query.ids_only => query
                .order_by
                .iter()
                .filter(|f| projection.contains(*f))
                .collect(),
            _ => query.order_by.iter().collect(),
        };
        if !order_fields.is_empty() {
            matches.sort_by_key(|r| {
                order_fields
                    .iter()
                    .map(|f| r.get(f).cloned().unwrap_or(Value::Null))
                    .collect::<Vec<Value>>()
            });
        }

        let mut out: Vec<Record> = matches
            .into_iter()
            .map(|r| {
                if query.ids_only {
                    r.project([ID_FIELD])
                } else if let Some(projection) = &query.projection {
                    r.project(projection.iter().map(String::as_str))
                } else {
                    r.clone()
                }
            })
            .collect();

        if let Some(limit) = query.limit {
            out.truncate(limit);
        }
        Ok(out)
    }

    /// Ids of all records matching the criteria.
    pub fn ids_only(&self, criteria: &CriteriaSpec) -> Result<Vec<ObjectId>, StoreError> {
        let predicate = criteria.compile()?;
        Ok(self
            .records
            .iter()
            .filter(|(_, r)| predicate.matches(r))
            .map(|(id, _)| id.clone())
            .collect())
    }

    /// Find exactly one matching record.
    ///
    /// Equivalent to `find(criteria, projection, limit=1)`; an empty result
    /// is an explicit `NotFound`, never a fault.
    pub fn find_one(
        &self,
        criteria: CriteriaSpec,
        projection: Option<BTreeSet<String>>,
    ) -> Result<Record, StoreError> {
        let mut query = FindQuery::matching(criteria).limit(1);
        query.projection = projection;
        self.find(&query)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound("no record satisfies the criteria".to_string()))
    }

    /// Merge `patch` into every record satisfying `criteria`, in place.
    ///
    /// Returns owned copies of the updated records. Mutation is immediate
    /// per matched record; there is no cross-match atomicity. The patch's
    /// `id` field, if any, is ignored — the storage-key invariant wins.
    pub fn update(
        &mut self,
        criteria: &CriteriaSpec,
        patch: &Record,
    ) -> Result<Vec<Record>, StoreError> {
        let predicate = criteria.compile()?;
        let mut effective = patch.clone();
        effective.0.remove(ID_FIELD);

        let mut updated = Vec::new();
        for record in self.records.values_mut() {
            if predicate.matches(record) {
                record.merge(&effective);
                updated.push(record.clone());
            }
        }
        Ok(updated)
    }

    /// Remove every record satisfying `criteria`. Returns the removal count.
    ///
    /// A `CriteriaSpec::Scalar` is an invalid-argument error, not a
    /// delete-by-id; express that intent as `CriteriaSpec::id_eq(...)`.
    pub fn delete(&mut self, criteria: &CriteriaSpec) -> Result<usize, StoreError> {
        let doomed = self.ids_only(criteria)?;
        for id in &doomed {
            self.records.remove(id);
        }
        Ok(doomed.len())
    }

    /// Iterate over stored records in key order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Rebuild a collection from records that already carry ids.
    ///
    /// Used by snapshot restore; an id-less record is an
    /// `InvalidArgument` since it cannot satisfy the key invariant.
    pub fn from_records(records: Vec<Record>) -> Result<Self, StoreError> {
        let mut out = Self::new();
        for record in records {
            let id = record.id().ok_or_else(|| {
                StoreError::InvalidArgument("record without id in collection data".to_string())
            })?;
            out.records.insert(id, record);
        }
        Ok(out)
    }
}

// =============================================================================
// TESTS
// =============================================================================
