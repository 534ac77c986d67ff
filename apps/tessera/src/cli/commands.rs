//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command follows the same shape: load the store from the
//! snapshot file, run one facade operation, save if anything changed,
//! print the result.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tessera_core::{
    ClassId, CriteriaSpec, Direction, FindQuery, Matcher, ObjectId, Record, SequentialSource,
    Snapshot, Store, StoreError, Value,
    primitives::{MAX_IMPORT_EDGE_COUNT, MAX_IMPORT_RECORD_COUNT, MAX_SNAPSHOT_PAYLOAD_SIZE},
};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum file size for JSON import (100 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
const MAX_IMPORT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Maximum store snapshot file size, matching the decode-side limit.
const MAX_STORE_FILE_SIZE: u64 = MAX_SNAPSHOT_PAYLOAD_SIZE as u64;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), StoreError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| StoreError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(StoreError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Validate an input file path.
///
/// Canonicalizes the path to resolve symlinks and "..", ensures it
/// exists, and ensures it is a regular file. This prevents path
/// traversal through arguments like "../../../etc/passwd".
fn validate_file_path(path: &Path) -> Result<PathBuf, StoreError> {
    let canonical = path.canonicalize().map_err(|e| {
        StoreError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(StoreError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Validate an output file path.
///
/// For output files the parent directory must exist; the file itself
/// may not yet.
fn validate_output_path(path: &Path) -> Result<PathBuf, StoreError> {
    let parent = path.parent().unwrap_or(Path::new("."));

    let canonical_parent = parent.canonicalize().map_err(|e| {
        StoreError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(StoreError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| StoreError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// JSON <-> STORE VALUE CONVERSION
// =============================================================================

/// Convert a JSON value into a store value.
///
/// The store is integer-only, so floats are rejected rather than
/// silently truncated. Nested objects have no store counterpart.
fn json_to_value(json: &serde_json::Value) -> Result<Value, StoreError> {
    match json {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| {
            StoreError::InvalidArgument(format!("Non-integer number not supported: {n}"))
        }),
        serde_json::Value::String(s) => Ok(Value::Str(s.clone())),
        serde_json::Value::Array(items) => {
            let values: Result<Vec<Value>, StoreError> = items.iter().map(json_to_value).collect();
            Ok(Value::List(values?))
        }
        serde_json::Value::Object(_) => Err(StoreError::InvalidArgument(
            "Nested objects are not valid field values".to_string(),
        )),
    }
}

/// Convert a store value into a JSON value.
fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::from(*i),
        Value::Str(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
    }
}

/// Render a record as a JSON object.
fn record_to_json(record: &Record) -> serde_json::Value {
    let map: serde_json::Map<String, serde_json::Value> = record
        .fields()
        .map(|(field, value)| (field.to_string(), value_to_json(value)))
        .collect();
    serde_json::Value::Object(map)
}

/// Parse a record from a JSON object argument.
fn parse_record(raw: &str) -> Result<Record, StoreError> {
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidArgument(format!("Invalid JSON record: {e}")))?;

    let serde_json::Value::Object(map) = json else {
        return Err(StoreError::InvalidArgument(
            "Record must be a JSON object".to_string(),
        ));
    };

    let mut record = Record::new();
    for (field, value) in &map {
        record.set(field.clone(), json_to_value(value)?);
    }
    Ok(record)
}

/// Parse a field matcher from its JSON form.
///
/// A plain value means equality. An object with a single operator key
/// (`eq`, `ne`, `gt`, `gte`, `lt`, `lte`, `in`, `exists`) selects that
/// comparison.
fn parse_matcher(json: &serde_json::Value) -> Result<Matcher, StoreError> {
    let serde_json::Value::Object(map) = json else {
        return Ok(Matcher::Eq(json_to_value(json)?));
    };

    if map.len() != 1 {
        return Err(StoreError::InvalidArgument(
            "Matcher object must have exactly one operator key".to_string(),
        ));
    }
    let (op, operand) = match map.iter().next() {
        Some(entry) => entry,
        None => {
            return Err(StoreError::InvalidArgument(
                "Matcher object must have exactly one operator key".to_string(),
            ));
        }
    };

    match op.as_str() {
        "eq" => Ok(Matcher::Eq(json_to_value(operand)?)),
        "ne" => Ok(Matcher::Ne(json_to_value(operand)?)),
        "gt" => Ok(Matcher::Gt(json_to_value(operand)?)),
        "gte" => Ok(Matcher::Gte(json_to_value(operand)?)),
        "lt" => Ok(Matcher::Lt(json_to_value(operand)?)),
        "lte" => Ok(Matcher::Lte(json_to_value(operand)?)),
        "in" => {
            let serde_json::Value::Array(items) = operand else {
                return Err(StoreError::InvalidArgument(
                    "'in' operand must be an array".to_string(),
                ));
            };
            let values: Result<Vec<Value>, StoreError> =
                items.iter().map(json_to_value).collect();
            Ok(Matcher::In(values?))
        }
        "exists" => {
            let serde_json::Value::Bool(b) = operand else {
                return Err(StoreError::InvalidArgument(
                    "'exists' operand must be a boolean".to_string(),
                ));
            };
            Ok(Matcher::Exists(*b))
        }
        other => Err(StoreError::InvalidArgument(format!(
            "Unknown matcher operator '{other}'"
        ))),
    }
}

/// Parse criteria from an optional JSON argument.
///
/// `None` matches everything. A JSON object becomes a field-matcher
/// conjunction. Any other JSON value becomes scalar criteria, which
/// the store rejects with a precise error instead of misreading it as
/// an id.
fn parse_criteria(raw: Option<&str>) -> Result<CriteriaSpec, StoreError> {
    let Some(raw) = raw else {
        return Ok(CriteriaSpec::all());
    };
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidArgument(format!("Invalid JSON criteria: {e}")))?;

    let serde_json::Value::Object(map) = json else {
        return Ok(CriteriaSpec::Scalar(json_to_value(&json)?));
    };

    let mut criteria = CriteriaSpec::all();
    for (field, value) in &map {
        criteria = criteria.and(field.clone(), parse_matcher(value)?);
    }
    Ok(criteria)
}

/// Split a comma-separated field list argument.
fn split_fields(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// =============================================================================
// STORE FILE I/O
// =============================================================================

/// Build an empty store honoring the configured id scheme.
fn new_store(id_prefix: Option<&str>) -> Store {
    match id_prefix {
        Some(prefix) => Store::with_sources(
            Box::new(SequentialSource::new(prefix)),
            Box::new(tessera_core::DotCodec),
        ),
        None => Store::new(),
    }
}

/// Load a store from a snapshot file, or create a fresh one if the
/// file does not exist yet.
pub fn load_or_create_store(path: &Path, id_prefix: Option<&str>) -> Result<Store, StoreError> {
    let mut store = new_store(id_prefix);
    if path.exists() {
        validate_file_size(path, MAX_STORE_FILE_SIZE)?;
        let data = std::fs::read(path)
            .map_err(|e| StoreError::IoError(format!("Read store: {}", e)))?;
        Snapshot::from_bytes(&data)?.apply_to(&mut store)?;
    }
    Ok(store)
}

/// Save a store to a snapshot file.
pub fn save_store(store: &Store, path: &Path) -> Result<(), StoreError> {
    let data = Snapshot::capture(store).to_bytes()?;
    std::fs::write(path, &data)
        .map_err(|e| StoreError::IoError(format!("Write store: {}", e)))
}

/// Print a set of object ids, one per line in ascending order.
fn print_idset(ids: &BTreeSet<ObjectId>) {
    for id in ids {
        println!("{id}");
    }
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Show store status.
pub fn cmd_status(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    let snapshot = Snapshot::capture(&store);

    let record_count: usize = snapshot.collections.values().map(Vec::len).sum();
    let instance_count: usize = snapshot.instances.values().map(Vec::len).sum();

    if json_mode {
        let output = serde_json::json!({
            "store": store_path.to_string_lossy(),
            "collections": store.list_collection_names(),
            "record_count": record_count,
            "edge_count": snapshot.edges.len(),
            "class_count": snapshot.instances.len(),
            "instance_count": instance_count,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
        return Ok(());
    }

    println!("Tessera Store Status");
    println!("====================");
    println!("Store: {:?}", store_path);
    println!();
    println!("Collections: {}", snapshot.collections.len());
    println!("Records:     {}", record_count);
    println!("Edges:       {}", snapshot.edges.len());
    println!("Classes:     {}", snapshot.instances.len());
    println!("Instances:   {}", instance_count);

    Ok(())
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Initialize a new store file.
pub fn cmd_init(store_path: &Path, id_prefix: Option<&str>, force: bool) -> Result<(), StoreError> {
    if store_path.exists() && !force {
        return Err(StoreError::InvalidArgument(
            "Store already exists. Use --force to overwrite.".to_string(),
        ));
    }

    let store = new_store(id_prefix);
    save_store(&store, store_path)?;
    println!("Initialized new store at {:?}", store_path);
    Ok(())
}

// =============================================================================
// COLLECTION COMMANDS
// =============================================================================

/// Insert a record into a collection.
pub fn cmd_insert(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
    collection: &str,
    record: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let record = parse_record(record)?;

    let id = store.insert_into(collection, record)?;
    save_store(&store, store_path)?;

    tracing::info!("Inserted {} into '{}'", id, collection);
    if json_mode {
        let output = serde_json::json!({ "id": id.as_str(), "collection": collection });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("{id}");
    }
    Ok(())
}

/// Query a collection.
#[allow(clippy::too_many_arguments)]
pub fn cmd_find(
    store_path: &Path,
    id_prefix: Option<&str>,
    collection: &str,
    criteria: Option<&str>,
    project: Option<&str>,
    order_by: Option<&str>,
    limit: Option<usize>,
    ids_only: bool,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;

    let mut query = FindQuery::matching(parse_criteria(criteria)?);
    if let Some(fields) = project {
        query = query.project(split_fields(fields));
    }
    if let Some(fields) = order_by {
        query = query.order_by(split_fields(fields));
    }
    if let Some(n) = limit {
        query = query.limit(n);
    }
    if ids_only {
        query = query.ids_only();
    }

    let results = store.find_in(collection, &query)?;
    for record in &results {
        println!(
            "{}",
            serde_json::to_string(&record_to_json(record)).unwrap_or_default()
        );
    }
    tracing::debug!("find in '{}' matched {} records", collection, results.len());
    Ok(())
}

/// Fetch a single record by id.
pub fn cmd_get(
    store_path: &Path,
    id_prefix: Option<&str>,
    collection: &str,
    id: &str,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;

    let record = store
        .get_record(collection, &ObjectId::new(id))
        .ok_or_else(|| StoreError::NotFound(format!("No record '{id}' in '{collection}'")))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&record_to_json(&record)).unwrap_or_default()
    );
    Ok(())
}

/// Patch all records matching criteria.
pub fn cmd_update(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
    collection: &str,
    criteria: &str,
    patch: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let criteria = parse_criteria(Some(criteria))?;
    let patch = parse_record(patch)?;

    let updated = store.update_in(collection, &criteria, &patch)?;
    save_store(&store, store_path)?;

    if json_mode {
        let records: Vec<serde_json::Value> = updated.iter().map(record_to_json).collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Array(records)).unwrap_or_default()
        );
    } else {
        println!("Updated {} records", updated.len());
    }
    Ok(())
}

/// Delete all records matching criteria.
pub fn cmd_delete(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
    collection: &str,
    criteria: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let criteria = parse_criteria(Some(criteria))?;

    let removed = store.delete_in(collection, &criteria)?;
    save_store(&store, store_path)?;

    if json_mode {
        let output = serde_json::json!({ "deleted": removed });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("Deleted {} records", removed);
    }
    Ok(())
}

// =============================================================================
// RELATION COMMANDS
// =============================================================================

/// Register a relation role.
pub fn cmd_role_add(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
    name: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let role = store.add_role(name)?;
    save_store(&store, store_path)?;

    if json_mode {
        let output = serde_json::json!({ "role": name, "id": role.as_str() });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("{role}");
    }
    Ok(())
}

/// Record a (subject, role, object) fact.
pub fn cmd_relate(
    store_path: &Path,
    id_prefix: Option<&str>,
    _json_mode: bool,
    subject: &str,
    role: &str,
    object: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let role = store.role_id(role)?;

    store.relate(ObjectId::new(subject), role, ObjectId::new(object));
    save_store(&store, store_path)?;

    println!("Related {} -> {}", subject, object);
    Ok(())
}

/// Remove a (subject, role, object) fact.
pub fn cmd_unrelate(
    store_path: &Path,
    id_prefix: Option<&str>,
    _json_mode: bool,
    subject: &str,
    role: &str,
    object: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let role = store.role_id(role)?;

    let removed = store.unrelate(&ObjectId::new(subject), &role, &ObjectId::new(object))?;
    save_store(&store, store_path)?;

    println!("Removed {} facts", removed);
    Ok(())
}

/// Directional neighbor query.
pub fn cmd_roleset(
    store_path: &Path,
    id_prefix: Option<&str>,
    anchor: &str,
    role: &str,
    reverse: bool,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    let role = store.role_id(role)?;
    let direction = if reverse {
        Direction::Reverse
    } else {
        Direction::Forward
    };

    print_idset(&store.get_roleset(&ObjectId::new(anchor), &role, direction));
    Ok(())
}

// =============================================================================
// TAG AND GROUP COMMANDS
// =============================================================================

/// List the tags applied to an object.
pub fn cmd_tags(
    store_path: &Path,
    id_prefix: Option<&str>,
    object: &str,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.get_object_tags(&ObjectId::new(object))?);
    Ok(())
}

/// List the objects carrying a tag.
pub fn cmd_tagged(store_path: &Path, id_prefix: Option<&str>, tag: &str) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.get_tagset(&ObjectId::new(tag))?);
    Ok(())
}

/// List the groups an object belongs to.
pub fn cmd_groups(
    store_path: &Path,
    id_prefix: Option<&str>,
    object: &str,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.get_object_groups(&ObjectId::new(object))?);
    Ok(())
}

/// List the member objects of a group.
pub fn cmd_members(
    store_path: &Path,
    id_prefix: Option<&str>,
    group: &str,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.get_groupset(&ObjectId::new(group))?);
    Ok(())
}

/// List the groups contained in a group.
pub fn cmd_subgroups(
    store_path: &Path,
    id_prefix: Option<&str>,
    group: &str,
    recursive: bool,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.groups_in_group(&ObjectId::new(group), recursive)?);
    Ok(())
}

/// List the groups containing a group.
pub fn cmd_supergroups(
    store_path: &Path,
    id_prefix: Option<&str>,
    group: &str,
    recursive: bool,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    print_idset(&store.groups_containing_group(&ObjectId::new(group), recursive)?);
    Ok(())
}

// =============================================================================
// CLASS INSTANCE COMMANDS
// =============================================================================

/// Create a class-qualified object.
pub fn cmd_new(
    store_path: &Path,
    id_prefix: Option<&str>,
    json_mode: bool,
    class: &str,
    record: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    let record = parse_record(record)?;

    let id = store.create_object(&ClassId::new(class), record)?;
    save_store(&store, store_path)?;

    tracing::info!("Created instance {} of class '{}'", id, class);
    if json_mode {
        let output = serde_json::json!({ "id": id.as_str(), "class": class });
        println!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_default()
        );
    } else {
        println!("{id}");
    }
    Ok(())
}

/// Fetch a class-qualified object by id.
pub fn cmd_object(store_path: &Path, id_prefix: Option<&str>, id: &str) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;

    let record = store
        .get_object(&ObjectId::new(id))?
        .ok_or_else(|| StoreError::NotFound(format!("No object '{id}'")))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&record_to_json(&record)).unwrap_or_default()
    );
    Ok(())
}

/// Drop every instance of a class.
pub fn cmd_drop_class(
    store_path: &Path,
    id_prefix: Option<&str>,
    _json_mode: bool,
    class: &str,
) -> Result<(), StoreError> {
    let mut store = load_or_create_store(store_path, id_prefix)?;
    store.drop_class_instances(&ClassId::new(class))?;
    save_store(&store, store_path)?;

    println!("Dropped all instances of '{}'", class);
    Ok(())
}

// =============================================================================
// EXPORT / IMPORT COMMANDS
// =============================================================================

/// Export store contents as JSON.
pub fn cmd_export(
    store_path: &Path,
    id_prefix: Option<&str>,
    output: &Path,
) -> Result<(), StoreError> {
    let store = load_or_create_store(store_path, id_prefix)?;
    let snapshot = Snapshot::capture(&store);

    let validated_output = validate_output_path(output)?;
    let json = serde_json::to_string_pretty(&snapshot)
        .map_err(|e| StoreError::SerializationError(format!("Export: {}", e)))?;
    std::fs::write(&validated_output, json)
        .map_err(|e| StoreError::IoError(format!("Write export: {}", e)))?;

    println!(
        "Exported {} records to {:?}",
        snapshot.record_count(),
        output
    );
    Ok(())
}

/// Import store contents from JSON.
pub fn cmd_import(
    store_path: &Path,
    id_prefix: Option<&str>,
    input: &Path,
) -> Result<(), StoreError> {
    let validated_input = validate_file_path(input)?;
    validate_file_size(&validated_input, MAX_IMPORT_FILE_SIZE)?;

    let data = std::fs::read(&validated_input)
        .map_err(|e| StoreError::IoError(format!("Read import: {}", e)))?;
    let snapshot: Snapshot = serde_json::from_slice(&data)
        .map_err(|e| StoreError::DeserializationError(format!("Import: {}", e)))?;

    // JSON skips the binary header, so enforce the count limits here.
    if snapshot.record_count() > MAX_IMPORT_RECORD_COUNT {
        return Err(StoreError::DeserializationError(
            "Import record count exceeds limit".to_string(),
        ));
    }
    if snapshot.edges.len() as u64 > MAX_IMPORT_EDGE_COUNT {
        return Err(StoreError::DeserializationError(
            "Import edge count exceeds limit".to_string(),
        ));
    }

    let count = snapshot.record_count();
    let mut store = new_store(id_prefix);
    snapshot.apply_to(&mut store)?;
    save_store(&store, store_path)?;

    println!("Imported {} records into {:?}", count, store_path);
    Ok(())
}
