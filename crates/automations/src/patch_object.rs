//! PatchObject operation engine
//!
//! A small interpreter executing an ordered list of JSON-patch-like
//! operations (Add, Copy, Move, Remove, Replace) against a working JSON
//! document. Product configuration authors attach a recovery policy to each
//! failure condition an operation can hit, so a single broken step can raise
//! an error, be skipped, or end the remaining list without failing the whole
//! resolution.
//!
//! # Example
//!
//! ```rust,ignore
//! use automations::PatchObject;
//!
//! let patch = PatchObject::from_json(r#"{
//!     "object": { "jsonObject": "{\"suburb\":\"Sydney\"}" },
//!     "operations": [
//!         { "add": { "path": "/house", "value": "12" } }
//!     ]
//! }"#)?;
//!
//! let resolution = patch.resolve()?;
//! assert_eq!(resolution.document["house"], "12");
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

use crate::error::PatchObjectError;

// ============================================================================
// Policies
// ============================================================================

/// What to do when an operation hits a failure condition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailurePolicy {
    /// Fail the whole resolution with a structured error
    #[default]
    RaiseError,
    /// Skip this operation and carry on with the next
    Continue,
    /// Stop executing the remaining operations, without an error
    End,
}

/// Policy for a target property that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExistsPolicy {
    /// Overwrite the existing value
    Replace,
    RaiseError,
    Continue,
    End,
}

/// Policy for a Replace whose target property is missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReplaceMissingPolicy {
    /// Fall through to an Add at the same path
    Add,
    RaiseError,
    Continue,
    End,
}

// ============================================================================
// Operations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Add,
    Copy,
    Move,
    Remove,
    Replace,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Add => "Add",
            OperationKind::Copy => "Copy",
            OperationKind::Move => "Move",
            OperationKind::Remove => "Remove",
            OperationKind::Replace => "Replace",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOperation {
    pub path: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_parent_property_not_found: Option<FailurePolicy>,
    /// Unset means: merge when both the existing and incoming values are
    /// objects, raise otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_property_already_exists: Option<ExistsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyOperation {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_source_property_not_found: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_destination_parent_property_not_found: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_destination_property_already_exists: Option<ExistsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOperation {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_source_property_not_found: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_destination_parent_property_not_found: Option<FailurePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_destination_property_already_exists: Option<ExistsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveOperation {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_property_not_found: Option<FailurePolicy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOperation {
    pub path: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_property_not_found: Option<ReplaceMissingPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_parent_property_not_found: Option<FailurePolicy>,
}

/// One configured operation, externally tagged by its lower-case name
///
/// The wire shape is a single-key object: `{"add": {...}}`,
/// `{"move": {...}}` and so on, matching existing product configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    Add(AddOperation),
    Copy(CopyOperation),
    Move(MoveOperation),
    Remove(RemoveOperation),
    Replace(ReplaceOperation),
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add(_) => OperationKind::Add,
            Operation::Copy(_) => OperationKind::Copy,
            Operation::Move(_) => OperationKind::Move,
            Operation::Remove(_) => OperationKind::Remove,
            Operation::Replace(_) => OperationKind::Replace,
        }
    }
}

// ============================================================================
// Failure reasons and outcomes
// ============================================================================

/// The failure condition an operation hit
///
/// The display strings are part of the error contract consumed by
/// configuration authors and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    PropertyAlreadyExists,
    ParentPropertyNotFound,
    SourcePropertyNotFound,
    DestinationParentPropertyNotFound,
    DestinationPropertyAlreadyExists,
    PropertyNotFound,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            FailureReason::PropertyAlreadyExists => "Property already exists",
            FailureReason::ParentPropertyNotFound => "Parent property not found",
            FailureReason::SourcePropertyNotFound => "Source property not found",
            FailureReason::DestinationParentPropertyNotFound => {
                "Destination parent property not found"
            }
            FailureReason::DestinationPropertyAlreadyExists => {
                "Destination property already exists"
            }
            FailureReason::PropertyNotFound => "Property not found",
        };
        f.write_str(message)
    }
}

/// What a single operation did to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationOutcome {
    /// The document was mutated
    Applied,
    /// A failure condition resolved to `continue`; the document is untouched
    Skipped,
    /// A failure condition resolved to `end`; the remainder of the list
    /// must not run
    Ended,
}

/// How a full resolution finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Every operation ran
    Completed,
    /// An `end` policy halted the list at the given operation index
    Ended { at: usize },
}

/// The patched document plus how the run finished
#[derive(Debug, Clone, PartialEq)]
pub struct PatchResolution {
    pub document: Value,
    pub outcome: ResolveOutcome,
}

// ============================================================================
// Configuration
// ============================================================================

/// The on-disk product configuration shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchObjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<SeedObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub operations: Vec<Operation>,
}

/// The seed document, carried as a JSON string inside the configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedObject {
    pub json_object: String,
}

// ============================================================================
// PatchObject
// ============================================================================

/// A seed document and the operation list to run against it
#[derive(Debug, Clone, PartialEq)]
pub struct PatchObject {
    document: Value,
    operations: Vec<Operation>,
}

impl PatchObject {
    pub fn new(document: Value, operations: Vec<Operation>) -> Self {
        Self {
            document,
            operations,
        }
    }

    /// Builds a patch run from a parsed configuration
    ///
    /// An absent seed starts from an empty document.
    pub fn from_config(config: PatchObjectConfig) -> Result<Self, PatchObjectError> {
        let document = match config.object {
            Some(seed) => {
                let parsed: Value = serde_json::from_str(&seed.json_object).map_err(|error| {
                    PatchObjectError::InvalidDefinition(format!(
                        "seed document is not valid JSON: {error}"
                    ))
                })?;
                if !parsed.is_object() {
                    return Err(PatchObjectError::InvalidDefinition(
                        "seed document must be a JSON object".to_string(),
                    ));
                }
                parsed
            }
            None => Value::Object(Map::new()),
        };
        Ok(Self::new(document, config.operations))
    }

    /// Parses the raw configuration JSON and builds the patch run
    pub fn from_json(raw: &str) -> Result<Self, PatchObjectError> {
        let config: PatchObjectConfig = serde_json::from_str(raw).map_err(|error| {
            PatchObjectError::InvalidDefinition(format!("invalid patch definition: {error}"))
        })?;
        Self::from_config(config)
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Runs every operation in list order against the document
    ///
    /// Returns the patched document and whether the run completed or was
    /// ended early by policy. A `raiseError` policy aborts the resolution
    /// with a structured error naming the failing operation.
    pub fn resolve(self) -> Result<PatchResolution, PatchObjectError> {
        let PatchObject {
            mut document,
            operations,
        } = self;

        for (index, operation) in operations.iter().enumerate() {
            match apply_operation(&mut document, operation) {
                Ok(OperationOutcome::Applied) => {}
                Ok(OperationOutcome::Skipped) => {
                    debug!(operation = %operation.kind(), index, "patch operation skipped by policy");
                }
                Ok(OperationOutcome::Ended) => {
                    debug!(operation = %operation.kind(), index, "patch resolution ended by policy");
                    return Ok(PatchResolution {
                        document,
                        outcome: ResolveOutcome::Ended { at: index },
                    });
                }
                Err(reason) => {
                    return Err(PatchObjectError::OperationFailed {
                        operation_index: index,
                        kind: operation.kind(),
                        reason,
                    });
                }
            }
        }

        Ok(PatchResolution {
            document,
            outcome: ResolveOutcome::Completed,
        })
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Applies one operation to the document
///
/// Pure apart from the document itself: no interpreter state survives the
/// call, so an operation list is just a left fold of this function.
pub fn apply_operation(
    document: &mut Value,
    operation: &Operation,
) -> Result<OperationOutcome, FailureReason> {
    match operation {
        Operation::Add(operation) => apply_add(document, operation),
        Operation::Copy(operation) => apply_copy(document, operation),
        Operation::Move(operation) => apply_move(document, operation),
        Operation::Remove(operation) => apply_remove(document, operation),
        Operation::Replace(operation) => apply_replace(document, operation),
    }
}

fn apply_add(
    document: &mut Value,
    operation: &AddOperation,
) -> Result<OperationOutcome, FailureReason> {
    let segments = path_segments(&operation.path);
    let incoming = resolve_value(&operation.value);

    let Some((key, parent_segments)) = segments.split_last() else {
        // The root always exists, so adding to it is the exists case
        return apply_exists(operation.when_property_already_exists, document, incoming);
    };

    let Some(parent) = object_at_mut(document, parent_segments) else {
        return on_failure(
            operation.when_parent_property_not_found,
            FailureReason::ParentPropertyNotFound,
        );
    };

    match parent.get_mut(*key) {
        Some(slot) => apply_exists(operation.when_property_already_exists, slot, incoming),
        None => {
            parent.insert((*key).to_string(), incoming);
            Ok(OperationOutcome::Applied)
        }
    }
}

fn apply_replace(
    document: &mut Value,
    operation: &ReplaceOperation,
) -> Result<OperationOutcome, FailureReason> {
    let segments = path_segments(&operation.path);
    let incoming = resolve_value(&operation.value);

    let Some((key, parent_segments)) = segments.split_last() else {
        // Replace at root installs only the new properties
        *document = incoming;
        return Ok(OperationOutcome::Applied);
    };

    let Some(parent) = object_at_mut(document, parent_segments) else {
        return on_failure(
            operation.when_parent_property_not_found,
            FailureReason::ParentPropertyNotFound,
        );
    };

    if parent.contains_key(*key) {
        parent.insert((*key).to_string(), incoming);
        return Ok(OperationOutcome::Applied);
    }

    match operation.when_property_not_found {
        Some(ReplaceMissingPolicy::Add) => {
            parent.insert((*key).to_string(), incoming);
            Ok(OperationOutcome::Applied)
        }
        Some(ReplaceMissingPolicy::Continue) => Ok(OperationOutcome::Skipped),
        Some(ReplaceMissingPolicy::End) => Ok(OperationOutcome::Ended),
        Some(ReplaceMissingPolicy::RaiseError) | None => Err(FailureReason::PropertyNotFound),
    }
}

fn apply_remove(
    document: &mut Value,
    operation: &RemoveOperation,
) -> Result<OperationOutcome, FailureReason> {
    let segments = path_segments(&operation.path);

    let Some((key, parent_segments)) = segments.split_last() else {
        // Remove at root clears every top-level property
        *document = Value::Object(Map::new());
        return Ok(OperationOutcome::Applied);
    };

    let removed = object_at_mut(document, parent_segments).and_then(|parent| parent.remove(*key));
    match removed {
        Some(_) => Ok(OperationOutcome::Applied),
        None => on_failure(
            operation.when_property_not_found,
            FailureReason::PropertyNotFound,
        ),
    }
}

fn apply_copy(
    document: &mut Value,
    operation: &CopyOperation,
) -> Result<OperationOutcome, FailureReason> {
    let source_segments = path_segments(&operation.from);
    let Some(source_value) = value_at(document, &source_segments).cloned() else {
        return on_failure(
            operation.when_source_property_not_found,
            FailureReason::SourcePropertyNotFound,
        );
    };

    let destination_segments = path_segments(&operation.to);
    let Some((key, parent_segments)) = destination_segments.split_last() else {
        // Copy to root merges, leaving the source key intact
        merge_into(document, &source_value);
        return Ok(OperationOutcome::Applied);
    };

    let Some(parent) = object_at_mut(document, parent_segments) else {
        return on_failure(
            operation.when_destination_parent_property_not_found,
            FailureReason::DestinationParentPropertyNotFound,
        );
    };

    if parent.contains_key(*key) {
        match operation.when_destination_property_already_exists {
            Some(ExistsPolicy::Replace) => {}
            Some(ExistsPolicy::Continue) => return Ok(OperationOutcome::Skipped),
            Some(ExistsPolicy::End) => return Ok(OperationOutcome::Ended),
            Some(ExistsPolicy::RaiseError) | None => {
                return Err(FailureReason::DestinationPropertyAlreadyExists);
            }
        }
    }

    parent.insert((*key).to_string(), source_value);
    Ok(OperationOutcome::Applied)
}

fn apply_move(
    document: &mut Value,
    operation: &MoveOperation,
) -> Result<OperationOutcome, FailureReason> {
    let source_segments = path_segments(&operation.from);
    let Some(source_value) = value_at(document, &source_segments).cloned() else {
        return on_failure(
            operation.when_source_property_not_found,
            FailureReason::SourcePropertyNotFound,
        );
    };

    let destination_segments = path_segments(&operation.to);
    let Some((key, parent_segments)) = destination_segments.split_last() else {
        // Replacing the whole document subsumes removing the source
        *document = source_value;
        return Ok(OperationOutcome::Applied);
    };

    {
        let Some(parent) = object_at_mut(document, parent_segments) else {
            return on_failure(
                operation.when_destination_parent_property_not_found,
                FailureReason::DestinationParentPropertyNotFound,
            );
        };

        if parent.contains_key(*key) {
            match operation.when_destination_property_already_exists {
                Some(ExistsPolicy::Replace) => {}
                Some(ExistsPolicy::Continue) => return Ok(OperationOutcome::Skipped),
                Some(ExistsPolicy::End) => return Ok(OperationOutcome::Ended),
                Some(ExistsPolicy::RaiseError) | None => {
                    return Err(FailureReason::DestinationPropertyAlreadyExists);
                }
            }
        }

        parent.insert((*key).to_string(), source_value);
    }

    remove_at(document, &source_segments);
    Ok(OperationOutcome::Applied)
}

/// Resolves the exists-conflict for Add
///
/// Without an explicit policy, two objects merge recursively and anything
/// else raises.
fn apply_exists(
    policy: Option<ExistsPolicy>,
    slot: &mut Value,
    incoming: Value,
) -> Result<OperationOutcome, FailureReason> {
    match policy {
        None => {
            if slot.is_object() && incoming.is_object() {
                merge_into(slot, &incoming);
                Ok(OperationOutcome::Applied)
            } else {
                Err(FailureReason::PropertyAlreadyExists)
            }
        }
        Some(ExistsPolicy::Replace) => {
            *slot = incoming;
            Ok(OperationOutcome::Applied)
        }
        Some(ExistsPolicy::RaiseError) => Err(FailureReason::PropertyAlreadyExists),
        Some(ExistsPolicy::Continue) => Ok(OperationOutcome::Skipped),
        Some(ExistsPolicy::End) => Ok(OperationOutcome::Ended),
    }
}

fn on_failure(
    policy: Option<FailurePolicy>,
    reason: FailureReason,
) -> Result<OperationOutcome, FailureReason> {
    match policy.unwrap_or_default() {
        FailurePolicy::RaiseError => Err(reason),
        FailurePolicy::Continue => Ok(OperationOutcome::Skipped),
        FailurePolicy::End => Ok(OperationOutcome::Ended),
    }
}

// ============================================================================
// Document helpers
// ============================================================================

/// Splits a path into property segments; `""` and `"/"` are the root
fn path_segments(path: &str) -> Vec<&str> {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn value_at<'a>(document: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = document;
    for segment in segments {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

/// Walks to the object the segments point at; `None` when any hop is
/// missing or not an object
fn object_at_mut<'a>(
    document: &'a mut Value,
    segments: &[&str],
) -> Option<&'a mut Map<String, Value>> {
    let mut current = document;
    for segment in segments {
        current = current.as_object_mut()?.get_mut(*segment)?;
    }
    current.as_object_mut()
}

fn remove_at(document: &mut Value, segments: &[&str]) -> Option<Value> {
    let (key, parent_segments) = segments.split_last()?;
    object_at_mut(document, parent_segments)?.remove(*key)
}

/// Recursively merges `incoming` into `target`
///
/// Incoming keys overwrite same-named keys; keys unique to either side are
/// preserved; object-valued keys on both sides merge one level deeper.
fn merge_into(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_map), Value::Object(incoming_map)) => {
            for (key, incoming_value) in incoming_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && incoming_value.is_object() => {
                        merge_into(existing, incoming_value);
                    }
                    _ => {
                        target_map.insert(key.clone(), incoming_value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

fn as_property_pair(value: &Value) -> Option<(&str, &Value)> {
    let pair = value.as_object()?;
    let name = pair.get("propertyName")?.as_str()?;
    let value = pair.get("value")?;
    Some((name, value))
}

/// Expands a structured object value, or passes a literal through
///
/// A non-empty array where every element is a `{propertyName, value}` pair
/// resolves to an object, recursively; anything else is the literal value.
fn resolve_value(raw: &Value) -> Value {
    if let Value::Array(items) = raw {
        if !items.is_empty() {
            if let Some(pairs) = items
                .iter()
                .map(as_property_pair)
                .collect::<Option<Vec<_>>>()
            {
                let mut object = Map::new();
                for (name, value) in pairs {
                    object.insert(name.to_string(), resolve_value(value));
                }
                return Value::Object(object);
            }
        }
    }
    raw.clone()
}
