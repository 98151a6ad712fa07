//! Payload patching
//!
//! Overlays a user-supplied patch document onto a base payload before it is
//! submitted. The rules:
//! - patch values win whenever both documents set a key
//! - base values fill every key the patch leaves missing or `null`, at any depth
//! - nested objects are merged key by key
//! - arrays and scalars are replaced wholesale, never merged element-wise
//! - keys that only exist in the patch pass through untouched
//!
//! When the base holds an object and the patch holds a non-null scalar or
//! array under the same key, the patch value is kept as is.
//!
//! Everything here is pure: no I/O, no logging, no shared state.

use crate::errors::{Document, PatchError};
use serde_json::{Map, Value};

/// Merge `patch` into `base` and return the combined document as compact JSON.
///
/// Both inputs must be JSON texts whose top-level value is an object.
pub fn patch_json(base: &str, patch: &str) -> Result<String, PatchError> {
    patch_document(base, patch).map(|merged| merged.to_string())
}

/// Like [`patch_json`], but returns the merged tree instead of its text.
pub fn patch_document(base: &str, patch: &str) -> Result<Value, PatchError> {
    let base = parse_root(base, Document::Base)?;
    let patch = parse_root(patch, Document::Patch)?;
    Ok(Value::Object(merge_objects(&base, patch)))
}

/// Merge two already parsed documents. Both roots must be objects.
pub fn merge_documents(base: &Value, patch: &Value) -> Result<Value, PatchError> {
    let base = expect_object(base, Document::Base)?;
    let patch = expect_object(patch, Document::Patch)?;
    Ok(Value::Object(merge_objects(base, patch.clone())))
}

/// Reconcile one base value with the value the patch holds for the same key.
///
/// `None` means the patch does not mention the key; an explicit `null` is
/// treated the same way.
pub fn merge_values(base: &Value, patch: Option<Value>) -> Value {
    match patch {
        None | Some(Value::Null) => base.clone(),
        Some(patch) if patch == *base => patch,
        Some(Value::Object(patch_map)) => match base {
            Value::Object(base_map) => Value::Object(merge_objects(base_map, patch_map)),
            _ => Value::Object(patch_map),
        },
        Some(patch) => patch,
    }
}

fn merge_objects(base: &Map<String, Value>, mut patch: Map<String, Value>) -> Map<String, Value> {
    for (key, base_value) in base {
        match patch.get_mut(key) {
            Some(slot) => {
                let current = slot.take();
                *slot = merge_values(base_value, Some(current));
            }
            None => {
                patch.insert(key.clone(), base_value.clone());
            }
        }
    }
    patch
}

fn parse_root(text: &str, document: Document) -> Result<Map<String, Value>, PatchError> {
    let value: Value =
        serde_json::from_str(text).map_err(|source| PatchError::Parse { document, source })?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(PatchError::Shape {
            document,
            found: json_kind(&other),
        }),
    }
}

fn expect_object(value: &Value, document: Document) -> Result<&Map<String, Value>, PatchError> {
    value.as_object().ok_or(PatchError::Shape {
        document,
        found: json_kind(value),
    })
}

/// Name of the JSON type of `value`, for error messages.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
