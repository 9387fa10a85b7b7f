//! JSON merge patch (RFC 7396)
//!
//! The document-store backend merges metadata updates in memory with
//! [`merge_patch`]; SQLite's `json_patch` applies the same algorithm in the
//! relational backend, so both stores end up with identical sidecars.

use serde_json::{Map, Value};

/// Applies `patch` to `target` in place
///
/// Object members are merged recursively, a `null` member removes the key,
/// and any non-object patch replaces the target outright.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_members) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(target_members) = target else {
        return;
    };

    for (key, value) in patch_members {
        if value.is_null() {
            target_members.remove(key);
        } else {
            merge_patch(
                target_members.entry(key.clone()).or_insert(Value::Null),
                value,
            );
        }
    }
}
