//! Sorting, projection and paging shared by `find` and aggregation.

use super::expr::evaluate;
use super::value::{compare_values, is_truthy, lookup, remove_path, set_path};
use nlq_application::{Document, StoreError};
use serde_json::{Map, Value};
use std::cmp::Ordering;

const ID: &str = "_id";

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

/// Stable multi-key sort. Directions are `1` / `-1`; missing fields sort as null.
pub(crate) fn sort_documents(docs: &mut [Document], spec: &Map<String, Value>) -> Result<(), StoreError> {
    let mut keys = Vec::with_capacity(spec.len());
    for (field, direction) in spec {
        let descending = match direction.as_i64() {
            Some(1) => false,
            Some(-1) => true,
            _ => return Err(invalid(format!("sort direction for '{}' must be 1 or -1", field))),
        };
        keys.push((field.as_str(), descending));
    }

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let left = lookup(a, field).unwrap_or(Value::Null);
            let right = lookup(b, field).unwrap_or(Value::Null);
            let order = compare_values(&left, &right);
            let order = if *descending { order.reverse() } else { order };
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    });
    Ok(())
}

/// `Some(flag)` for `0/1/true/false`, `None` for a computed field.
fn projection_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(_) | Value::Number(_) => Some(is_truthy(value)),
        _ => None,
    }
}

/// Apply an inclusion or exclusion projection.
///
/// `_id` is kept unless excluded explicitly. Inclusion projections may also
/// compute fields from expressions. Mixing inclusion and exclusion is an error.
pub(crate) fn project(doc: &Document, spec: &Map<String, Value>) -> Result<Document, StoreError> {
    let mut include_id = true;
    let mut inclusions = Vec::new();
    let mut exclusions = Vec::new();

    for (field, value) in spec {
        match (field.as_str(), projection_flag(value)) {
            (ID, Some(flag)) => include_id = flag,
            (_, Some(true)) | (_, None) => inclusions.push((field.as_str(), value)),
            (_, Some(false)) => exclusions.push(field.as_str()),
        }
    }

    if !inclusions.is_empty() && !exclusions.is_empty() {
        return Err(invalid(
            "cannot mix inclusion and exclusion in a projection",
        ));
    }

    if inclusions.is_empty() {
        let mut out = doc.clone();
        for field in exclusions {
            remove_path(&mut out, field);
        }
        if !include_id {
            out.shift_remove(ID);
        }
        return Ok(out);
    }

    let mut out = Map::new();
    if include_id && let Some(id) = doc.get(ID) {
        out.insert(ID.to_string(), id.clone());
    }
    for (field, value) in inclusions {
        match projection_flag(value) {
            Some(_) => {
                if let Some(found) = lookup(doc, field) {
                    set_path(&mut out, field, found);
                }
            }
            None => set_path(&mut out, field, evaluate(value, doc)?),
        }
    }
    Ok(out)
}

/// Non-negative integer argument of `$skip`/`$limit`/`limit`/`skip`.
pub(crate) fn count_arg(name: &str, value: &Value) -> Result<usize, StoreError> {
    value
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| invalid(format!("{} must be a non-negative integer", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(values: Value) -> Vec<Document> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn spec(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn test_multi_key_sort() {
        let mut items = docs(json!([
            {"_id": 1, "cat": "b", "qty": 5},
            {"_id": 2, "cat": "a", "qty": 1},
            {"_id": 3, "cat": "b", "qty": 9},
            {"_id": 4, "qty": 0}
        ]));
        sort_documents(&mut items, &spec(json!({"cat": 1, "qty": -1}))).unwrap();
        let ids: Vec<_> = items.iter().map(|d| d["_id"].clone()).collect();
        assert_eq!(ids, vec![json!(4), json!(2), json!(3), json!(1)]);
    }

    #[test]
    fn test_sort_rejects_bad_direction() {
        let mut items = docs(json!([{"a": 1}]));
        assert!(sort_documents(&mut items, &spec(json!({"a": "asc"}))).is_err());
    }

    #[test]
    fn test_inclusion_projection() {
        let doc = spec(json!({"_id": "p1", "name": "Soap", "qty": 4, "meta": {"a": 1, "b": 2}}));
        let out = project(&doc, &spec(json!({"name": 1, "meta.b": true}))).unwrap();
        assert_eq!(
            Value::Object(out),
            json!({"_id": "p1", "name": "Soap", "meta": {"b": 2}})
        );

        let out = project(&doc, &spec(json!({"_id": 0, "name": 1}))).unwrap();
        assert_eq!(Value::Object(out), json!({"name": "Soap"}));
    }

    #[test]
    fn test_computed_projection() {
        let doc = spec(json!({"_id": "p1", "qty": 4, "price": 2}));
        let out = project(&doc, &spec(json!({"value": {"$multiply": ["$qty", "$price"]}}))).unwrap();
        assert_eq!(Value::Object(out), json!({"_id": "p1", "value": 8}));
    }

    #[test]
    fn test_exclusion_projection() {
        let doc = spec(json!({"_id": "u1", "username": "ann", "password": "x"}));
        let out = project(&doc, &spec(json!({"password": 0}))).unwrap();
        assert_eq!(Value::Object(out), json!({"_id": "u1", "username": "ann"}));

        let out = project(&doc, &spec(json!({"_id": 0}))).unwrap();
        assert_eq!(Value::Object(out), json!({"username": "ann", "password": "x"}));
    }

    #[test]
    fn test_mixed_projection_is_error() {
        let doc = spec(json!({"a": 1, "b": 2}));
        assert!(project(&doc, &spec(json!({"a": 1, "b": 0}))).is_err());
    }
}
