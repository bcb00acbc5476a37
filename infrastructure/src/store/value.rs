//! Field paths, ordering and equality over JSON documents.
//!
//! Values order the way a document database orders mixed types:
//! null < numbers < strings < objects < arrays < booleans < dates.
//! Dates are extended-JSON objects (`{"$date": ...}`) compared as
//! millisecond timestamps.

use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Resolve a dotted path inside a value.
///
/// Arrays are traversed: `items.qty` over an array of objects yields the
/// array of their `qty` values. A numeric segment indexes into an array.
pub(crate) fn get_path(value: &Value, path: &str) -> Option<Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };

    match value {
        Value::Object(map) => {
            let child = map.get(head)?;
            match rest {
                Some(rest) => get_path(child, rest),
                None => Some(child.clone()),
            }
        }
        Value::Array(items) => {
            if let Ok(index) = head.parse::<usize>() {
                let child = items.get(index)?;
                return match rest {
                    Some(rest) => get_path(child, rest),
                    None => Some(child.clone()),
                };
            }
            let found: Vec<Value> = items
                .iter()
                .filter(|item| item.is_object())
                .filter_map(|item| get_path(item, path))
                .collect();
            if found.is_empty() {
                None
            } else {
                Some(Value::Array(found))
            }
        }
        _ => None,
    }
}

/// [`get_path`] starting from a document.
pub(crate) fn lookup(doc: &Map<String, Value>, path: &str) -> Option<Value> {
    match path.split_once('.') {
        Some((head, rest)) => get_path(doc.get(head)?, rest),
        None => doc.get(path).cloned(),
    }
}

/// Set a dotted path, creating intermediate objects as needed.
pub(crate) fn set_path(doc: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                set_path(child, rest, value);
            }
        }
    }
}

/// Remove a dotted path. Missing paths are ignored.
pub(crate) fn remove_path(doc: &mut Map<String, Value>, path: &str) {
    match path.split_once('.') {
        None => {
            doc.shift_remove(path);
        }
        Some((head, rest)) => {
            if let Some(Value::Object(child)) = doc.get_mut(head) {
                remove_path(child, rest);
            }
        }
    }
}

/// Milliseconds since the epoch for an extended-JSON date.
///
/// Accepts `{"$date": "<RFC 3339>"}`, `{"$date": "YYYY-MM-DD"}`,
/// `{"$date": <millis>}` and `{"$date": {"$numberLong": "<millis>"}}`.
pub(crate) fn date_millis(value: &Value) -> Option<i64> {
    let Value::Object(map) = value else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    match map.get("$date")? {
        Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
            .map(|d| d.timestamp_millis())
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()?
                    .and_hms_opt(0, 0, 0)
                    .map(|d| d.and_utc().timestamp_millis())
            }),
        Value::Number(n) => n.as_i64(),
        Value::Object(inner) => inner.get("$numberLong")?.as_str()?.parse().ok(),
        _ => None,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) if date_millis(value).is_some() => 9,
        Value::Object(_) => 4,
        Value::Array(_) => 5,
        Value::Bool(_) => 8,
    }
}

/// True when both values belong to the same ordering bracket.
pub(crate) fn same_type(a: &Value, b: &Value) -> bool {
    type_rank(a) == type_rank(b)
}

/// Total order across all JSON values.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    let (rank_a, rank_b) = (type_rank(a), type_rank(b));
    if rank_a != rank_b {
        return rank_a.cmp(&rank_b);
    }
    if let (Some(x), Some(y)) = (date_millis(a), date_millis(b)) {
        return x.cmp(&y);
    }

    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(a, b)| compare_values(a, b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Value::Object(x), Value::Object(y)) => x
            .iter()
            .zip(y.iter())
            .map(|((ka, va), (kb, vb))| ka.cmp(kb).then_with(|| compare_values(va, vb)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => Ordering::Equal,
    }
}

/// Equality with numeric widening (`1 == 1.0`) and date comparison.
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}

/// JSON number from an `f64`; whole values come back as integers.
pub(crate) fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }
}

/// Truthiness used by projection flags and `$exists`.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => true,
    }
}
