//! Query filter evaluation.

use super::value::{compare_values, date_millis, is_truthy, lookup, same_type, values_equal};
use nlq_application::StoreError;
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};
use std::cmp::Ordering;

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

/// Does `doc` satisfy `filter`? An empty filter matches everything.
pub(crate) fn matches(doc: &Map<String, Value>, filter: &Map<String, Value>) -> Result<bool, StoreError> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(key, condition)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in clauses(key, condition)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => return Err(StoreError::UnsupportedOperator(op.to_string())),
            field => field_matches(lookup(doc, field).as_ref(), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(op: &str, condition: &'a Value) -> Result<Vec<&'a Map<String, Value>>, StoreError> {
    let Value::Array(items) = condition else {
        return Err(invalid(format!("{} expects an array", op)));
    };
    if items.is_empty() {
        return Err(invalid(format!("{} expects a non-empty array", op)));
    }
    items
        .iter()
        .map(|item| {
            item.as_object()
                .ok_or_else(|| invalid(format!("{} entries must be objects", op)))
        })
        .collect()
}

/// `{"$gt": 1, "$lt": 5}` rather than a literal sub-document or date.
fn is_operator_object(map: &Map<String, Value>) -> bool {
    !map.is_empty()
        && map.keys().all(|k| k.starts_with('$'))
        && date_millis(&Value::Object(map.clone())).is_none()
}

fn field_matches(actual: Option<&Value>, condition: &Value) -> Result<bool, StoreError> {
    match condition {
        Value::Object(ops) if is_operator_object(ops) => {
            for (op, arg) in ops {
                if !apply_operator(actual, op, arg, ops)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(equals(actual, condition)),
    }
}

/// Equality match; an array field matches when any element does.
fn equals(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        None => expected.is_null(),
        Some(Value::Array(items)) => {
            values_equal(&Value::Array(items.clone()), expected)
                || items.iter().any(|item| values_equal(item, expected))
        }
        Some(value) => values_equal(value, expected),
    }
}

fn compare_any(actual: Option<&Value>, arg: &Value, accept: fn(Ordering) -> bool) -> bool {
    let check = |value: &Value| same_type(value, arg) && accept(compare_values(value, arg));
    match actual {
        None => false,
        Some(Value::Array(items)) => items.iter().any(check),
        Some(value) => check(value),
    }
}

fn string_any(actual: Option<&Value>, pattern: &Regex) -> bool {
    match actual {
        Some(Value::String(s)) => pattern.is_match(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .any(|s| pattern.is_match(s)),
        _ => false,
    }
}

fn build_regex(pattern: &Value, options: &str) -> Result<Regex, StoreError> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| invalid("$regex expects a string"))?;
    if let Some(bad) = options.chars().find(|c| !"imsx".contains(*c)) {
        return Err(invalid(format!("unsupported $options flag '{}'", bad)));
    }
    RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .dot_matches_new_line(options.contains('s'))
        .ignore_whitespace(options.contains('x'))
        .build()
        .map_err(|e| invalid(format!("invalid $regex: {}", e)))
}

fn candidates<'a>(op: &str, arg: &'a Value) -> Result<&'a Vec<Value>, StoreError> {
    arg.as_array()
        .ok_or_else(|| invalid(format!("{} expects an array", op)))
}

fn apply_operator(
    actual: Option<&Value>,
    op: &str,
    arg: &Value,
    siblings: &Map<String, Value>,
) -> Result<bool, StoreError> {
    let ok = match op {
        "$eq" => equals(actual, arg),
        "$ne" => !equals(actual, arg),
        "$gt" => compare_any(actual, arg, Ordering::is_gt),
        "$gte" => compare_any(actual, arg, Ordering::is_ge),
        "$lt" => compare_any(actual, arg, Ordering::is_lt),
        "$lte" => compare_any(actual, arg, Ordering::is_le),
        "$in" => candidates(op, arg)?.iter().any(|c| equals(actual, c)),
        "$nin" => !candidates(op, arg)?.iter().any(|c| equals(actual, c)),
        "$all" => {
            let wanted = candidates(op, arg)?;
            matches!(actual, Some(Value::Array(_))) && wanted.iter().all(|c| equals(actual, c))
        }
        "$size" => {
            let n = arg
                .as_u64()
                .ok_or_else(|| invalid("$size expects a non-negative integer"))?;
            matches!(actual, Some(Value::Array(items)) if items.len() as u64 == n)
        }
        "$exists" => actual.is_some() == is_truthy(arg),
        "$regex" => {
            let options = siblings
                .get("$options")
                .and_then(Value::as_str)
                .unwrap_or("");
            string_any(actual, &build_regex(arg, options)?)
        }
        "$options" => {
            if !siblings.contains_key("$regex") {
                return Err(invalid("$options requires $regex"));
            }
            true
        }
        "$not" => match arg {
            Value::Object(inner) if is_operator_object(inner) => !field_matches(actual, arg)?,
            _ => return Err(invalid("$not expects an operator expression")),
        },
        other => return Err(StoreError::UnsupportedOperator(other.to_string())),
    };
    Ok(ok)
}
