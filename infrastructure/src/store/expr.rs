//! Aggregation expression evaluation.
//!
//! Supports field paths (`"$qty"`), `$$ROOT`, literals, nested objects and a
//! small operator set: `$add`, `$subtract`, `$multiply`, `$divide`,
//! `$concat`, `$ifNull`, `$literal`, `$toLower`, `$toUpper`.

use super::value::{lookup, number};
use nlq_application::StoreError;
use serde_json::{Map, Value};

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

/// Evaluate `expr` against one document. Missing fields evaluate to null.
pub(crate) fn evaluate(expr: &Value, doc: &Map<String, Value>) -> Result<Value, StoreError> {
    match expr {
        Value::String(s) if s == "$$ROOT" || s == "$$CURRENT" => Ok(Value::Object(doc.clone())),
        Value::String(s) if s.starts_with("$$") => {
            Err(StoreError::UnsupportedOperator(s.to_string()))
        }
        Value::String(s) if s.starts_with('$') => Ok(lookup(doc, &s[1..]).unwrap_or(Value::Null)),
        Value::Array(items) => items
            .iter()
            .map(|item| evaluate(item, doc))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => match single_operator(map) {
            Some((op, args)) => apply(op, args, doc),
            None => {
                let mut out = Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), evaluate(value, doc)?);
                }
                Ok(Value::Object(out))
            }
        },
        literal => Ok(literal.clone()),
    }
}

fn single_operator(map: &Map<String, Value>) -> Option<(&str, &Value)> {
    if map.len() != 1 {
        return None;
    }
    let (key, value) = map.iter().next()?;
    key.starts_with('$').then_some((key.as_str(), value))
}

/// Operator arguments as a list; a lone argument is a one-element list.
fn operands(args: &Value, doc: &Map<String, Value>) -> Result<Vec<Value>, StoreError> {
    match args {
        Value::Array(items) => items.iter().map(|item| evaluate(item, doc)).collect(),
        other => Ok(vec![evaluate(other, doc)?]),
    }
}

fn numbers(op: &str, values: &[Value]) -> Result<Option<Vec<f64>>, StoreError> {
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        match value {
            Value::Null => return Ok(None),
            Value::Number(n) => out.push(n.as_f64().unwrap_or(0.0)),
            other => return Err(invalid(format!("{} only supports numeric types, got {}", op, other))),
        }
    }
    Ok(Some(out))
}

fn exactly<const N: usize>(op: &str, values: Vec<Value>) -> Result<[Value; N], StoreError> {
    values
        .try_into()
        .map_err(|_| invalid(format!("{} expects exactly {} argument(s)", op, N)))
}

fn apply(op: &str, args: &Value, doc: &Map<String, Value>) -> Result<Value, StoreError> {
    match op {
        "$literal" => Ok(args.clone()),
        "$add" | "$multiply" => {
            let values = operands(args, doc)?;
            let Some(nums) = numbers(op, &values)? else {
                return Ok(Value::Null);
            };
            let result = if op == "$add" {
                nums.iter().sum()
            } else {
                nums.iter().product()
            };
            Ok(number(result))
        }
        "$subtract" | "$divide" => {
            let [a, b] = exactly::<2>(op, operands(args, doc)?)?;
            let Some(nums) = numbers(op, &[a, b])? else {
                return Ok(Value::Null);
            };
            if op == "$subtract" {
                Ok(number(nums[0] - nums[1]))
            } else if nums[1] == 0.0 {
                Err(invalid("can't $divide by zero"))
            } else {
                Ok(number(nums[0] / nums[1]))
            }
        }
        "$concat" => {
            let mut out = String::new();
            for value in operands(args, doc)? {
                match value {
                    Value::Null => return Ok(Value::Null),
                    Value::String(s) => out.push_str(&s),
                    other => return Err(invalid(format!("$concat only supports strings, got {}", other))),
                }
            }
            Ok(Value::String(out))
        }
        "$ifNull" => {
            let values = operands(args, doc)?;
            if values.len() < 2 {
                return Err(invalid("$ifNull expects at least 2 arguments"));
            }
            let fallback_index = values.len() - 1;
            Ok(values
                .iter()
                .take(fallback_index)
                .find(|v| !v.is_null())
                .unwrap_or(&values[fallback_index])
                .clone())
        }
        "$toLower" | "$toUpper" => {
            let [value] = exactly::<1>(op, operands(args, doc)?)?;
            let text = match value {
                Value::Null => String::new(),
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                other => return Err(invalid(format!("{} can't convert {}", op, other))),
            };
            Ok(Value::String(if op == "$toLower" {
                text.to_lowercase()
            } else {
                text.to_uppercase()
            }))
        }
        other => Err(StoreError::UnsupportedOperator(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> Map<String, Value> {
        json!({
            "name": "Soap",
            "qty": 4,
            "unit_price": 2.5,
            "supplier": {"name": "Acme"},
            "note": null
        })
        .as_object()
        .unwrap()
        .clone()
    }

    fn eval(expr: Value) -> Result<Value, StoreError> {
        evaluate(&expr, &item())
    }

    #[test]
    fn test_paths_and_literals() {
        assert_eq!(eval(json!("$qty")).unwrap(), json!(4));
        assert_eq!(eval(json!("$supplier.name")).unwrap(), json!("Acme"));
        assert_eq!(eval(json!("$missing")).unwrap(), Value::Null);
        assert_eq!(eval(json!("plain")).unwrap(), json!("plain"));
        assert_eq!(eval(json!({"$literal": "$qty"})).unwrap(), json!("$qty"));
        assert_eq!(
            eval(json!({"n": "$name", "fixed": 1})).unwrap(),
            json!({"n": "Soap", "fixed": 1})
        );
        assert_eq!(eval(json!("$$ROOT")).unwrap()["qty"], json!(4));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(
            eval(json!({"$multiply": ["$qty", "$unit_price"]})).unwrap(),
            json!(10)
        );
        assert_eq!(eval(json!({"$add": ["$qty", 1.5]})).unwrap(), json!(5.5));
        assert_eq!(eval(json!({"$subtract": ["$qty", 10]})).unwrap(), json!(-6));
        assert_eq!(eval(json!({"$divide": ["$qty", 8]})).unwrap(), json!(0.5));
        assert_eq!(eval(json!({"$add": ["$qty", "$missing"]})).unwrap(), Value::Null);
        assert!(eval(json!({"$divide": ["$qty", 0]})).is_err());
        assert!(eval(json!({"$add": ["$qty", "$name"]})).is_err());
        assert!(eval(json!({"$subtract": ["$qty"]})).is_err());
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            eval(json!({"$concat": ["$name", " by ", "$supplier.name"]})).unwrap(),
            json!("Soap by Acme")
        );
        assert_eq!(eval(json!({"$concat": ["$name", "$note"]})).unwrap(), Value::Null);
        assert_eq!(eval(json!({"$toUpper": "$name"})).unwrap(), json!("SOAP"));
        assert_eq!(eval(json!({"$toLower": ["$name"]})).unwrap(), json!("soap"));
        assert_eq!(
            eval(json!({"$ifNull": ["$note", "$missing", "n/a"]})).unwrap(),
            json!("n/a")
        );
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(
            eval(json!({"$function": {}})),
            Err(StoreError::UnsupportedOperator("$function".into()))
        );
        assert_eq!(
            eval(json!("$$NOW")),
            Err(StoreError::UnsupportedOperator("$$NOW".into()))
        );
    }
}
