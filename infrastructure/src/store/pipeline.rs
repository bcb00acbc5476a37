//! Aggregation pipeline evaluation.

use super::cursor::{count_arg, project, sort_documents};
use super::expr::evaluate;
use super::matcher::matches;
use super::value::{compare_values, lookup, remove_path, set_path, values_equal};
use nlq_application::{Document, StoreError};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Read access to other collections, for `$lookup`.
pub(crate) trait CollectionSource {
    fn documents(&self, collection: &str) -> Option<&[Document]>;
}

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

fn object<'a>(stage: &str, body: &'a Value) -> Result<&'a Map<String, Value>, StoreError> {
    body.as_object()
        .ok_or_else(|| invalid(format!("{} expects an object", stage)))
}

/// Run `stages` in order over `docs`.
pub(crate) fn run_pipeline(
    mut docs: Vec<Document>,
    stages: &[Value],
    source: &dyn CollectionSource,
) -> Result<Vec<Document>, StoreError> {
    for (index, stage) in stages.iter().enumerate() {
        let map = stage
            .as_object()
            .filter(|m| m.len() == 1)
            .ok_or_else(|| invalid(format!("stage {} must be a single-key object", index)))?;
        let Some((name, body)) = map.iter().next() else {
            continue;
        };
        docs = run_stage(docs, name, body, source)?;
    }
    Ok(docs)
}

fn run_stage(
    docs: Vec<Document>,
    name: &str,
    body: &Value,
    source: &dyn CollectionSource,
) -> Result<Vec<Document>, StoreError> {
    match name {
        "$match" => {
            let filter = object(name, body)?;
            let mut out = Vec::with_capacity(docs.len());
            for doc in docs {
                if matches(&doc, filter)? {
                    out.push(doc);
                }
            }
            Ok(out)
        }
        "$project" => {
            let spec = object(name, body)?;
            if spec.is_empty() {
                return Err(invalid("$project requires at least one field"));
            }
            docs.iter().map(|doc| project(doc, spec)).collect()
        }
        "$addFields" | "$set" => {
            let spec = object(name, body)?;
            docs.into_iter()
                .map(|mut doc| {
                    for (field, expr) in spec {
                        let value = evaluate(expr, &doc)?;
                        set_path(&mut doc, field, value);
                    }
                    Ok(doc)
                })
                .collect()
        }
        "$unset" => {
            let fields: Vec<&str> = match body {
                Value::String(field) => vec![field.as_str()],
                Value::Array(items) => items
                    .iter()
                    .map(|v| v.as_str().ok_or_else(|| invalid("$unset expects field names")))
                    .collect::<Result<_, _>>()?,
                _ => return Err(invalid("$unset expects a field name or a list of them")),
            };
            Ok(docs
                .into_iter()
                .map(|mut doc| {
                    for field in &fields {
                        remove_path(&mut doc, field);
                    }
                    doc
                })
                .collect())
        }
        "$sort" => {
            let mut docs = docs;
            sort_documents(&mut docs, object(name, body)?)?;
            Ok(docs)
        }
        "$skip" => {
            let n = count_arg(name, body)?;
            Ok(docs.into_iter().skip(n).collect())
        }
        "$limit" => {
            let n = count_arg(name, body)?;
            if n == 0 {
                return Err(invalid("$limit must be positive"));
            }
            Ok(docs.into_iter().take(n).collect())
        }
        "$count" => {
            let field = body
                .as_str()
                .filter(|f| !f.is_empty() && !f.starts_with('$') && !f.contains('.'))
                .ok_or_else(|| invalid("$count expects a plain field name"))?;
            if docs.is_empty() {
                return Ok(docs);
            }
            let mut out = Map::new();
            out.insert(field.to_string(), Value::from(docs.len()));
            Ok(vec![out])
        }
        "$group" => group(docs, object(name, body)?),
        "$sortByCount" => {
            let mut spec = Map::new();
            spec.insert("_id".into(), body.clone());
            spec.insert("count".into(), serde_json::json!({"$sum": 1}));
            let mut grouped = group(docs, &spec)?;
            grouped.sort_by(|a, b| {
                compare_values(
                    b.get("count").unwrap_or(&Value::Null),
                    a.get("count").unwrap_or(&Value::Null),
                )
            });
            Ok(grouped)
        }
        "$lookup" => lookup_stage(docs, object(name, body)?, source),
        "$unwind" => unwind(docs, body),
        "$replaceRoot" => {
            let new_root = object(name, body)?
                .get("newRoot")
                .ok_or_else(|| invalid("$replaceRoot requires newRoot"))?;
            replace_root(docs, new_root)
        }
        "$replaceWith" => replace_root(docs, body),
        "$facet" => {
            let spec = object(name, body)?;
            let mut out = Map::new();
            for (field, sub) in spec {
                let sub_stages = sub
                    .as_array()
                    .ok_or_else(|| invalid("$facet entries must be pipelines"))?;
                let results = run_pipeline(docs.clone(), sub_stages, source)?;
                out.insert(
                    field.clone(),
                    Value::Array(results.into_iter().map(Value::Object).collect()),
                );
            }
            Ok(vec![out])
        }
        other => Err(StoreError::UnsupportedOperator(other.to_string())),
    }
}

fn replace_root(docs: Vec<Document>, expr: &Value) -> Result<Vec<Document>, StoreError> {
    docs.iter()
        .map(|doc| match evaluate(expr, doc)? {
            Value::Object(map) => Ok(map),
            other => Err(invalid(format!(
                "replacement document must be an object, got {}",
                other
            ))),
        })
        .collect()
}

fn unwind(docs: Vec<Document>, body: &Value) -> Result<Vec<Document>, StoreError> {
    let (path, preserve, index_field) = match body {
        Value::String(path) => (path.as_str(), false, None),
        Value::Object(options) => (
            options
                .get("path")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid("$unwind requires a path"))?,
            options
                .get("preserveNullAndEmptyArrays")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            options.get("includeArrayIndex").and_then(Value::as_str),
        ),
        _ => return Err(invalid("$unwind expects a path or an options object")),
    };
    let field = path
        .strip_prefix('$')
        .ok_or_else(|| invalid("$unwind path must start with '$'"))?;

    let mut out = Vec::new();
    for doc in docs {
        match lookup(&doc, field) {
            Some(Value::Array(items)) if !items.is_empty() => {
                for (i, item) in items.into_iter().enumerate() {
                    let mut copy = doc.clone();
                    set_path(&mut copy, field, item);
                    if let Some(index_field) = index_field {
                        set_path(&mut copy, index_field, Value::from(i));
                    }
                    out.push(copy);
                }
            }
            Some(Value::Array(_)) | Some(Value::Null) | None => {
                if preserve {
                    let mut copy = doc;
                    if let Some(index_field) = index_field {
                        set_path(&mut copy, index_field, Value::Null);
                    }
                    out.push(copy);
                }
            }
            Some(_) => out.push(doc),
        }
    }
    Ok(out)
}

fn lookup_stage(
    docs: Vec<Document>,
    spec: &Map<String, Value>,
    source: &dyn CollectionSource,
) -> Result<Vec<Document>, StoreError> {
    if spec.contains_key("pipeline") {
        return Err(StoreError::UnsupportedOperator(
            "$lookup with pipeline".to_string(),
        ));
    }
    let field = |name: &str| {
        spec.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| invalid(format!("$lookup requires '{}'", name)))
    };
    let from = field("from")?;
    let local_field = field("localField")?;
    let foreign_field = field("foreignField")?;
    let as_field = field("as")?;

    // an unknown foreign collection joins nothing
    let foreign = source.documents(from).unwrap_or(&[]);

    Ok(docs
        .into_iter()
        .map(|mut doc| {
            let local = lookup(&doc, local_field).unwrap_or(Value::Null);
            let keys: Vec<Value> = match local {
                Value::Array(items) => items,
                other => vec![other],
            };
            let joined: Vec<Value> = foreign
                .iter()
                .filter(|f| {
                    let value = lookup(f, foreign_field).unwrap_or(Value::Null);
                    keys.iter().any(|k| match &value {
                        Value::Array(items) => items.iter().any(|v| values_equal(v, k)),
                        v => values_equal(v, k),
                    })
                })
                .cloned()
                .map(Value::Object)
                .collect();
            set_path(&mut doc, as_field, Value::Array(joined));
            doc
        })
        .collect())
}

// ==================== $group ====================

enum Accumulator {
    Sum(f64, bool),
    Avg(f64, usize),
    Min(Option<Value>),
    Max(Option<Value>),
    First(Option<Value>),
    Last(Value),
    Push(Vec<Value>),
    AddToSet(Vec<Value>),
    Count(usize),
}

impl Accumulator {
    fn new(op: &str) -> Result<Self, StoreError> {
        Ok(match op {
            "$sum" => Accumulator::Sum(0.0, true),
            "$avg" => Accumulator::Avg(0.0, 0),
            "$min" => Accumulator::Min(None),
            "$max" => Accumulator::Max(None),
            "$first" => Accumulator::First(None),
            "$last" => Accumulator::Last(Value::Null),
            "$push" => Accumulator::Push(Vec::new()),
            "$addToSet" => Accumulator::AddToSet(Vec::new()),
            "$count" => Accumulator::Count(0),
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        })
    }

    fn add(&mut self, value: Value) {
        match self {
            Accumulator::Sum(total, integral) => {
                if let Value::Number(n) = &value {
                    *integral &= n.is_i64() || n.is_u64();
                    *total += n.as_f64().unwrap_or(0.0);
                }
            }
            Accumulator::Avg(total, count) => {
                if let Some(n) = value.as_f64() {
                    *total += n;
                    *count += 1;
                }
            }
            Accumulator::Min(current) => {
                if !value.is_null()
                    && current
                        .as_ref()
                        .is_none_or(|c| compare_values(&value, c) == Ordering::Less)
                {
                    *current = Some(value);
                }
            }
            Accumulator::Max(current) => {
                if !value.is_null()
                    && current
                        .as_ref()
                        .is_none_or(|c| compare_values(&value, c) == Ordering::Greater)
                {
                    *current = Some(value);
                }
            }
            Accumulator::First(current) => {
                if current.is_none() {
                    *current = Some(value);
                }
            }
            Accumulator::Last(current) => *current = value,
            Accumulator::Push(items) => items.push(value),
            Accumulator::AddToSet(items) => {
                if !items.iter().any(|v| values_equal(v, &value)) {
                    items.push(value);
                }
            }
            Accumulator::Count(n) => *n += 1,
        }
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Sum(total, true) => super::value::number(total),
            Accumulator::Sum(total, false) => serde_json::Number::from_f64(total)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Accumulator::Avg(_, 0) => Value::Null,
            Accumulator::Avg(total, count) => serde_json::Number::from_f64(total / count as f64)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Accumulator::Min(v) | Accumulator::Max(v) | Accumulator::First(v) => {
                v.unwrap_or(Value::Null)
            }
            Accumulator::Last(v) => v,
            Accumulator::Push(items) | Accumulator::AddToSet(items) => Value::Array(items),
            Accumulator::Count(n) => Value::from(n),
        }
    }
}

struct GroupField<'a> {
    name: &'a str,
    op: &'a str,
    expr: &'a Value,
}

fn group(docs: Vec<Document>, spec: &Map<String, Value>) -> Result<Vec<Document>, StoreError> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| invalid("$group requires an _id"))?;

    let mut fields = Vec::new();
    for (name, value) in spec {
        if name == "_id" {
            continue;
        }
        let (op, expr) = value
            .as_object()
            .filter(|m| m.len() == 1)
            .and_then(|m| m.iter().next())
            .ok_or_else(|| invalid(format!("$group field '{}' must be an accumulator", name)))?;
        Accumulator::new(op)?;
        fields.push(GroupField {
            name: name.as_str(),
            op: op.as_str(),
            expr,
        });
    }

    // groups keep first-seen order
    let mut groups: Vec<(Value, Vec<Accumulator>)> = Vec::new();
    for doc in &docs {
        let key = evaluate(id_expr, doc)?;
        let slot = match groups.iter().position(|(k, _)| values_equal(k, &key)) {
            Some(i) => i,
            None => {
                let accumulators = fields
                    .iter()
                    .map(|f| Accumulator::new(f.op))
                    .collect::<Result<Vec<_>, _>>()?;
                groups.push((key, accumulators));
                groups.len() - 1
            }
        };
        for (field, acc) in fields.iter().zip(groups[slot].1.iter_mut()) {
            let value = match field.op {
                "$count" => Value::Null,
                _ => evaluate(field.expr, doc)?,
            };
            acc.add(value);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accumulators)| {
            let mut out = Map::new();
            out.insert("_id".into(), key);
            for (field, acc) in fields.iter().zip(accumulators) {
                out.insert(field.name.to_string(), acc.finish());
            }
            out
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    struct Collections(HashMap<String, Vec<Document>>);

    impl CollectionSource for Collections {
        fn documents(&self, collection: &str) -> Option<&[Document]> {
            self.0.get(collection).map(Vec::as_slice)
        }
    }

    fn docs(values: Value) -> Vec<Document> {
        values
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    fn items() -> Vec<Document> {
        docs(json!([
            {"_id": "i1", "tenant_id": "t1", "transaction_id": "x1", "product_id": "p1", "qty": 2, "unit_price": 1.5},
            {"_id": "i2", "tenant_id": "t1", "transaction_id": "x1", "product_id": "p2", "qty": 1, "unit_price": 4},
            {"_id": "i3", "tenant_id": "t1", "transaction_id": "x2", "product_id": "p1", "qty": 5, "unit_price": 1.5},
            {"_id": "i4", "tenant_id": "t2", "transaction_id": "x9", "product_id": "p1", "qty": 7, "unit_price": 1.5}
        ]))
    }

    fn run(docs: Vec<Document>, stages: Value) -> Result<Vec<Value>, StoreError> {
        let source = Collections(HashMap::from([(
            "product".to_string(),
            self::docs(json!([
                {"_id": "p1", "tenant_id": "t1", "name": "Soap"},
                {"_id": "p2", "tenant_id": "t1", "name": "Tea"}
            ])),
        )]));
        run_pipeline(docs, stages.as_array().unwrap(), &source)
            .map(|out| out.into_iter().map(Value::Object).collect())
    }

    #[test]
    fn test_match_group_sort() {
        let out = run(
            items(),
            json!([
                {"$match": {"tenant_id": "t1"}},
                {"$group": {
                    "_id": "$product_id",
                    "units": {"$sum": "$qty"},
                    "lines": {"$sum": 1},
                    "revenue": {"$sum": {"$multiply": ["$qty", "$unit_price"]}},
                    "avg_qty": {"$avg": "$qty"},
                    "first_tx": {"$first": "$transaction_id"},
                    "txs": {"$addToSet": "$transaction_id"}
                }},
                {"$sort": {"units": -1}}
            ]),
        )
        .unwrap();

        assert_eq!(
            out,
            vec![
                json!({"_id": "p1", "units": 7, "lines": 2, "revenue": 10.5, "avg_qty": 3.5, "first_tx": "x1", "txs": ["x1", "x2"]}),
                json!({"_id": "p2", "units": 1, "lines": 1, "revenue": 4, "avg_qty": 1.0, "first_tx": "x1", "txs": ["x1"]}),
            ]
        );
    }

    #[test]
    fn test_group_null_id_and_min_max() {
        let out = run(
            items(),
            json!([{"$group": {"_id": null, "lo": {"$min": "$qty"}, "hi": {"$max": "$qty"}, "n": {"$count": {}}}}]),
        )
        .unwrap();
        assert_eq!(out, vec![json!({"_id": null, "lo": 1, "hi": 7, "n": 4})]);
    }

    #[test]
    fn test_lookup_and_unwind() {
        let out = run(
            items(),
            json!([
                {"$match": {"_id": "i2"}},
                {"$lookup": {"from": "product", "localField": "product_id", "foreignField": "_id", "as": "product"}},
                {"$unwind": "$product"},
                {"$project": {"_id": 0, "name": "$product.name", "qty": 1}}
            ]),
        )
        .unwrap();
        assert_eq!(out, vec![json!({"qty": 1, "name": "Tea"})]);
    }

    #[test]
    fn test_lookup_unknown_collection_joins_nothing() {
        let out = run(
            items(),
            json!([
                {"$limit": 1},
                {"$lookup": {"from": "ghost", "localField": "product_id", "foreignField": "_id", "as": "g"}}
            ]),
        )
        .unwrap();
        assert_eq!(out[0]["g"], json!([]));
    }

    #[test]
    fn test_unwind_options() {
        let input = docs(json!([
            {"_id": 1, "tags": ["a", "b"]},
            {"_id": 2, "tags": []},
            {"_id": 3}
        ]));
        let plain = run(input.clone(), json!([{"$unwind": "$tags"}])).unwrap();
        assert_eq!(plain.len(), 2);

        let kept = run(
            input,
            json!([{"$unwind": {"path": "$tags", "preserveNullAndEmptyArrays": true, "includeArrayIndex": "i"}}]),
        )
        .unwrap();
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[1], json!({"_id": 1, "tags": "b", "i": 1}));
        assert_eq!(kept[3], json!({"_id": 3, "i": null}));
    }

    #[test]
    fn test_count_skip_limit() {
        assert_eq!(
            run(items(), json!([{"$skip": 1}, {"$limit": 2}, {"$count": "n"}])).unwrap(),
            vec![json!({"n": 2})]
        );
        assert!(run(items(), json!([{"$match": {"qty": 100}}, {"$count": "n"}]))
            .unwrap()
            .is_empty());
        assert!(run(items(), json!([{"$limit": 0}])).is_err());
    }

    #[test]
    fn test_add_fields_unset_replace_root() {
        let out = run(
            items(),
            json!([
                {"$limit": 1},
                {"$set": {"total": {"$multiply": ["$qty", "$unit_price"]}, "meta.src": "pos"}},
                {"$unset": ["tenant_id", "unit_price"]},
                {"$replaceRoot": {"newRoot": {"id": "$_id", "total": "$total", "meta": "$meta"}}}
            ]),
        )
        .unwrap();
        assert_eq!(out, vec![json!({"id": "i1", "total": 3, "meta": {"src": "pos"}})]);
    }

    #[test]
    fn test_sort_by_count() {
        let out = run(items(), json!([{"$sortByCount": "$product_id"}])).unwrap();
        assert_eq!(out[0], json!({"_id": "p1", "count": 3}));
        assert_eq!(out[1], json!({"_id": "p2", "count": 1}));
    }

    #[test]
    fn test_facet() {
        let out = run(
            items(),
            json!([{"$facet": {
                "total": [{"$count": "n"}],
                "top": [{"$sort": {"qty": -1}}, {"$limit": 1}, {"$project": {"qty": 1}}]
            }}]),
        )
        .unwrap();
        assert_eq!(
            out,
            vec![json!({"total": [{"n": 4}], "top": [{"_id": "i4", "qty": 7}]})]
        );
    }

    #[test]
    fn test_unsupported_stages() {
        assert_eq!(
            run(items(), json!([{"$sample": {"size": 1}}])),
            Err(StoreError::UnsupportedOperator("$sample".into()))
        );
        assert_eq!(
            run(items(), json!([{"$group": {"_id": null, "x": {"$stdDevPop": "$qty"}}}])),
            Err(StoreError::UnsupportedOperator("$stdDevPop".into()))
        );
        assert!(matches!(
            run(items(), json!([{"$match": {}, "$limit": 1}])),
            Err(StoreError::InvalidQuery(_))
        ));
    }
}
