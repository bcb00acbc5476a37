//! Query shape classification.
//!
//! Turns a loosely-typed [`QueryDocument`] into one of two explicit shapes,
//! [`FilterQuery`] or [`PipelineQuery`], so that tenant enforcement has a
//! single typed choke point instead of scattered field lookups.

use super::document::QueryDocument;
use crate::core::error::QueryError;
use serde_json::{Map, Value};

const COLLECTION: &str = "collection";
const FILTER: &str = "filter";
const PROJECTION: &str = "projection";
const SORT: &str = "sort";
const LIMIT: &str = "limit";
const SKIP: &str = "skip";
const PIPELINE: &str = "pipeline";

/// Keys that are never folded into an implicit filter.
const RESERVED_KEYS: [&str; 6] = [COLLECTION, PROJECTION, SORT, LIMIT, SKIP, PIPELINE];

/// Name of the match stage operator.
pub const MATCH_STAGE: &str = "$match";

/// A find request: filter plus optional projection, sort and pagination.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub collection: String,
    pub filter: Map<String, Value>,
    pub projection: Option<Map<String, Value>>,
    pub sort: Option<Map<String, Value>>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

impl FilterQuery {
    pub fn new(collection: impl Into<String>, filter: Map<String, Value>) -> Self {
        Self {
            collection: collection.into(),
            filter,
            projection: None,
            sort: None,
            limit: None,
            skip: None,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(COLLECTION.into(), Value::String(self.collection.clone()));
        out.insert(FILTER.into(), Value::Object(self.filter.clone()));
        if let Some(projection) = &self.projection {
            out.insert(PROJECTION.into(), Value::Object(projection.clone()));
        }
        if let Some(sort) = &self.sort {
            out.insert(SORT.into(), Value::Object(sort.clone()));
        }
        if let Some(limit) = self.limit {
            out.insert(LIMIT.into(), Value::from(limit));
        }
        if let Some(skip) = self.skip {
            out.insert(SKIP.into(), Value::from(skip));
        }
        Value::Object(out)
    }
}

/// Read-only stage operators a pipeline may use after classification.
///
/// `$match` is not listed: match stages get their own [`PipelineStage`]
/// variant so the enforcer can find them without string comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOperator {
    Project,
    AddFields,
    Set,
    Unset,
    Group,
    Sort,
    Limit,
    Skip,
    /// Joins another collection. The foreign side is read without a tenant
    /// filter; callers that cannot accept that refuse it with
    /// [`SafeQuery::reject_operator`](crate::query::SafeQuery::reject_operator).
    Lookup,
    Unwind,
    Count,
    SortByCount,
    ReplaceRoot,
    ReplaceWith,
    Facet,
    Bucket,
    BucketAuto,
    Sample,
}

impl StageOperator {
    const ALL: [StageOperator; 18] = [
        StageOperator::Project,
        StageOperator::AddFields,
        StageOperator::Set,
        StageOperator::Unset,
        StageOperator::Group,
        StageOperator::Sort,
        StageOperator::Limit,
        StageOperator::Skip,
        StageOperator::Lookup,
        StageOperator::Unwind,
        StageOperator::Count,
        StageOperator::SortByCount,
        StageOperator::ReplaceRoot,
        StageOperator::ReplaceWith,
        StageOperator::Facet,
        StageOperator::Bucket,
        StageOperator::BucketAuto,
        StageOperator::Sample,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageOperator::Project => "$project",
            StageOperator::AddFields => "$addFields",
            StageOperator::Set => "$set",
            StageOperator::Unset => "$unset",
            StageOperator::Group => "$group",
            StageOperator::Sort => "$sort",
            StageOperator::Limit => "$limit",
            StageOperator::Skip => "$skip",
            StageOperator::Lookup => "$lookup",
            StageOperator::Unwind => "$unwind",
            StageOperator::Count => "$count",
            StageOperator::SortByCount => "$sortByCount",
            StageOperator::ReplaceRoot => "$replaceRoot",
            StageOperator::ReplaceWith => "$replaceWith",
            StageOperator::Facet => "$facet",
            StageOperator::Bucket => "$bucket",
            StageOperator::BucketAuto => "$bucketAuto",
            StageOperator::Sample => "$sample",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_str() == name)
    }
}

/// Stage operators that are recognized but refused: they write data, read
/// other collections without scoping, or must run before any `$match`.
const REFUSED_STAGES: [&str; 11] = [
    "$out",
    "$merge",
    "$unionWith",
    "$geoNear",
    "$search",
    "$searchMeta",
    "$collStats",
    "$indexStats",
    "$currentOp",
    "$listSessions",
    "$documents",
];

/// One classified pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// `{"$match": {...}}`; an absent/null condition is an empty mapping.
    Match(Map<String, Value>),
    /// Any other allow-listed stage, passed to the store untouched.
    Other { operator: StageOperator, body: Value },
}

impl PipelineStage {
    pub fn is_match(&self) -> bool {
        matches!(self, PipelineStage::Match(_))
    }

    pub fn operator_name(&self) -> &'static str {
        match self {
            PipelineStage::Match(_) => MATCH_STAGE,
            PipelineStage::Other { operator, .. } => operator.as_str(),
        }
    }

    pub fn to_value(&self) -> Value {
        let body = match self {
            PipelineStage::Match(cond) => Value::Object(cond.clone()),
            PipelineStage::Other { body, .. } => body.clone(),
        };
        let mut stage = Map::new();
        stage.insert(self.operator_name().to_string(), body);
        Value::Object(stage)
    }

    /// Classify one raw pipeline element.
    ///
    /// Stages given as JSON strings are parsed first. Everything that is not a
    /// single-key object naming an allow-listed operator is refused.
    pub fn classify(index: usize, raw: &Value) -> Result<Self, QueryError> {
        let parsed;
        let stage = match raw {
            Value::Object(map) => map,
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                    QueryError::unsupported_stage(index, format!("string stage is not JSON: {}", e))
                })?;
                match &parsed {
                    Value::Object(map) => map,
                    _ => {
                        return Err(QueryError::unsupported_stage(
                            index,
                            "string stage is not a JSON object",
                        ));
                    }
                }
            }
            other => {
                return Err(QueryError::unsupported_stage(
                    index,
                    format!("stage must be an object, found {}", type_name(other)),
                ));
            }
        };

        let mut entries = stage.iter();
        let (name, body) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            (None, _) => return Err(QueryError::unsupported_stage(index, "stage is empty")),
            (Some(_), Some(_)) => {
                return Err(QueryError::unsupported_stage(
                    index,
                    format!("stage must have exactly one operator, found {}", stage.len()),
                ));
            }
        };

        if name == MATCH_STAGE {
            return match body {
                Value::Object(cond) => Ok(PipelineStage::Match(cond.clone())),
                Value::Null => Ok(PipelineStage::Match(Map::new())),
                other => Err(QueryError::unsupported_stage(
                    index,
                    format!("$match condition must be an object, found {}", type_name(other)),
                )),
            };
        }

        if REFUSED_STAGES.contains(&name.as_str()) {
            return Err(QueryError::unsupported_stage(
                index,
                format!("stage '{}' is not permitted", name),
            ));
        }

        match StageOperator::from_name(name) {
            Some(operator) => Ok(PipelineStage::Other {
                operator,
                body: body.clone(),
            }),
            None => Err(QueryError::unsupported_stage(
                index,
                format!("unrecognized stage operator '{}'", name),
            )),
        }
    }
}

/// An aggregation request: ordered stages against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineQuery {
    pub collection: String,
    pub stages: Vec<PipelineStage>,
}

impl PipelineQuery {
    pub fn new(collection: impl Into<String>, stages: Vec<PipelineStage>) -> Self {
        Self {
            collection: collection.into(),
            stages,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert(COLLECTION.into(), Value::String(self.collection.clone()));
        out.insert(
            PIPELINE.into(),
            Value::Array(self.stages.iter().map(PipelineStage::to_value).collect()),
        );
        Value::Object(out)
    }
}

/// The two query shapes the model may produce.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryShape {
    Filter(FilterQuery),
    Pipeline(PipelineQuery),
}

impl QueryShape {
    pub fn collection(&self) -> &str {
        match self {
            QueryShape::Filter(q) => &q.collection,
            QueryShape::Pipeline(q) => &q.collection,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            QueryShape::Filter(_) => "find",
            QueryShape::Pipeline(_) => "aggregate",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            QueryShape::Filter(q) => q.to_value(),
            QueryShape::Pipeline(q) => q.to_value(),
        }
    }
}

/// Classify a parsed document as a filter query or a pipeline query.
///
/// A non-empty `pipeline` array makes a [`PipelineQuery`]; anything else is a
/// [`FilterQuery`]. Without a `filter` key, the non-reserved top-level keys
/// become the filter.
pub fn classify(doc: QueryDocument) -> Result<QueryShape, QueryError> {
    let collection = match doc.get(COLLECTION) {
        Some(Value::String(name)) if !name.trim().is_empty() => name.trim().to_string(),
        _ => return Err(QueryError::MissingCollection),
    };

    match doc.get(PIPELINE) {
        None | Some(Value::Null) => {}
        Some(Value::Array(stages)) if stages.is_empty() => {}
        Some(Value::Array(stages)) => {
            let stages = stages
                .iter()
                .enumerate()
                .map(|(i, raw)| PipelineStage::classify(i, raw))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(QueryShape::Pipeline(PipelineQuery::new(collection, stages)));
        }
        Some(other) => {
            return Err(QueryError::invalid_part(
                "pipeline",
                format!("expected an array, found {}", type_name(other)),
            ));
        }
    }

    let filter = match doc.get(FILTER) {
        Some(Value::Object(filter)) => filter.clone(),
        None | Some(Value::Null) => doc
            .as_map()
            .iter()
            .filter(|(key, _)| key.as_str() != FILTER && !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        Some(other) => {
            return Err(QueryError::invalid_part(
                "filter",
                format!("expected an object, found {}", type_name(other)),
            ));
        }
    };

    Ok(QueryShape::Filter(FilterQuery {
        collection,
        filter,
        projection: optional_object(&doc, PROJECTION, "projection")?,
        sort: optional_object(&doc, SORT, "sort")?,
        limit: optional_count(&doc, LIMIT, "limit")?,
        skip: optional_count(&doc, SKIP, "skip")?,
    }))
}

fn optional_object(
    doc: &QueryDocument,
    key: &str,
    part: &'static str,
) -> Result<Option<Map<String, Value>>, QueryError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(other) => Err(QueryError::invalid_part(
            part,
            format!("expected an object, found {}", type_name(other)),
        )),
    }
}

fn optional_count(
    doc: &QueryDocument,
    key: &str,
    part: &'static str,
) -> Result<Option<u64>, QueryError> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(count) = n.as_u64() {
                return Ok(Some(count));
            }
            // Models sometimes write 10.0
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
                    Ok(Some(f as u64))
                }
                _ => Err(QueryError::invalid_part(
                    part,
                    format!("expected a non-negative integer, found {}", n),
                )),
            }
        }
        Some(other) => Err(QueryError::invalid_part(
            part,
            format!("expected a non-negative integer, found {}", type_name(other)),
        )),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
