//! Tenant isolation enforcement.
//!
//! The only way to obtain a [`SafeQuery`] is through
//! [`TenantIsolationEnforcer::enforce`], and executors only accept
//! [`SafeQuery`]. Whatever the model wrote for the tenant field (absent,
//! forged, an operator expression, a different type) is replaced by the
//! caller's tenant:
//!
//! - find: `filter[tenant_field] = tenant`
//! - aggregate: stage zero is a `$match` with `[tenant_field] = tenant`,
//!   inserted when stage zero is not a `$match`. Later stages are untouched;
//!   stages run in order, so they only ever see tenant-scoped input.
//!
//! Other conditions in the same mapping are ANDed by the store, so a forged
//! tenant nested under `$or`/`$and` cannot widen the result.

use super::shape::{FilterQuery, PipelineQuery, PipelineStage, QueryShape, StageOperator};
use crate::catalog::TENANT_FIELD;
use crate::core::error::QueryError;
use crate::core::tenant::TenantId;
use serde_json::{Map, Value};

/// A query whose tenant constraint has been enforced.
#[derive(Debug, Clone, PartialEq)]
pub struct SafeQuery {
    shape: QueryShape,
    tenant: TenantId,
    tenant_field: String,
}

impl SafeQuery {
    pub fn shape(&self) -> &QueryShape {
        &self.shape
    }

    pub fn collection(&self) -> &str {
        self.shape.collection()
    }

    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }

    pub fn tenant_field(&self) -> &str {
        &self.tenant_field
    }

    /// Release the inner shape, e.g. to enforce again for another purpose.
    pub fn into_shape(self) -> QueryShape {
        self.shape
    }

    /// The value bound to the tenant field at the point where the query first
    /// restricts its input: the filter of a find, or the stage-zero match of
    /// an aggregation.
    pub fn tenant_constraint(&self) -> Option<&Value> {
        match &self.shape {
            QueryShape::Filter(q) => q.filter.get(&self.tenant_field),
            QueryShape::Pipeline(q) => match q.stages.first() {
                Some(PipelineStage::Match(cond)) => cond.get(&self.tenant_field),
                _ => None,
            },
        }
    }

    pub fn to_value(&self) -> Value {
        self.shape.to_value()
    }

    /// Fails with [`QueryError::UnsupportedStage`] when the pipeline uses
    /// `operator`, including inside `$facet` sub-pipelines.
    pub fn reject_operator(&self, operator: StageOperator) -> Result<(), QueryError> {
        let QueryShape::Pipeline(query) = &self.shape else {
            return Ok(());
        };
        let name = operator.as_str();
        let found = query.stages.iter().position(|stage| match stage {
            PipelineStage::Match(_) => false,
            PipelineStage::Other { operator: op, body } => {
                *op == operator || (*op == StageOperator::Facet && mentions_key(body, name))
            }
        });
        match found {
            Some(index) => Err(QueryError::unsupported_stage(
                index,
                format!("{} is disabled", name),
            )),
            None => Ok(()),
        }
    }
}

fn mentions_key(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(k, v)| k == key || mentions_key(v, key)),
        Value::Array(items) => items.iter().any(|v| mentions_key(v, key)),
        _ => false,
    }
}

/// Rewrites queries so they are scoped to exactly one tenant.
#[derive(Debug, Clone)]
pub struct TenantIsolationEnforcer {
    tenant_field: String,
}

impl Default for TenantIsolationEnforcer {
    fn default() -> Self {
        Self::new(TENANT_FIELD)
    }
}

impl TenantIsolationEnforcer {
    pub fn new(tenant_field: impl Into<String>) -> Self {
        Self {
            tenant_field: tenant_field.into(),
        }
    }

    pub fn tenant_field(&self) -> &str {
        &self.tenant_field
    }

    /// Scope `query` to `tenant`, overwriting (never merging) any tenant
    /// value the query already carried.
    pub fn enforce(&self, query: QueryShape, tenant: &TenantId) -> SafeQuery {
        let shape = match query {
            QueryShape::Filter(q) => QueryShape::Filter(self.enforce_filter(q, tenant)),
            QueryShape::Pipeline(q) => QueryShape::Pipeline(self.enforce_pipeline(q, tenant)),
        };
        SafeQuery {
            shape,
            tenant: tenant.clone(),
            tenant_field: self.tenant_field.clone(),
        }
    }

    fn enforce_filter(&self, mut query: FilterQuery, tenant: &TenantId) -> FilterQuery {
        self.bind_tenant(&mut query.filter, tenant);
        query
    }

    fn enforce_pipeline(&self, mut query: PipelineQuery, tenant: &TenantId) -> PipelineQuery {
        match query.stages.first_mut() {
            Some(PipelineStage::Match(cond)) => self.bind_tenant(cond, tenant),
            _ => {
                let mut cond = Map::new();
                self.bind_tenant(&mut cond, tenant);
                query.stages.insert(0, PipelineStage::Match(cond));
            }
        }
        query
    }

    fn bind_tenant(&self, cond: &mut Map<String, Value>, tenant: &TenantId) {
        // insert replaces the value of an existing key in place
        cond.insert(
            self.tenant_field.clone(),
            Value::String(tenant.as_str().to_string()),
        );
    }
}
