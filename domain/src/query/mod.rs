//! Query translation pipeline (pure logic).
//!
//! raw text → [`parse_query_document`] → [`QueryDocument`] → [`classify`] →
//! [`QueryShape`] → [`TenantIsolationEnforcer::enforce`] → [`SafeQuery`]

pub mod document;
pub mod enforce;
pub mod parser;
pub mod shape;

pub use document::QueryDocument;
pub use enforce::{SafeQuery, TenantIsolationEnforcer};
pub use parser::{parse_query_document, strip_code_fence};
pub use shape::{
    FilterQuery, MATCH_STAGE, PipelineQuery, PipelineStage, QueryShape, StageOperator, classify,
};

use crate::core::error::QueryError;
use crate::core::tenant::TenantId;

/// Parse, classify and enforce in one step.
pub fn translate_completion(
    raw: &str,
    enforcer: &TenantIsolationEnforcer,
    tenant: &TenantId,
) -> Result<SafeQuery, QueryError> {
    let doc = parse_query_document(raw)?;
    let shape = classify(doc)?;
    Ok(enforcer.enforce(shape, tenant))
}
