//! Domain layer for inventory-nlq
//!
//! This crate contains the pure logic of the natural-language query
//! translator. It has no dependencies on infrastructure or presentation
//! concerns and performs no I/O.
//!
//! # Core Concepts
//!
//! ## Untrusted model output
//!
//! The language model's text is untrusted. [`parse_query_document`] recovers
//! a JSON object from it, which [`classify`] turns into one of two shapes
//! ([`QueryShape`]):
//!
//! - **Find**: `{collection, filter, projection?, sort?, limit?, skip?}`
//! - **Aggregate**: `{collection, pipeline: [stage, ...]}`
//!
//! ## Tenant isolation
//!
//! [`TenantIsolationEnforcer`] is the single choke point that turns a shape
//! into a [`SafeQuery`], binding the tenant field to the caller's
//! [`TenantId`] regardless of what the model wrote.

pub mod catalog;
pub mod config;
pub mod core;
pub mod prompt;
pub mod query;
pub mod util;

// Re-export commonly used types
pub use catalog::{CollectionSchema, FieldSpec, FieldType, ID_FIELD, SchemaCatalog, TENANT_FIELD};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{error::QueryError, tenant::TenantId, utterance::Utterance};
pub use prompt::PromptTemplate;
pub use query::{
    FilterQuery, PipelineQuery, PipelineStage, QueryDocument, QueryShape, SafeQuery,
    StageOperator, TenantIsolationEnforcer, classify, parse_query_document, translate_completion,
};
