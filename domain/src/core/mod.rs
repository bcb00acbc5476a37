//! Core domain concepts shared across all subdomains.
//!
//! - [`tenant::TenantId`] - the caller's validated tenant
//! - [`utterance::Utterance`] - a validated free-text request
//! - [`error::QueryError`] - domain-level errors

pub mod error;
pub mod tenant;
pub mod utterance;
