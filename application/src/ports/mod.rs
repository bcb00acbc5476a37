//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod completion_client;
pub mod document_store;
pub mod progress;
pub mod translation_logger;
