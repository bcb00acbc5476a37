//! Application layer for inventory-nlq
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::TranslateParams;
pub use ports::{
    completion_client::{CompletionClient, CompletionError},
    document_store::{Document, DocumentStore, FindOptions, StoreError},
    progress::{NoProgress, TranslateProgressNotifier},
    translation_logger::{NoTranslationLogger, TranslationEvent, TranslationLogger},
};
pub use use_cases::execute_query::QueryExecutor;
pub use use_cases::translate_and_run::{
    TranslateAndRunUseCase, TranslateError, TranslateInput, TranslateOutput,
};
