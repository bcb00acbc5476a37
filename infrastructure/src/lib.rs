//! Infrastructure layer for inventory-nlq
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod catalog;
pub mod completion;
pub mod config;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use catalog::{CatalogLoadError, load_catalog, read_catalog_file};
pub use completion::{
    AnthropicCompletionClient, CompletionProvider, CompletionSettings, OpenAiCompletionClient,
    build_completion_client,
};
pub use config::{
    ConfigLoader, FileCatalogConfig, FileCompletionConfig, FileConfig, FileLoggingConfig,
    FileOutputConfig, FileReplConfig, FileStoreConfig,
};
pub use logging::JsonlTranslationLogger;
pub use store::InMemoryDocumentStore;
