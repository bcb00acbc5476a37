//! Configuration file loading for inventory-nlq
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `NLQ_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./nlq.toml` or `./.nlq.toml`
//! 4. Global: `$XDG_CONFIG_HOME/inventory-nlq/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileCatalogConfig, FileCompletionConfig, FileConfig, FileLoggingConfig, FileOutputConfig,
    FileReplConfig, FileStoreConfig,
};
pub use loader::ConfigLoader;
