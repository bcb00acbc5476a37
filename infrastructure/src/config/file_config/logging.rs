//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

/// Raw logging configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving one structured event per translation step
    pub translation_log: Option<String>,
    /// File receiving tracing output in addition to stderr
    pub log_file: Option<String>,
}
