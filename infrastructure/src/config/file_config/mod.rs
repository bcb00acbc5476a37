//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

mod completion;
mod logging;
mod output;
mod repl;
mod store;

pub use completion::FileCompletionConfig;
pub use logging::FileLoggingConfig;
pub use output::FileOutputConfig;
pub use repl::FileReplConfig;
pub use store::{FileCatalogConfig, FileStoreConfig};

use crate::completion::CompletionProvider;
use nlq_domain::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Language model used for translation
    pub completion: FileCompletionConfig,
    /// Document store settings
    pub store: FileStoreConfig,
    /// Catalog override
    pub catalog: FileCatalogConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let completion = &self.completion;

        if completion.provider.parse::<CompletionProvider>().is_err() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::InvalidEnumValue {
                    field: "completion.provider".to_string(),
                    value: completion.provider.clone(),
                    valid_values: CompletionProvider::NAMES
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                message: format!(
                    "completion.provider: unknown value '{}' (expected one of: {})",
                    completion.provider,
                    CompletionProvider::NAMES.join(", ")
                ),
            });
        }

        if completion.model.trim().is_empty() {
            issues.push(empty_value("completion.model"));
        }

        if !(0.0..=2.0).contains(&completion.temperature) {
            issues.push(out_of_range(
                "completion.temperature",
                completion.temperature.to_string(),
                "must be between 0.0 and 2.0",
            ));
        }

        if completion.timeout_secs == 0 {
            issues.push(out_of_range(
                "completion.timeout_secs",
                "0".to_string(),
                "must be greater than zero",
            ));
        }

        if completion.max_tokens == 0 {
            issues.push(out_of_range(
                "completion.max_tokens",
                "0".to_string(),
                "must be greater than zero",
            ));
        }

        if let Some(field) = &self.catalog.tenant_field
            && field.trim().is_empty()
        {
            issues.push(empty_value("catalog.tenant_field"));
        }

        issues
    }
}

fn empty_value(field: &str) -> ConfigIssue {
    ConfigIssue {
        severity: Severity::Error,
        code: ConfigIssueCode::EmptyValue {
            field: field.to_string(),
        },
        message: format!("{} cannot be empty", field),
    }
}

fn out_of_range(field: &str, value: String, reason: &str) -> ConfigIssue {
    ConfigIssue {
        severity: Severity::Error,
        message: format!("{} = {}: {}", field, value, reason),
        code: ConfigIssueCode::OutOfRange {
            field: field.to_string(),
            value,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlq_domain::OutputFormat;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[completion]
provider = "openai"
model = "qwen2.5-coder"
base_url = "http://localhost:8080/v1"
temperature = 0.1

[store]
data_file = "seed.json"

[catalog]
tenant_field = "org_id"

[logging]
translation_log = "translations.jsonl"

[output]
format = "json"
color = false

[repl]
show_progress = false
history_file = "~/.local/share/inventory-nlq/history.txt"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.completion.model, "qwen2.5-coder");
        assert_eq!(
            config.completion.base_url.as_deref(),
            Some("http://localhost:8080/v1")
        );
        assert_eq!(config.store.data_file.as_deref(), Some("seed.json"));
        assert_eq!(config.catalog.tenant_field.as_deref(), Some("org_id"));
        assert_eq!(
            config.logging.translation_log.as_deref(),
            Some("translations.jsonl")
        );
        assert_eq!(config.output.format, Some(OutputFormat::Json));
        assert!(!config.output.color);
        assert!(!config.repl.show_progress);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_default_config() {
        let config = FileConfig::default();
        assert_eq!(config.completion.provider, "openai");
        assert!(config.store.data_file.is_none());
        assert!(config.output.color);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(FileConfig::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let mut config = FileConfig::default();
        config.completion.provider = "mistral".into();
        config.completion.model = " ".into();
        config.completion.temperature = 3.5;
        config.completion.timeout_secs = 0;
        config.completion.max_tokens = 0;
        config.catalog.tenant_field = Some(String::new());

        let issues = config.validate();
        assert_eq!(issues.len(), 6);
        assert!(issues.iter().all(|i| i.is_error()));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::InvalidEnumValue { value, .. } if value == "mistral"
        )));
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::OutOfRange { field, .. } if field == "completion.temperature"
        )));
    }
}
