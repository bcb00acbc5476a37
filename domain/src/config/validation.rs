//! Structured configuration issues.
//!
//! Validators (config file sections, catalog files) report every problem they
//! find as a [`ConfigIssue`] instead of stopping at the first one, so the
//! caller can print all of them and decide whether to abort.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A required string is empty or whitespace.
    EmptyValue { field: String },
    /// A string does not name one of the accepted values.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A number lies outside its accepted range.
    OutOfRange { field: String, value: String },
    /// The same name appears more than once.
    DuplicateEntry { field: String, value: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
