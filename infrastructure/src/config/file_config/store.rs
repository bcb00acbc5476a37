//! Backend and catalog configuration (`[store]` and `[catalog]` sections)

use serde::{Deserialize, Serialize};

/// Raw document store configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStoreConfig {
    /// JSON file seeding the in-memory store: `{"collection": [docs...]}`
    pub data_file: Option<String>,
    /// Accept `$lookup` stages. Joined collections are read for all tenants.
    pub allow_lookup: bool,
}

impl Default for FileStoreConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            allow_lookup: true,
        }
    }
}

/// Raw catalog configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCatalogConfig {
    /// TOML file replacing the built-in inventory catalog
    pub file: Option<String>,
    /// Override for the tenant-identity field name
    pub tenant_field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_allowed_unless_disabled() {
        assert!(FileStoreConfig::default().allow_lookup);

        let config: super::super::FileConfig = toml::from_str(
            r#"
[store]
data_file = "demos/inventory.json"
allow_lookup = false
"#,
        )
        .unwrap();
        assert!(!config.store.allow_lookup);
        assert_eq!(config.store.data_file.as_deref(), Some("demos/inventory.json"));
    }
}
