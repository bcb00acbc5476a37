//! Catalog loading.
//!
//! The built-in inventory catalog is used unless `[catalog] file` names a
//! TOML file with the same structure:
//!
//! ```toml
//! tenant_field = "tenant_id"
//!
//! [[collections]]
//! name = "product"
//! fields = [{ name = "tenant_id", type = "string" }, { name = "name", type = "string" }]
//! ```

use crate::config::FileCatalogConfig;
use nlq_domain::SchemaCatalog;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum CatalogLoadError {
    #[error("Could not read catalog file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read a catalog from a TOML file.
pub fn read_catalog_file(path: &Path) -> Result<SchemaCatalog, CatalogLoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| CatalogLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve the catalog from `[catalog]`: file or built-in, then the tenant field override.
pub fn load_catalog(config: &FileCatalogConfig) -> Result<SchemaCatalog, CatalogLoadError> {
    let mut catalog = match &config.file {
        Some(file) => {
            let catalog = read_catalog_file(Path::new(file))?;
            info!(
                "Loaded catalog with {} collections from {}",
                catalog.collections.len(),
                file
            );
            catalog
        }
        None => SchemaCatalog::inventory(),
    };

    if let Some(field) = &config.tenant_field {
        catalog = catalog.with_tenant_field(field.clone());
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_inventory() {
        let catalog = load_catalog(&FileCatalogConfig::default()).unwrap();
        assert_eq!(catalog, SchemaCatalog::inventory());
    }

    #[test]
    fn test_tenant_field_override() {
        let config = FileCatalogConfig {
            file: None,
            tenant_field: Some("org_id".into()),
        };
        assert_eq!(load_catalog(&config).unwrap().tenant_field(), "org_id");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            r#"
tenant_field = "shop_id"

[[collections]]
name = "order"
fields = [{ name = "shop_id", type = "string" }, { name = "total", type = "double" }]
"#,
        )
        .unwrap();

        let config = FileCatalogConfig {
            file: Some(path.to_string_lossy().into_owned()),
            tenant_field: None,
        };
        let catalog = load_catalog(&config).unwrap();
        assert_eq!(catalog.tenant_field(), "shop_id");
        assert!(catalog.collection("order").unwrap().has_field("total"));
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_catalog_file(&dir.path().join("missing.toml")),
            Err(CatalogLoadError::Io { .. })
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[[collections]]\nfields = 3").unwrap();
        assert!(matches!(
            read_catalog_file(&bad),
            Err(CatalogLoadError::Parse { .. })
        ));
    }
}
