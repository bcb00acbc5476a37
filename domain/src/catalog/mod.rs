//! Schema catalog
//!
//! A static description of the collections and field names the model may
//! query. The catalog grounds the model's output; it is advisory and plays no
//! part in enforcement, except for naming the tenant field.
//!
//! Field and collection names are a wire contract with both the model prompt
//! and the document store: renaming one breaks the model's grounding.

mod inventory;

use crate::config::{ConfigIssue, ConfigIssueCode, Severity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default name of the tenant-identity field.
pub const TENANT_FIELD: &str = "tenant_id";

/// Default name of the entity id field.
pub const ID_FIELD: &str = "_id";

/// Semantic type of a catalog field, as shown to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Int,
    Long,
    Double,
    Bool,
    Date,
    Object,
    Array,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Int => "int",
            FieldType::Long => "long",
            FieldType::Double => "double",
            FieldType::Bool => "bool",
            FieldType::Date => "date",
            FieldType::Object => "object",
            FieldType::Array => "array",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: &str, ty: FieldType) -> Self {
        self.fields.push(FieldSpec::new(name, ty));
        self
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// `name: {field: type, ...}` line used in the system prompt.
    pub fn render(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|f| format!("{}: {}", f.name, f.ty))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {{{}}}", self.name, fields)
    }
}

/// The set of collections available for querying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaCatalog {
    #[serde(default = "default_tenant_field")]
    pub tenant_field: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default)]
    pub collections: Vec<CollectionSchema>,
}

fn default_tenant_field() -> String {
    TENANT_FIELD.to_string()
}

fn default_id_field() -> String {
    ID_FIELD.to_string()
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::inventory()
    }
}

impl SchemaCatalog {
    pub fn new(collections: Vec<CollectionSchema>) -> Self {
        Self {
            tenant_field: default_tenant_field(),
            id_field: default_id_field(),
            collections,
        }
    }

    pub fn with_tenant_field(mut self, field: impl Into<String>) -> Self {
        self.tenant_field = field.into();
        self
    }

    pub fn tenant_field(&self) -> &str {
        &self.tenant_field
    }

    pub fn collection(&self, name: &str) -> Option<&CollectionSchema> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.iter().map(|c| c.name.as_str())
    }

    /// Render the catalog as the bullet list embedded in the system prompt.
    pub fn render(&self) -> String {
        let mut out = String::from("Collections and fields (use exact field names):\n");
        for collection in &self.collections {
            out.push_str("- ");
            out.push_str(&collection.render());
            out.push('\n');
        }
        out
    }

    /// Structural checks for catalogs loaded from a file.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.tenant_field.trim().is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::EmptyValue {
                    field: "catalog.tenant_field".to_string(),
                },
                message: "catalog.tenant_field cannot be empty".to_string(),
            });
        }

        if self.collections.is_empty() {
            issues.push(ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::EmptyValue {
                    field: "catalog.collections".to_string(),
                },
                message: "catalog must declare at least one collection".to_string(),
            });
        }

        for (i, collection) in self.collections.iter().enumerate() {
            if collection.name.trim().is_empty() {
                issues.push(ConfigIssue {
                    severity: Severity::Error,
                    code: ConfigIssueCode::EmptyValue {
                        field: format!("catalog.collections[{}].name", i),
                    },
                    message: format!("catalog.collections[{}]: name cannot be empty", i),
                });
            }
            if self.collections[..i]
                .iter()
                .any(|c| c.name == collection.name)
            {
                issues.push(ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::DuplicateEntry {
                        field: "catalog.collections".to_string(),
                        value: collection.name.clone(),
                    },
                    message: format!("collection '{}' is declared twice", collection.name),
                });
            }
        }

        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_catalog_has_tenant_field() {
        let catalog = SchemaCatalog::inventory();
        assert_eq!(catalog.tenant_field(), "tenant_id");
        let product = catalog.collection("product").unwrap();
        assert!(product.has_field("tenant_id"));
        assert!(product.has_field("remaining_quantity"));
    }

    #[test]
    fn test_render_lists_every_collection() {
        let catalog = SchemaCatalog::inventory();
        let rendered = catalog.render();
        for name in catalog.collection_names() {
            assert!(rendered.contains(&format!("- {}: {{", name)), "{name}");
        }
        assert!(rendered.contains("remaining_quantity: int"));
    }

    #[test]
    fn test_collection_render() {
        let c = CollectionSchema::new("thing")
            .field("tenant_id", FieldType::String)
            .field("count", FieldType::Int);
        assert_eq!(c.render(), "thing: {tenant_id: string, count: int}");
    }

    #[test]
    fn test_deserialize_catalog_from_toml() {
        let toml_str = r#"
[[collections]]
name = "widget"
fields = [
  { name = "tenant_id", type = "string" },
  { name = "weight", type = "double" },
]
"#;
        let catalog: SchemaCatalog = toml::from_str(toml_str).unwrap();
        assert_eq!(catalog.tenant_field(), TENANT_FIELD);
        assert_eq!(catalog.id_field, ID_FIELD);
        assert_eq!(
            catalog.collection("widget").unwrap().fields[1].ty,
            FieldType::Double
        );
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn test_validate_flags_problems() {
        let catalog = SchemaCatalog::new(vec![
            CollectionSchema::new("a"),
            CollectionSchema::new("a"),
            CollectionSchema::new(" "),
        ])
        .with_tenant_field("");

        let issues = catalog.validate();
        let errors = issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count();
        assert_eq!(errors, 2);
        assert!(issues.iter().any(|i| matches!(
            &i.code,
            ConfigIssueCode::DuplicateEntry { value, .. } if value == "a"
        )));
    }
}
