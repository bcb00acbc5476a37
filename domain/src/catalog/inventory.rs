//! Built-in inventory catalog.

use super::{CollectionSchema, FieldType::*, SchemaCatalog};

impl SchemaCatalog {
    /// The inventory backend's collections.
    pub fn inventory() -> Self {
        SchemaCatalog::new(vec![
            CollectionSchema::new("product")
                .field("tenant_id", String)
                .field("_id", String)
                .field("name", String)
                .field("latest_batch_no", String)
                .field("remaining_quantity", Int)
                .field("latest_unit_price", Double)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("supplier")
                .field("tenant_id", String)
                .field("_id", String)
                .field("name", String)
                .field("email", String)
                .field("address", String)
                .field("contact", String)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("product_batch")
                .field("tenant_id", String)
                .field("_id", String)
                .field("product_id", String)
                .field("invoice_no", String)
                .field("batch_no", String)
                .field("qty", Int)
                .field("unit_cost", Double)
                .field("unit_price", Double)
                .field("exp", Date)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("invoice")
                .field("tenant_id", String)
                .field("_id", String)
                .field("invoice_no", String)
                .field("supplier_id", String)
                .field("date", Date)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("transaction")
                .field("tenant_id", String)
                .field("_id", String)
                .field("transaction_id", String)
                .field("payment_method", String)
                .field("gross_amount", Double)
                .field("discount_amount", Double)
                .field("net_amount", Double)
                .field("paid_amount", Double)
                .field("balance_amount", Double)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("transaction_item")
                .field("tenant_id", String)
                .field("_id", String)
                .field("transaction_id", String)
                .field("product_id", String)
                .field("qty", Int)
                .field("unit_price", Double)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("audit_log")
                .field("tenant_id", String)
                .field("_id", String)
                .field("user_id", String)
                .field("username", String)
                .field("entity_type", String)
                .field("entity_id", String)
                .field("action_type", String)
                .field("description", String)
                .field("old_values", Object)
                .field("new_values", Object)
                .field("status", String)
                .field("error_message", String)
                .field("ip_address", String)
                .field("user_agent", String)
                .field("request_path", String)
                .field("request_method", String)
                .field("duration_ms", Long)
                .field("timestamp", Date)
                .field("schema_version", Int),
            CollectionSchema::new("tenant")
                .field("_id", String)
                .field("name", String)
                .field("sub_domain", String)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("tenant_config")
                .field("_id", String)
                .field("tenant_id", String)
                .field("brand", Object)
                .field("ui_theme", Object)
                .field("localization", Object)
                .field("features", Object)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
            CollectionSchema::new("user")
                .field("tenant_id", String)
                .field("_id", String)
                .field("username", String)
                .field("email", String)
                .field("password", String)
                .field("roles", Array)
                .field("enabled", Bool)
                .field("created_at", Date)
                .field("updated_at", Date)
                .field("schema_version", Int),
        ])
    }
}
