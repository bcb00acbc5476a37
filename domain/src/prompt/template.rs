//! Prompt templates for query translation

use crate::catalog::SchemaCatalog;

/// Templates for the completion request
pub struct PromptTemplate;

impl PromptTemplate {
    /// Appended to the system prompt when `$lookup` is refused.
    pub const LOOKUP_DISABLED_RULE: &'static str =
        "Never use $lookup: answer from the named collection only.\n";

    /// Fixed instruction listing the two accepted response shapes.
    pub fn response_formats(collection_hint: &str) -> String {
        format!(
            r#"Allowed response formats (choose one):
1) Find: {{"collection":"{c}", "filter":{{...}}, "projection":{{...}}, "sort":{{...}}, "limit":10, "skip":0}}
2) Aggregate (for multi-collection joins/lookups, group, etc.): {{"collection":"{c}", "pipeline":[ {{"$match":{{...}}}}, {{"$lookup":{{...}}}}, {{"$group":{{...}}}}, {{"$sort":{{...}}}}, {{"$limit":...}} ]}}
Always include the target collection name. Only return JSON, no explanation.
"#,
            c = collection_hint
        )
    }

    /// System prompt built from the catalog.
    ///
    /// Built once per translator instance; the catalog is read-only.
    pub fn system_prompt(catalog: &SchemaCatalog) -> String {
        let hint = catalog.collection_names().next().unwrap_or("collection");
        format!(
            "You are an expert in MongoDB. Given the following collections:\n{}\n{}\
Convert the user's natural language request into a valid MongoDB JSON query object. \
Return ONLY the JSON query.",
            catalog.render(),
            Self::response_formats(hint)
        )
    }

    /// User message for the completion request.
    pub fn user_prompt(utterance: &str) -> String {
        utterance.trim().to_string()
    }
}
