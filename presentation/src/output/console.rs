//! Console output formatter for query results

use crate::config::OutputConfig;
use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use nlq_application::{Document, TranslateError, TranslateOutput};
use nlq_domain::{OutputFormat, SafeQuery, SchemaCatalog};
use serde_json::{Value, json};

/// Longest cell rendered in table mode, in characters
const MAX_CELL_WIDTH: usize = 40;

/// Formats query results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format a result according to `config`
    pub fn format(output: &TranslateOutput, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Json if config.explain => {
                let value = json!({
                    "query": output.query.to_value(),
                    "documents": output.documents,
                });
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Json => Self::format_json(&output.documents),
            OutputFormat::Table => {
                let mut out = String::new();
                if config.explain {
                    out.push_str(&Self::format_query(&output.query));
                    out.push('\n');
                }
                out.push_str(&Self::format_table(&output.documents));
                out
            }
        }
    }

    /// Format documents as a JSON array
    pub fn format_json(documents: &[Document]) -> String {
        serde_json::to_string_pretty(documents).unwrap_or_else(|_| "[]".to_string())
    }

    /// Format documents as aligned columns.
    ///
    /// Columns are the union of top-level keys in first-seen order. Missing
    /// values and nulls render as empty cells; nested values as compact JSON.
    pub fn format_table(documents: &[Document]) -> String {
        if documents.is_empty() {
            return format!("{}\n", "No documents found.".dimmed());
        }

        let columns = Self::columns(documents);
        let rows: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| {
                columns
                    .iter()
                    .map(|c| doc.get(c).map(Self::cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        let widths: Vec<usize> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(c.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header = Self::row(&columns, &widths);
        out.push_str(&format!("{}\n", header.cyan().bold()));
        let rule = widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(&format!("{}\n", rule.dimmed()));
        for row in &rows {
            out.push_str(&Self::row(row, &widths));
            out.push('\n');
        }

        let noun = if documents.len() == 1 {
            "document"
        } else {
            "documents"
        };
        out.push_str(&format!(
            "{}\n",
            format!("({} {})", documents.len(), noun).dimmed()
        ));
        out
    }

    /// Format the executed query (explain mode)
    pub fn format_query(query: &SafeQuery) -> String {
        let body = serde_json::to_string_pretty(&query.to_value()).unwrap_or_default();
        format!(
            "{} {} {} {}\n{}\n",
            "Query".cyan().bold(),
            query.shape().kind().yellow(),
            "on".dimmed(),
            format!("{} (tenant {})", query.collection(), query.tenant()).bold(),
            Self::indent(&body, "  ")
        )
    }

    /// Format a failure. Only the client-safe message is shown.
    pub fn format_error(error: &TranslateError) -> String {
        format!("{} {}", "Error:".red().bold(), error.client_message())
    }

    /// Format the schema catalog
    pub fn format_catalog(catalog: &SchemaCatalog) -> String {
        let mut out = String::new();
        out.push_str(&Self::header("Schema Catalog"));
        out.push('\n');
        out.push_str(&format!(
            "{} {}\n",
            "Tenant field:".cyan().bold(),
            catalog.tenant_field()
        ));

        for collection in &catalog.collections {
            out.push_str(&Self::section_header(&collection.name));
            for field in &collection.fields {
                out.push_str(&format!("  {:<24} {}\n", field.name, field.ty.as_str().dimmed()));
            }
        }

        out.push_str(&Self::footer());
        out
    }

    fn columns(documents: &[Document]) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for doc in documents {
            for key in doc.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        columns
    }

    fn cell(value: &Value) -> String {
        let text = match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if text.chars().count() > MAX_CELL_WIDTH {
            let cut: String = text.chars().take(MAX_CELL_WIDTH - 3).collect();
            format!("{}...", cut)
        } else {
            text
        }
    }

    fn row(cells: &[String], widths: &[usize]) -> String {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, output: &TranslateOutput, config: &OutputConfig) -> String {
        Self::format(output, config)
    }

    fn format_error(&self, error: &TranslateError) -> String {
        Self::format_error(error)
    }
}
