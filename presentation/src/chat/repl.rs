//! REPL (Read-Eval-Print Loop) for interactive questions

use crate::config::{OutputConfig, ReplConfig};
use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use crate::progress::reporter::ProgressReporter;
use nlq_application::{
    NoProgress, TranslateAndRunUseCase, TranslateError, TranslateInput, TranslateProgressNotifier,
};
use nlq_domain::{OutputFormat, SchemaCatalog, TenantId};
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::sync::Arc;
use tracing::debug;

/// What the loop should do after a slash command
#[derive(Debug, PartialEq)]
enum CommandOutcome {
    Print(String),
    Quit,
}

const HELP: &str = "\
Commands:
  /help, /h, /?          - Show this help
  /catalog               - Show collections and fields
  /explain [on|off]      - Show the executed query before results
  /format <table|json>   - Change the output format
  /tenant                - Show the current tenant
  /quit, /exit, /q       - Exit chat";

/// Interactive chat REPL
pub struct ChatRepl {
    use_case: Arc<TranslateAndRunUseCase>,
    catalog: SchemaCatalog,
    tenant: TenantId,
    formatter: Box<dyn OutputFormatter>,
    output: OutputConfig,
    repl: ReplConfig,
}

impl ChatRepl {
    /// Create a new ChatRepl answering for `tenant`
    pub fn new(
        use_case: Arc<TranslateAndRunUseCase>,
        catalog: SchemaCatalog,
        tenant: TenantId,
    ) -> Self {
        Self {
            use_case,
            catalog,
            tenant,
            formatter: Box::new(ConsoleFormatter),
            output: OutputConfig::default(),
            repl: ReplConfig::default(),
        }
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_repl_config(mut self, repl: ReplConfig) -> Self {
        self.repl = repl;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> RlResult<()> {
        let mut rl = DefaultEditor::new()?;

        let history_path = self.repl.history_path();
        if let Some(ref path) = history_path {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = rl.load_history(path);
        }

        self.print_welcome();

        loop {
            match rl.readline(">>> ") {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        match self.handle_command(line) {
                            CommandOutcome::Print(text) => println!("{}", text),
                            CommandOutcome::Quit => {
                                println!("Bye!");
                                break;
                            }
                        }
                        continue;
                    }

                    let _ = rl.add_history_entry(line);

                    println!();
                    println!("{}", self.process_question(line).await);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Bye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }
        }

        if let Some(ref path) = history_path {
            let _ = rl.save_history(path);
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│         Inventory NLQ - Chat Mode           │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!("Tenant: {}", self.tenant);
        println!(
            "Collections: {}",
            self.catalog.collection_names().collect::<Vec<_>>().join(", ")
        );
        println!();
        println!("{}", HELP);
        println!();
    }

    /// Handle a slash command
    fn handle_command(&mut self, line: &str) -> CommandOutcome {
        let mut parts = line.split_whitespace();
        let cmd = parts.next().unwrap_or_default();
        let arg = parts.next();

        match (cmd, arg) {
            ("/quit" | "/exit" | "/q", _) => CommandOutcome::Quit,
            ("/help" | "/h" | "/?", _) => CommandOutcome::Print(HELP.to_string()),
            ("/catalog", _) => {
                CommandOutcome::Print(ConsoleFormatter::format_catalog(&self.catalog))
            }
            ("/tenant", _) => CommandOutcome::Print(format!("Tenant: {}", self.tenant)),
            ("/explain", arg) => {
                let explain = match arg {
                    None => !self.output.explain,
                    Some("on") => true,
                    Some("off") => false,
                    Some(other) => {
                        return CommandOutcome::Print(format!(
                            "Unknown value '{}': use /explain on or /explain off",
                            other
                        ));
                    }
                };
                self.output.explain = explain;
                CommandOutcome::Print(format!("Explain {}", if explain { "on" } else { "off" }))
            }
            ("/format", Some(value)) => match value.parse::<OutputFormat>() {
                Ok(format) => {
                    self.output.format = format;
                    CommandOutcome::Print(format!("Output format: {}", value.to_lowercase()))
                }
                Err(e) => CommandOutcome::Print(e),
            },
            ("/format", None) => CommandOutcome::Print("Usage: /format <table|json>".to_string()),
            _ => CommandOutcome::Print(format!(
                "Unknown command: {}\nType /help for available commands",
                cmd
            )),
        }
    }

    /// Translate and run one question. Ctrl-C abandons the pending request.
    async fn process_question(&self, question: &str) -> String {
        let input = TranslateInput::new(question, self.tenant.as_str());
        let progress: Box<dyn TranslateProgressNotifier> = if self.repl.show_progress {
            Box::new(ProgressReporter::new())
        } else {
            Box::new(NoProgress)
        };

        let result = tokio::select! {
            result = self.use_case.execute_with_progress(input, progress.as_ref()) => result,
            _ = tokio::signal::ctrl_c() => {
                progress.on_failed();
                Err(TranslateError::Cancelled)
            }
        };

        match result {
            Ok(output) => self.formatter.format(&output, &self.output),
            Err(e) => {
                debug!("Request failed: {}", e);
                self.formatter.format_error(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nlq_application::{
        CompletionClient, CompletionError, Document, DocumentStore, FindOptions, StoreError,
    };
    use serde_json::{Map, Value, json};
    use std::sync::Mutex;

    struct FixedClient(&'static str);

    #[async_trait]
    impl CompletionClient for FixedClient {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, _system: &str, _user: &str) -> Result<String, CompletionError> {
            Ok(self.0.to_string())
        }
    }

    /// Returns one document per call and remembers the filter it saw.
    #[derive(Default)]
    struct EchoStore {
        filters: Mutex<Vec<Map<String, Value>>>,
    }

    #[async_trait]
    impl DocumentStore for EchoStore {
        async fn find_many(
            &self,
            _collection: &str,
            filter: &Map<String, Value>,
            _options: &FindOptions,
        ) -> Result<Vec<Document>, StoreError> {
            self.filters.lock().unwrap().push(filter.clone());
            let doc = json!({"name": "Soap", "remaining_quantity": 4});
            Ok(vec![doc.as_object().unwrap().clone()])
        }

        async fn aggregate(
            &self,
            _collection: &str,
            _stages: &[Value],
        ) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Backend("not used".into()))
        }
    }

    fn repl(model_output: &'static str) -> (ChatRepl, Arc<EchoStore>) {
        let catalog = SchemaCatalog::inventory();
        let store = Arc::new(EchoStore::default());
        let client = Arc::new(FixedClient(model_output));
        let use_case = TranslateAndRunUseCase::new(client, store.clone(), &catalog);
        let repl = ChatRepl::new(Arc::new(use_case), catalog, TenantId::parse("acme").unwrap())
            .with_repl_config(ReplConfig {
                show_progress: false,
                history_file: None,
            });
        (repl, store)
    }

    #[test]
    fn test_quit_aliases() {
        let (mut repl, _) = repl("{}");
        for cmd in ["/quit", "/exit", "/q"] {
            assert_eq!(repl.handle_command(cmd), CommandOutcome::Quit);
        }
    }

    #[test]
    fn test_explain_toggle() {
        let (mut repl, _) = repl("{}");
        assert_eq!(
            repl.handle_command("/explain on"),
            CommandOutcome::Print("Explain on".into())
        );
        assert!(repl.output.explain);
        repl.handle_command("/explain");
        assert!(!repl.output.explain);
        let CommandOutcome::Print(text) = repl.handle_command("/explain maybe") else {
            panic!("expected usage text");
        };
        assert!(text.contains("/explain on"));
        assert!(!repl.output.explain);
    }

    #[test]
    fn test_format_command() {
        let (mut repl, _) = repl("{}");
        repl.handle_command("/format json");
        assert_eq!(repl.output.format, OutputFormat::Json);
        repl.handle_command("/format csv");
        assert_eq!(repl.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_unknown_command() {
        let (mut repl, _) = repl("{}");
        let CommandOutcome::Print(text) = repl.handle_command("/drop") else {
            panic!("expected help hint");
        };
        assert!(text.starts_with("Unknown command: /drop"));
    }

    #[tokio::test]
    async fn test_question_is_scoped_to_repl_tenant() {
        let (mut repl, store) = repl(
            r#"{"collection": "product", "filter": {"remaining_quantity": {"$lt": 10}, "tenant_id": "other"}}"#,
        );
        repl.handle_command("/format json");
        let rendered = repl.process_question("low stock").await;

        let filters = store.filters.lock().unwrap();
        assert_eq!(filters[0]["tenant_id"], json!("acme"));
        let docs: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(docs[0]["name"], json!("Soap"));
    }

    #[tokio::test]
    async fn test_malformed_output_shows_client_message() {
        colored::control::set_override(false);
        let (repl, store) = repl("I cannot help with that");
        let rendered = repl.process_question("delete everything").await;
        assert_eq!(rendered, "Error: Sorry, I could not understand that request.");
        assert!(store.filters.lock().unwrap().is_empty());
    }
}
