//! CLI entrypoint for inventory-nlq
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use nlq_application::{
    DocumentStore, NoProgress, TranslateAndRunUseCase, TranslateError, TranslateInput,
    TranslateParams, TranslateProgressNotifier, TranslationLogger,
};
use nlq_domain::{ConfigIssue, SchemaCatalog, TenantId};
use nlq_infrastructure::{
    ConfigLoader, InMemoryDocumentStore, JsonlTranslationLogger,
    build_completion_client, load_catalog,
};
use nlq_presentation::{ChatRepl, Cli, ConsoleFormatter, OutputConfig, ProgressReporter, ReplConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let _log_guard = init_logging(cli.verbose, config.logging.log_file.as_deref())?;
    info!("Starting inventory-nlq");

    report_issues(&config.validate())?;

    let catalog = load_catalog(&config.catalog)?;
    report_issues(&catalog.validate())?;

    if cli.show_catalog {
        println!("{}", ConsoleFormatter::format_catalog(&catalog));
        return Ok(ExitCode::SUCCESS);
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    // === Dependency Injection ===
    let data_file = cli
        .data
        .clone()
        .or_else(|| config.store.data_file.as_ref().map(PathBuf::from));
    let store = open_store(data_file.as_deref(), &catalog)?;
    let client = build_completion_client(&config.completion)?;

    let params = TranslateParams::default()
        .with_completion_timeout(Some(Duration::from_secs(config.completion.timeout_secs)))
        .with_allow_lookup(config.store.allow_lookup);
    if !config.store.allow_lookup {
        info!("$lookup stages are disabled");
    }
    let mut use_case = TranslateAndRunUseCase::new(client, store, &catalog).with_params(params);
    debug!("System prompt:\n{}", use_case.system_prompt());

    if let Some(path) = &config.logging.translation_log {
        match JsonlTranslationLogger::new(path) {
            Some(logger) => {
                info!("Translation log: {}", logger.path().display());
                use_case = use_case.with_logger(Arc::new(logger) as Arc<dyn TranslationLogger>);
            }
            None => warn!("Translation log disabled: cannot open {}", path),
        }
    }

    let output = OutputConfig {
        format: cli
            .output
            .map(Into::into)
            .or(config.output.format)
            .unwrap_or_default(),
        color: config.output.color,
        explain: cli.explain,
    };

    // Chat mode
    if cli.chat {
        let tenant = match TenantId::from_optional(cli.tenant.as_deref()) {
            Ok(tenant) => tenant,
            Err(e) => {
                eprintln!("{}", ConsoleFormatter::format_error(&TranslateError::Query(e)));
                return Ok(ExitCode::FAILURE);
            }
        };
        let repl_config = ReplConfig {
            show_progress: config.repl.show_progress && !cli.quiet,
            history_file: config.repl.history_file.as_ref().map(PathBuf::from),
        };

        let mut repl = ChatRepl::new(Arc::new(use_case), catalog, tenant)
            .with_output(output)
            .with_repl_config(repl_config);
        repl.run().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single question mode - prompt is required
    let Some(prompt) = cli.prompt else {
        bail!("A question is required. Use --chat for interactive mode.");
    };

    let cancellation = CancellationToken::new();
    {
        let token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
    }
    let use_case = use_case.with_cancellation(cancellation);

    let input = TranslateInput {
        utterance: prompt,
        tenant_id: cli.tenant,
    };
    let progress: Box<dyn TranslateProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    match use_case.execute_with_progress(input, progress.as_ref()).await {
        Ok(result) => {
            println!("{}", ConsoleFormatter::format(&result, &output));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            warn!("Request failed: {}", e);
            eprintln!("{}", ConsoleFormatter::format_error(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Install the tracing subscriber.
///
/// Console logs go to stderr at the level chosen by `-v`; `log_file`, when
/// set, receives the same events without ANSI colors.
fn init_logging(verbose: u8, log_file: Option<&str>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log_file has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;

            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Print config issues; fail if any of them is an error.
fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues {
        if issue.is_error() {
            eprintln!("config error: {}", issue.message);
        } else {
            warn!("{}", issue.message);
        }
    }
    if issues.iter().any(ConfigIssue::is_error) {
        bail!("invalid configuration");
    }
    Ok(())
}

/// Seeded store when a data file is given, otherwise empty catalog collections.
fn open_store(
    data_file: Option<&Path>,
    catalog: &SchemaCatalog,
) -> Result<Arc<dyn DocumentStore>> {
    let store = match data_file {
        Some(path) => {
            let store = InMemoryDocumentStore::load_file(path)?;
            store.ensure_collections(catalog.collection_names());
            store
        }
        None => {
            warn!("No data file configured; every collection is empty");
            InMemoryDocumentStore::for_catalog(catalog)
        }
    };
    Ok(Arc::new(store))
}
