//! Translate-and-run use case
//!
//! Turns one natural-language request into a tenant-scoped query and runs it:
//!
//! | Step | Fails with |
//! |------|------------|
//! | 1. Resolve tenant | `MissingTenant` (before any backend call) |
//! | 2. Validate utterance | `EmptyUtterance` |
//! | 3. Completion | `Completion(..)`, `Cancelled` |
//! | 4. Parse / classify / enforce | `MalformedOutput`, `MissingCollection`, ... |
//! | 5. Execute | `QueryExecutionFailed`, `Cancelled` |
//!
//! Every step fails fast; there are no partial results and no retries.

use crate::config::TranslateParams;
use crate::ports::completion_client::{CompletionClient, CompletionError};
use crate::ports::document_store::{Document, DocumentStore, StoreError};
use crate::ports::progress::{NoProgress, TranslateProgressNotifier};
use crate::ports::translation_logger::{NoTranslationLogger, TranslationEvent, TranslationLogger};
use crate::use_cases::execute_query::QueryExecutor;
use crate::use_cases::shared::check_cancelled;
use nlq_domain::util::log_preview;
use nlq_domain::{
    PromptTemplate, QueryError, SafeQuery, SchemaCatalog, StageOperator, TenantId,
    TenantIsolationEnforcer, Utterance, translate_completion,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur while translating and running a request
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("Query execution failed: {0}")]
    QueryExecutionFailed(#[from] StoreError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl TranslateError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TranslateError::Cancelled)
    }

    /// Whether sending the same request again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslateError::Completion(e) => e.is_transient(),
            TranslateError::Query(_)
            | TranslateError::QueryExecutionFailed(_)
            | TranslateError::Cancelled => false,
        }
    }

    /// Text safe to show to the end user.
    ///
    /// Never contains model output or backend messages.
    pub fn client_message(&self) -> &'static str {
        match self {
            TranslateError::Query(e) if e.is_unintelligible() => {
                "Sorry, I could not understand that request."
            }
            TranslateError::Query(QueryError::MissingTenant) => "Tenant context is missing.",
            TranslateError::Query(_) => "Please enter a question.",
            TranslateError::Completion(_) => {
                "The language model is not available right now. Please try again later."
            }
            TranslateError::QueryExecutionFailed(_) => "The query could not be executed.",
            TranslateError::Cancelled => "Cancelled.",
        }
    }
}

/// Input for the TranslateAndRun use case
#[derive(Debug, Clone)]
pub struct TranslateInput {
    /// The natural-language request
    pub utterance: String,
    /// Tenant resolved by the caller's authorization layer
    pub tenant_id: Option<String>,
}

impl TranslateInput {
    pub fn new(utterance: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            tenant_id: Some(tenant_id.into()),
        }
    }

    /// Input without tenant context. Always rejected with `MissingTenant`.
    pub fn without_tenant(utterance: impl Into<String>) -> Self {
        Self {
            utterance: utterance.into(),
            tenant_id: None,
        }
    }
}

/// Output of the TranslateAndRun use case
#[derive(Debug, Clone)]
pub struct TranslateOutput {
    /// The query that was executed
    pub query: SafeQuery,
    /// Documents returned by the store
    pub documents: Vec<Document>,
}

/// Use case for translating a request into a query and running it
pub struct TranslateAndRunUseCase {
    client: Arc<dyn CompletionClient>,
    executor: QueryExecutor,
    enforcer: TenantIsolationEnforcer,
    system_prompt: String,
    params: TranslateParams,
    logger: Arc<dyn TranslationLogger>,
    cancellation_token: Option<CancellationToken>,
}

impl TranslateAndRunUseCase {
    /// Build the use case; the system prompt is rendered once from `catalog`.
    pub fn new(
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn DocumentStore>,
        catalog: &SchemaCatalog,
    ) -> Self {
        Self {
            client,
            executor: QueryExecutor::new(store),
            enforcer: TenantIsolationEnforcer::new(catalog.tenant_field()),
            system_prompt: PromptTemplate::system_prompt(catalog),
            params: TranslateParams::default(),
            logger: Arc::new(NoTranslationLogger),
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: TranslateParams) -> Self {
        if !params.allow_lookup
            && !self.system_prompt.ends_with(PromptTemplate::LOOKUP_DISABLED_RULE)
        {
            self.system_prompt.push_str(PromptTemplate::LOOKUP_DISABLED_RULE);
        }
        self.params = params;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn TranslationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: TranslateInput) -> Result<TranslateOutput, TranslateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: TranslateInput,
        progress: &dyn TranslateProgressNotifier,
    ) -> Result<TranslateOutput, TranslateError> {
        let result = self.run(input, progress).await;
        if result.is_err() {
            progress.on_failed();
        }
        result
    }

    async fn run(
        &self,
        input: TranslateInput,
        progress: &dyn TranslateProgressNotifier,
    ) -> Result<TranslateOutput, TranslateError> {
        let tenant = TenantId::from_optional(input.tenant_id.as_deref()).inspect_err(|e| {
            warn!("Rejected request without tenant context");
            self.log_rejected(None, e);
        })?;
        let utterance = Utterance::try_new(input.utterance)
            .inspect_err(|e| self.log_rejected(Some(&tenant), e))?;

        check_cancelled(&self.cancellation_token)?;

        info!(tenant = %tenant, client = self.client.name(), "Requesting completion");
        progress.on_completion_start(self.client.name());
        let user_text = PromptTemplate::user_prompt(utterance.content());
        let raw = self.request_completion(&user_text).await?;
        progress.on_completion_end(raw.len());

        debug!(
            "Completion: {}",
            log_preview(&raw, self.params.log_preview_bytes)
        );
        self.logger.log(TranslationEvent::new(
            "completion_received",
            json!({
                "tenant": tenant.as_str(),
                "utterance": utterance.content(),
                "raw": raw,
                "bytes": raw.len(),
            }),
        ));

        let query = translate_completion(&raw, &self.enforcer, &tenant)
            .and_then(|query| {
                if !self.params.allow_lookup {
                    query.reject_operator(StageOperator::Lookup)?;
                }
                Ok(query)
            })
            .inspect_err(|e| {
                warn!(
                    kind = e.kind(),
                    "Could not translate model output: {} (output: {})",
                    e,
                    log_preview(&raw, self.params.log_preview_bytes)
                );
                self.log_rejected(Some(&tenant), e);
            })?;

        info!(
            tenant = %tenant,
            collection = query.collection(),
            kind = query.shape().kind(),
            "Query finalized"
        );
        self.logger.log(TranslationEvent::new(
            "query_finalized",
            json!({
                "tenant": tenant.as_str(),
                "query": query.to_value(),
            }),
        ));
        progress.on_query_ready(&query);

        check_cancelled(&self.cancellation_token)?;

        let started = Instant::now();
        let documents = self.executor.execute(&query).await.inspect_err(|e| {
            warn!(collection = query.collection(), "Query execution failed: {}", e);
            self.logger.log(TranslationEvent::new(
                "execution_failed",
                json!({
                    "tenant": tenant.as_str(),
                    "collection": query.collection(),
                    "message": e.to_string(),
                }),
            ));
        })?;
        let duration_ms = started.elapsed().as_millis() as u64;

        info!(
            collection = query.collection(),
            count = documents.len(),
            duration_ms,
            "Query executed"
        );
        self.logger.log(TranslationEvent::new(
            "query_executed",
            json!({
                "tenant": tenant.as_str(),
                "collection": query.collection(),
                "count": documents.len(),
                "duration_ms": duration_ms,
            }),
        ));
        progress.on_results(documents.len());

        Ok(TranslateOutput { query, documents })
    }

    /// Ask the model, racing the call against cancellation and the timeout.
    async fn request_completion(&self, user_text: &str) -> Result<String, TranslateError> {
        let call = async {
            let completion = self.client.complete(&self.system_prompt, user_text);
            match self.params.completion_timeout {
                Some(limit) => match tokio::time::timeout(limit, completion).await {
                    Ok(result) => result,
                    Err(_) => Err(CompletionError::Timeout),
                },
                None => completion.await,
            }
        };

        let result = match &self.cancellation_token {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(TranslateError::Cancelled),
                result = call => result,
            },
            None => call.await,
        };

        result.map_err(|e| {
            warn!(client = self.client.name(), "Completion failed: {}", e);
            TranslateError::Completion(e)
        })
    }

    fn log_rejected(&self, tenant: Option<&TenantId>, error: &QueryError) {
        self.logger.log(TranslationEvent::new(
            "query_rejected",
            json!({
                "tenant": tenant.map(TenantId::as_str),
                "kind": error.kind(),
                "message": error.to_string(),
            }),
        ));
    }
}
