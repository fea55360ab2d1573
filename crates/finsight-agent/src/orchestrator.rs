//! The run orchestrator

use crate::catalog::TaskCatalog;
use crate::error::AgentError;
use crate::run::{summarize, RunContext, RunOutcome, TaskOutcome};
use finsight_currency::CurrencyConverter;
use finsight_domain::traits::{AuditStore, CorpusProvider, LlmProvider};
use finsight_domain::{
    Corpora, ExtractedRecord, ResultAggregate, RunId, RunPhase, RunRecord, RunStatus, FINISHED_TASK,
};
use finsight_extractor::{
    Contextualizer, ExtractorConfig, ExtractorError, RetrievalGateway, StructuredExtractor,
};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Trace node for queue handling and task lookup
pub const PLANNER: &str = "Planner";
/// Trace node for question rewriting
pub const CONTEXTUALIZER: &str = "Contextualizer";
/// Trace node for corpus retrieval
pub const RETRIEVER: &str = "Retriever";
/// Trace node for structured extraction
pub const EXTRACTOR: &str = "Extractor";
/// Trace node for run-level events
pub const ORCHESTRATOR: &str = "Orchestrator";

type Step = (Option<ExtractedRecord>, TaskOutcome);

/// Drives runs against one set of collaborators
///
/// Collaborators are shared through `Arc`, so one agent can execute several
/// runs concurrently; each run owns its own [`RunContext`].
pub struct Agent<L, P, A>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    corpus: Arc<P>,
    store: Arc<A>,
    contextualizer: Contextualizer<L>,
    gateway: RetrievalGateway,
    extractor: StructuredExtractor<L>,
    catalog: Arc<TaskCatalog>,
    queue: Option<Vec<String>>,
}

impl<L, P, A> Agent<L, P, A>
where
    L: LlmProvider,
    P: CorpusProvider,
    A: AuditStore,
{
    /// Create an agent running the default catalog
    pub fn new(
        llm: Arc<L>,
        corpus: Arc<P>,
        store: Arc<A>,
        converter: Arc<CurrencyConverter>,
        config: ExtractorConfig,
    ) -> Self {
        Self {
            corpus,
            store,
            contextualizer: Contextualizer::new(llm.clone(), config.contextualize_timeout()),
            gateway: RetrievalGateway::new(config.top_k),
            extractor: StructuredExtractor::new(llm, converter, config),
            catalog: Arc::new(TaskCatalog::default()),
            queue: None,
        }
    }

    /// Use a different task catalog
    pub fn with_catalog(mut self, catalog: TaskCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Run these labels instead of the whole catalog
    pub fn with_queue(mut self, queue: Vec<String>) -> Self {
        self.queue = Some(queue);
        self
    }

    /// The task catalog
    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// The audit store
    pub fn store(&self) -> &Arc<A> {
        &self.store
    }

    /// Labels a new run will process, in order
    pub fn queue(&self) -> Vec<String> {
        self.queue.clone().unwrap_or_else(|| self.catalog.labels())
    }

    /// Create, prepare and execute a run to completion
    pub async fn run(&self, filename: &str) -> Result<RunOutcome, AgentError> {
        let run = self.start(filename)?;
        let corpora = self.prepare(&run).await?;
        self.execute(&run, corpora).await
    }

    /// Create the in-progress run record
    pub fn start(&self, filename: &str) -> Result<RunRecord, AgentError> {
        let run = self.store.create_run(filename).map_err(store_error)?;
        info!(run_id = %run.id, filename, "Created run");
        Ok(run)
    }

    /// Open the document's corpora, indexing the document if needed
    ///
    /// A missing document or a corpus fault fails the run before the task
    /// loop starts.
    pub async fn prepare(&self, run: &RunRecord) -> Result<Corpora<P::Retriever>, AgentError> {
        let opened = match self.corpus.open(&run.filename).await {
            Ok(None) => {
                info!(run_id = %run.id, filename = %run.filename, "No index found, indexing document");
                self.trace(run.id, ORCHESTRATOR, "Index missing, indexing document")?;
                self.corpus.index(&run.filename).await
            }
            other => other,
        };

        let err = match opened {
            Ok(Some(corpora)) => return Ok(corpora),
            Ok(None) => AgentError::DocumentNotFound(run.filename.clone()),
            Err(e) => AgentError::Corpus(e.to_string()),
        };
        error!(run_id = %run.id, error = %err, "Run failed before task loop");
        self.fail(run.id, None, &err);
        Err(err)
    }

    /// Execute the task queue of a prepared run
    pub async fn execute(
        &self,
        run: &RunRecord,
        corpora: Corpora<P::Retriever>,
    ) -> Result<RunOutcome, AgentError> {
        let span = info_span!("run", run_id = %run.id, filename = %run.filename);
        self.execute_in_span(run, corpora).instrument(span).await
    }

    async fn execute_in_span(
        &self,
        run: &RunRecord,
        corpora: Corpora<P::Retriever>,
    ) -> Result<RunOutcome, AgentError> {
        let mut context = RunContext::new(run.id, &run.filename, self.queue());
        context.advance(RunPhase::Running)?;
        info!(tasks = context.remaining(), "Starting run");

        let result = match self.drive(&mut context, &corpora).await {
            Ok(()) => self.complete(&mut context),
            Err(err) => Err(err),
        };

        if let Err(err) = result {
            error!(error = %err, "Run failed");
            // Failed is reachable from every non-terminal phase
            if !context.phase().is_terminal() {
                context.advance(RunPhase::Failed)?;
            }
            self.fail(run.id, Some(context.aggregate()), &err);
            return Err(err);
        }

        let outcome = context.into_outcome();
        info!(
            found = outcome.stats.found,
            not_found = outcome.stats.not_found,
            failed = outcome.stats.failed,
            skipped = outcome.stats.skipped,
            "Run completed"
        );
        Ok(outcome)
    }

    /// The task loop; only audit store faults escape it
    async fn drive(
        &self,
        context: &mut RunContext,
        corpora: &Corpora<P::Retriever>,
    ) -> Result<(), AgentError> {
        let run_id = context.run_id();

        while let Some(label) = context.next_task() {
            let current = format!("Processing: {}", label);
            self.store.set_task(run_id, &current).map_err(store_error)?;
            self.trace(run_id, PLANNER, &current)?;

            let (record, outcome) = self.process_task(run_id, &label, corpora).await?;
            context.complete_task(record, outcome);
        }

        self.store.set_task(run_id, FINISHED_TASK).map_err(store_error)?;
        self.store
            .set_results(run_id, context.aggregate())
            .map_err(store_error)?;

        let stats = context.stats();
        self.trace(
            run_id,
            ORCHESTRATOR,
            &format!(
                "Run completed: {} found, {} not found, {} failed, {} skipped",
                stats.found, stats.not_found, stats.failed, stats.skipped
            ),
        )?;
        Ok(())
    }

    /// Persist completion, then move the in-memory phase
    pub(crate) fn complete(&self, context: &mut RunContext) -> Result<(), AgentError> {
        self.store
            .set_status(context.run_id(), RunStatus::Completed)
            .map_err(store_error)?;
        context.advance(RunPhase::Completed)
    }

    async fn process_task(
        &self,
        run_id: RunId,
        label: &str,
        corpora: &Corpora<P::Retriever>,
    ) -> Result<Step, AgentError> {
        let Some(task) = self.catalog.get(label) else {
            warn!(task = label, "No task definition, skipping");
            self.trace(run_id, PLANNER, &format!("No task definition for '{}', skipping", label))?;
            return Ok((None, TaskOutcome::Skipped));
        };

        let question = match self.contextualizer.contextualize(&task.label).await {
            Ok(question) => question,
            Err(e) => return self.task_failed(run_id, CONTEXTUALIZER, label, e),
        };
        self.trace(run_id, CONTEXTUALIZER, &format!("Question: {}", question))?;

        let context = match self.gateway.gather(&question, corpora).await {
            Ok(context) => context,
            Err(e) => return self.task_failed(run_id, RETRIEVER, label, e),
        };
        self.trace(
            run_id,
            RETRIEVER,
            &format!(
                "Retrieved {} text and {} table snippets",
                context.text.len(),
                context.table.len()
            ),
        )?;

        let record = match self.extractor.extract(task, &question, &context).await {
            Ok(record) => record,
            Err(e) => return self.task_failed(run_id, EXTRACTOR, label, e),
        };

        if record.is_found() {
            info!(task = label, "Data point found");
            self.trace(run_id, EXTRACTOR, &format!("FOUND: {}", summarize(&record)))?;
            Ok((Some(record), TaskOutcome::Found))
        } else {
            info!(task = label, "Data point not found");
            self.trace(run_id, EXTRACTOR, &format!("NOT_FOUND: skipping '{}'", label))?;
            Ok((None, TaskOutcome::NotFound))
        }
    }

    fn task_failed(
        &self,
        run_id: RunId,
        node: &str,
        label: &str,
        err: ExtractorError,
    ) -> Result<Step, AgentError> {
        warn!(task = label, node, error = %err, "Task failed");
        self.trace(run_id, node, &format!("Failed: {}", err))?;
        Ok((None, TaskOutcome::Failed(err.to_string())))
    }

    fn trace(&self, run_id: RunId, node: &str, message: &str) -> Result<(), AgentError> {
        self.store
            .append_log(run_id, node, message)
            .map(|_| ())
            .map_err(store_error)
    }

    /// Best-effort transition to FAILED
    fn fail(&self, run_id: RunId, results: Option<&ResultAggregate>, err: &AgentError) {
        if let Err(e) = self.store.append_log(run_id, ORCHESTRATOR, &format!("Run failed: {}", err)) {
            warn!(run_id = %run_id, error = %e, "Could not record run failure");
        }
        if let Some(results) = results {
            if let Err(e) = self.store.set_results(run_id, results) {
                warn!(run_id = %run_id, error = %e, "Could not store partial results");
            }
        }
        if let Err(e) = self.store.set_status(run_id, RunStatus::Failed) {
            warn!(run_id = %run_id, error = %e, "Could not mark run failed");
        }
    }
}

fn store_error<E: std::error::Error>(e: E) -> AgentError {
    AgentError::Store(e.to_string())
}
