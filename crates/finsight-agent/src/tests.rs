//! Pipeline tests for the Agent

use crate::{Agent, AgentError, RunContext, TaskCatalog, EXTRACTOR, ORCHESTRATOR, PLANNER};
use finsight_currency::{CurrencyConverter, FixedRateSource};
use finsight_domain::traits::AuditStore;
use finsight_domain::{
    ResultAggregate, RunId, RunPhase, RunRecord, RunStatus, RunWithLogs, TaskDefinition,
    TaskKind, TraceLogEntry, FINISHED_TASK,
};
use finsight_extractor::ExtractorConfig;
use finsight_llm::MockProvider;
use finsight_store::{FileCorpusProvider, MemoryAuditStore, SqliteAuditStore, StoreError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const REVENUE: &str = "Consolidated Revenue (USD Billion)";
const EPS: &str = "Diluted Earnings Per Share (EPS in INR)";
const UTILIZATION: &str = "Employee Utilization Rate (excluding trainees)";
const RISKS: &str = "Top 2-3 most critical risks from the Management Discussion & Analysis";

const REVENUE_REPLY: &str =
    r#"{"status": "FOUND", "value": 255324, "unit": "INR Crores", "source_page": 12}"#;
const RISKS_REPLY: &str = r#"{"status": "FOUND", "key_risks": [{"risk_summary": "Client concentration"}, {"risk_summary": "Wage inflation"}], "source_page": 77}"#;

fn corpus(dir: &TempDir) -> FileCorpusProvider {
    let documents = dir.path().join("documents");
    fs::create_dir_all(&documents).unwrap();
    fs::write(
        documents.join("tcs_2024.json"),
        r#"{
            "pages": [
                {"page": 12, "text": "Revenue: ₹255,324 Crore for the financial year."},
                {"page": 30, "text": "Utilization excluding trainees was 85.2%."},
                {"page": 77, "text": "Principal risks include client concentration and wage inflation."}
            ]
        }"#,
    )
    .unwrap();
    FileCorpusProvider::new(documents, dir.path().join("corpus"))
}

fn agent<A: AuditStore>(
    llm: &MockProvider,
    dir: &TempDir,
    store: Arc<A>,
) -> Agent<MockProvider, FileCorpusProvider, A> {
    Agent::new(
        Arc::new(llm.clone()),
        Arc::new(corpus(dir)),
        store,
        Arc::new(CurrencyConverter::new(Arc::new(FixedRateSource::new(0.012)))),
        ExtractorConfig::default(),
    )
}

fn scripted() -> MockProvider {
    let llm = MockProvider::new("NOT FOUND");
    llm.add_structured_response(format!("ORIGINAL TASK: {}", REVENUE), REVENUE_REPLY);
    llm.add_structured_response(format!("ORIGINAL TASK: {}", RISKS), RISKS_REPLY);
    llm
}

fn messages<'a>(logs: &'a [TraceLogEntry], node: &str) -> Vec<&'a str> {
    logs.iter()
        .filter(|l| l.node_name == node)
        .map(|l| l.message.as_str())
        .collect()
}

#[tokio::test]
async fn test_full_run() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryAuditStore::new());
    let agent = agent(&scripted(), &dir, store.clone());

    let outcome = agent.run("tcs_2024.pdf").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!((outcome.stats.found, outcome.stats.not_found), (2, 4));

    let revenue = outcome.aggregate.consolidated_revenue.clone().unwrap();
    assert_eq!(revenue.value, Some(255_324.0));
    assert_eq!(revenue.unit.as_deref(), Some("INR Crores"));
    assert_eq!(revenue.converted_value, Some(30.64));
    assert_eq!(revenue.converted_unit.as_deref(), Some("USD Billion"));
    assert!(outcome.aggregate.diluted_eps.is_none());
    assert_eq!(outcome.aggregate.key_management_risks.len(), 2);

    let RunWithLogs { run, logs } = store.get_run_with_logs(outcome.run_id).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.current_task, FINISHED_TASK);
    assert!(run.end_time.is_some());
    assert_eq!(run.results, Some(outcome.aggregate.clone()));

    let planned = messages(&logs, PLANNER);
    assert_eq!(planned.len(), 6);
    assert_eq!(planned[0], format!("Processing: {}", REVENUE));
    assert_eq!(messages(&logs, ORCHESTRATOR)[0], "Index missing, indexing document");
    assert!(messages(&logs, EXTRACTOR)
        .contains(&"FOUND: 255324 INR Crores = 30.64 USD Billion (page 12)"));
    assert!(messages(&logs, EXTRACTOR).contains(&format!("NOT_FOUND: skipping '{}'", EPS).as_str()));
    assert!(logs.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_second_run_reuses_index() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryAuditStore::new());
    let agent = agent(&scripted(), &dir, store.clone()).with_queue(vec![REVENUE.to_string()]);

    agent.run("tcs_2024.pdf").await.unwrap();
    let second = agent.run("tcs_2024.pdf").await.unwrap();

    let logs = store.get_run_with_logs(second.run_id).unwrap().unwrap().logs;
    assert!(!messages(&logs, ORCHESTRATOR).contains(&"Index missing, indexing document"));
    assert_eq!(second.stats.found, 1);
}

#[tokio::test]
async fn test_task_failure_does_not_abort_run() {
    let dir = TempDir::new().unwrap();
    let llm = scripted();
    llm.add_structured_error(format!("ORIGINAL TASK: {}", EPS));
    let store = Arc::new(MemoryAuditStore::new());

    let outcome = agent(&llm, &dir, store.clone()).run("tcs_2024.pdf").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(outcome.stats.failed, 1);
    assert_eq!(outcome.stats.total(), 6);

    let logs = store.get_run_with_logs(outcome.run_id).unwrap().unwrap().logs;
    let failure = logs
        .iter()
        .position(|l| l.node_name == EXTRACTOR && l.message.starts_with("Failed:"))
        .expect("failure entry");
    let later = logs
        .iter()
        .position(|l| l.message == format!("Processing: {}", UTILIZATION))
        .unwrap();
    assert!(failure < later);
}

#[tokio::test]
async fn test_contextualizer_failure_is_per_task() {
    let dir = TempDir::new().unwrap();
    let llm = scripted();
    llm.add_error(format!("Task: {}", REVENUE));
    let store = Arc::new(MemoryAuditStore::new());

    let outcome = agent(&llm, &dir, store.clone()).run("tcs_2024.pdf").await.unwrap();
    assert_eq!(outcome.stats.failed, 1);
    assert!(outcome.aggregate.consolidated_revenue.is_none());
    assert_eq!(outcome.aggregate.key_management_risks.len(), 2);
}

#[tokio::test]
async fn test_unmapped_label_is_skipped() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryAuditStore::new());
    let agent = agent(&scripted(), &dir, store.clone())
        .with_queue(vec!["Dividend Payout Ratio".to_string(), REVENUE.to_string()]);

    let outcome = agent.run("tcs_2024.pdf").await.unwrap();
    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!((outcome.stats.skipped, outcome.stats.found), (1, 1));

    let logs = store.get_run_with_logs(outcome.run_id).unwrap().unwrap().logs;
    assert!(messages(&logs, PLANNER)
        .contains(&"No task definition for 'Dividend Payout Ratio', skipping"));
}

#[tokio::test]
async fn test_missing_document_fails_run() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryAuditStore::new());

    let result = agent(&scripted(), &dir, store.clone()).run("absent.pdf").await;
    assert!(matches!(result, Err(AgentError::DocumentNotFound(ref name)) if name == "absent.pdf"));

    let run = store.list_runs(1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.end_time.is_some());
    assert!(run.results.is_none());

    let logs = store.get_run_with_logs(run.id).unwrap().unwrap().logs;
    assert_eq!(
        messages(&logs, ORCHESTRATOR).last().copied(),
        Some("Run failed: Document not found: absent.pdf")
    );
}

#[tokio::test]
async fn test_merge_policy() {
    let dir = TempDir::new().unwrap();
    let llm = scripted();
    llm.add_structured_response(
        "ORIGINAL TASK: Standalone Revenue",
        r#"{"status": "FOUND", "value": 202359, "unit": "INR Crores", "source_page": 140}"#,
    );
    llm.add_structured_response(
        "ORIGINAL TASK: Risks from the Annexure",
        r#"{"status": "FOUND", "key_risks": ["Currency volatility"], "source_page": 201}"#,
    );
    let catalog = TaskCatalog::default()
        .extend(vec![
            TaskDefinition::new("Standalone Revenue", TaskKind::Revenue, "")
                .with_target_unit("USD Billion"),
            TaskDefinition::new("Risks from the Annexure", TaskKind::KeyRisks, ""),
        ])
        .unwrap();
    let store = Arc::new(MemoryAuditStore::new());
    let agent = agent(&llm, &dir, store)
        .with_catalog(catalog)
        .with_queue(vec![
            REVENUE.to_string(),
            RISKS.to_string(),
            "Standalone Revenue".to_string(),
            "Risks from the Annexure".to_string(),
        ]);

    let aggregate = agent.run("tcs_2024.pdf").await.unwrap().aggregate;

    // Scalars: last write wins
    let revenue = aggregate.consolidated_revenue.unwrap();
    assert_eq!(revenue.value, Some(202_359.0));
    assert_eq!(revenue.source_page, Some(140));

    // Lists: every element accumulates
    let risks: Vec<(&str, Option<u32>)> = aggregate
        .key_management_risks
        .iter()
        .map(|r| (r.risk_summary.as_str(), r.source_page))
        .collect();
    assert_eq!(
        risks,
        vec![
            ("Client concentration", Some(77)),
            ("Wage inflation", Some(77)),
            ("Currency volatility", Some(201)),
        ]
    );
}

#[tokio::test]
async fn test_concurrent_runs_on_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(SqliteAuditStore::new(dir.path().join("audit.db")).unwrap());
    let agent = agent(&scripted(), &dir, store.clone());

    // Index once so both runs only open the corpus
    agent.run("tcs_2024.pdf").await.unwrap();
    let (a, b) = tokio::join!(agent.run("tcs_2024.pdf"), agent.run("tcs_2024.pdf"));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.run_id, b.run_id);

    for run_id in [a.run_id, b.run_id] {
        let with_logs = store.get_run_with_logs(run_id).unwrap().unwrap();
        assert_eq!(with_logs.run.status, RunStatus::Completed);
        assert_eq!(messages(&with_logs.logs, PLANNER).len(), 6);
        assert!(with_logs.logs.iter().all(|l| l.run_id == run_id));
    }
}

/// Store that fails `set_task` for one task label
struct FlakyStore {
    inner: MemoryAuditStore,
    poison: &'static str,
    refused_status: Option<RunStatus>,
}

impl AuditStore for FlakyStore {
    type Error = StoreError;

    fn create_run(&self, filename: &str) -> Result<RunRecord, StoreError> {
        self.inner.create_run(filename)
    }

    fn append_log(&self, run_id: RunId, node: &str, message: &str) -> Result<TraceLogEntry, StoreError> {
        self.inner.append_log(run_id, node, message)
    }

    fn set_task(&self, run_id: RunId, current_task: &str) -> Result<(), StoreError> {
        if current_task.contains(self.poison) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.set_task(run_id, current_task)
    }

    fn set_status(&self, run_id: RunId, status: RunStatus) -> Result<(), StoreError> {
        if self.refused_status == Some(status) {
            return Err(StoreError::Unavailable("disk full".to_string()));
        }
        self.inner.set_status(run_id, status)
    }

    fn set_results(&self, run_id: RunId, results: &ResultAggregate) -> Result<(), StoreError> {
        self.inner.set_results(run_id, results)
    }

    fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>, StoreError> {
        self.inner.get_run(run_id)
    }

    fn get_run_with_logs(&self, run_id: RunId) -> Result<Option<RunWithLogs>, StoreError> {
        self.inner.get_run_with_logs(run_id)
    }

    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, StoreError> {
        self.inner.list_runs(limit)
    }

    fn delete_run(&self, run_id: RunId) -> Result<bool, StoreError> {
        self.inner.delete_run(run_id)
    }
}

#[tokio::test]
async fn test_store_fault_fails_run_with_partial_results() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlakyStore {
        inner: MemoryAuditStore::new(),
        poison: "Diluted Earnings",
        refused_status: None,
    });

    let result = agent(&scripted(), &dir, store.clone()).run("tcs_2024.pdf").await;
    assert!(matches!(result, Err(AgentError::Store(_))));

    let run = store.list_runs(1).unwrap().remove(0);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.end_time.is_some());
    let partial = run.results.expect("partial results stored");
    assert!(partial.consolidated_revenue.is_some());
    assert!(partial.key_management_risks.is_empty());
}

#[tokio::test]
async fn test_unpersisted_completion_fails_run() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(FlakyStore {
        inner: MemoryAuditStore::new(),
        poison: "no such task",
        refused_status: Some(RunStatus::Completed),
    });
    let agent = agent(&scripted(), &dir, store.clone());

    // The phase only moves once the store has accepted the status
    let run = store.create_run("tcs_2024.pdf").unwrap();
    let mut context = RunContext::new(run.id, &run.filename, vec![]);
    context.advance(RunPhase::Running).unwrap();
    assert!(matches!(agent.complete(&mut context), Err(AgentError::Store(_))));
    assert_eq!(context.phase(), RunPhase::Running);

    let result = agent.run("tcs_2024.pdf").await;
    assert!(matches!(result, Err(AgentError::Store(_))));

    let failed = store.list_runs(1).unwrap().remove(0);
    assert_eq!(failed.status, RunStatus::Failed);
    assert!(failed.end_time.is_some());
    let logs = store.get_run_with_logs(failed.id).unwrap().unwrap().logs;
    assert!(logs.iter().any(|entry| entry.message.starts_with("Run failed:")));
}
