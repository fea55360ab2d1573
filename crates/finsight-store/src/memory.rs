//! In-memory audit trail
//!
//! Same semantics as [`SqliteAuditStore`](crate::SqliteAuditStore), without
//! persistence. Used by tests and by the CLI when no database is configured.

use crate::{ensure_mutable, StoreError};
use finsight_domain::traits::AuditStore;
use finsight_domain::{
    now_millis, ResultAggregate, RunId, RunRecord, RunStatus, RunWithLogs, TraceLogEntry,
};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct State {
    next_run_id: i64,
    next_log_id: i64,
    runs: BTreeMap<RunId, RunRecord>,
    logs: BTreeMap<RunId, Vec<TraceLogEntry>>,
}

/// Audit store kept entirely in memory
#[derive(Default)]
pub struct MemoryAuditStore {
    state: RwLock<State>,
}

impl MemoryAuditStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("state lock poisoned".to_string()))
    }

    /// Mutable access to a run that may still change
    fn mutable_run(state: &mut State, run_id: RunId) -> Result<&mut RunRecord, StoreError> {
        ensure_mutable(run_id, state.runs.get(&run_id).map(|run| run.status))?;
        state
            .runs
            .get_mut(&run_id)
            .ok_or(StoreError::RunNotFound(run_id))
    }
}

impl AuditStore for MemoryAuditStore {
    type Error = StoreError;

    fn create_run(&self, filename: &str) -> Result<RunRecord, Self::Error> {
        let mut state = self.write()?;
        state.next_run_id += 1;
        let run = RunRecord::new(RunId(state.next_run_id), filename, now_millis());
        state.runs.insert(run.id, run.clone());
        state.logs.insert(run.id, Vec::new());
        Ok(run)
    }

    fn append_log(
        &self,
        run_id: RunId,
        node_name: &str,
        message: &str,
    ) -> Result<TraceLogEntry, Self::Error> {
        let mut state = self.write()?;
        if !state.runs.contains_key(&run_id) {
            return Err(StoreError::RunNotFound(run_id));
        }

        state.next_log_id += 1;
        let entry = TraceLogEntry {
            id: state.next_log_id,
            run_id,
            node_name: node_name.to_string(),
            message: message.to_string(),
            timestamp: now_millis(),
        };
        state.logs.entry(run_id).or_default().push(entry.clone());
        Ok(entry)
    }

    fn set_task(&self, run_id: RunId, current_task: &str) -> Result<(), Self::Error> {
        let mut state = self.write()?;
        Self::mutable_run(&mut state, run_id)?.current_task = current_task.to_string();
        Ok(())
    }

    fn set_status(&self, run_id: RunId, status: RunStatus) -> Result<(), Self::Error> {
        let mut state = self.write()?;
        let run = Self::mutable_run(&mut state, run_id)?;
        run.status = status;
        if status.is_terminal() {
            run.end_time = Some(now_millis());
        }
        Ok(())
    }

    fn set_results(&self, run_id: RunId, results: &ResultAggregate) -> Result<(), Self::Error> {
        let mut state = self.write()?;
        let run = Self::mutable_run(&mut state, run_id)?;
        if run.results.is_some() {
            return Err(StoreError::ResultsAlreadySet(run_id));
        }
        run.results = Some(results.clone());
        Ok(())
    }

    fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>, Self::Error> {
        Ok(self.read()?.runs.get(&run_id).cloned())
    }

    fn get_run_with_logs(&self, run_id: RunId) -> Result<Option<RunWithLogs>, Self::Error> {
        let state = self.read()?;
        Ok(state.runs.get(&run_id).map(|run| RunWithLogs {
            run: run.clone(),
            logs: state.logs.get(&run_id).cloned().unwrap_or_default(),
        }))
    }

    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, Self::Error> {
        Ok(self
            .read()?
            .runs
            .values()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    fn delete_run(&self, run_id: RunId) -> Result<bool, Self::Error> {
        let mut state = self.write()?;
        state.logs.remove(&run_id);
        Ok(state.runs.remove(&run_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let store = MemoryAuditStore::new();
        let a = store.create_run("a.pdf").unwrap();
        let b = store.create_run("b.pdf").unwrap();
        assert!(b.id > a.id);

        let listed: Vec<_> = store.list_runs(10).unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(listed, vec![b.id, a.id]);
    }

    #[test]
    fn test_terminal_guard() {
        let store = MemoryAuditStore::new();
        let run = store.create_run("a.pdf").unwrap();
        store.set_status(run.id, RunStatus::Failed).unwrap();

        assert!(matches!(
            store.set_status(run.id, RunStatus::Completed),
            Err(StoreError::RunFinalized(_))
        ));
        assert!(matches!(
            store.set_task(run.id, "Processing: x"),
            Err(StoreError::RunFinalized(_))
        ));
        // Logs are still accepted
        assert!(store.append_log(run.id, "Orchestrator", "late entry").is_ok());

        let stored = store.get_run(run.id).unwrap().unwrap();
        assert_eq!(stored.status, RunStatus::Failed);
        assert!(stored.end_time.is_some());
    }

    #[test]
    fn test_delete_cascades_logs() {
        let store = MemoryAuditStore::new();
        let run = store.create_run("a.pdf").unwrap();
        store.append_log(run.id, "Planner", "Processing: x").unwrap();

        assert!(store.delete_run(run.id).unwrap());
        assert!(store.get_run_with_logs(run.id).unwrap().is_none());
        assert!(matches!(
            store.append_log(run.id, "Planner", "x"),
            Err(StoreError::RunNotFound(_))
        ));
        assert!(!store.delete_run(run.id).unwrap());
    }
}
