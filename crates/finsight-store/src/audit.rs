//! SQLite-backed audit trail

use crate::{ensure_mutable, StoreError};
use finsight_domain::traits::AuditStore;
use finsight_domain::{
    now_millis, ResultAggregate, RunId, RunRecord, RunStatus, RunWithLogs, TraceLogEntry,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

const RUN_COLUMNS: &str =
    "id, filename, status, current_task, start_time, end_time, results";

/// SQLite-based implementation of AuditStore
///
/// The connection sits behind a mutex, so one store can be shared across
/// concurrently executing runs. Each guarded update reads the run's status
/// and writes under the same lock.
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    /// Open (or create) the database at `path`
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn()?.execute_batch(schema)?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("connection lock poisoned".to_string()))
    }

    fn status_of(conn: &Connection, run_id: RunId) -> Result<Option<RunStatus>, StoreError> {
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM extraction_runs WHERE id = ?1",
                params![run_id.0],
                |row| row.get(0),
            )
            .optional()?;

        status
            .map(|s| {
                RunStatus::parse(&s)
                    .ok_or_else(|| StoreError::InvalidData(format!("Unknown run status: {}", s)))
            })
            .transpose()
    }

    fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
        let status: String = row.get(2)?;
        let status = RunStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                Box::new(StoreError::InvalidData(format!("Unknown run status: {}", status))),
            )
        })?;

        let results: Option<String> = row.get(6)?;
        let results = results
            .map(|json| serde_json::from_str::<ResultAggregate>(&json))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(RunRecord {
            id: RunId(row.get(0)?),
            filename: row.get(1)?,
            status,
            current_task: row.get(3)?,
            start_time: row.get::<_, i64>(4)? as u64,
            end_time: row.get::<_, Option<i64>>(5)?.map(|t| t as u64),
            results,
        })
    }

    fn load_run(conn: &Connection, run_id: RunId) -> Result<Option<RunRecord>, StoreError> {
        let sql = format!("SELECT {} FROM extraction_runs WHERE id = ?1", RUN_COLUMNS);
        Ok(conn
            .query_row(&sql, params![run_id.0], Self::row_to_run)
            .optional()?)
    }
}

impl AuditStore for SqliteAuditStore {
    type Error = StoreError;

    fn create_run(&self, filename: &str) -> Result<RunRecord, Self::Error> {
        let conn = self.conn()?;
        let start_time = now_millis();
        let run = RunRecord::new(RunId(0), filename, start_time);

        conn.execute(
            "INSERT INTO extraction_runs (filename, status, current_task, start_time)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &run.filename,
                run.status.as_str(),
                &run.current_task,
                start_time as i64
            ],
        )?;

        let id = RunId(conn.last_insert_rowid());
        debug!(run_id = %id, filename, "Created run");
        Ok(RunRecord { id, ..run })
    }

    fn append_log(
        &self,
        run_id: RunId,
        node_name: &str,
        message: &str,
    ) -> Result<TraceLogEntry, Self::Error> {
        let conn = self.conn()?;
        if Self::status_of(&conn, run_id)?.is_none() {
            return Err(StoreError::RunNotFound(run_id));
        }

        let timestamp = now_millis();
        conn.execute(
            "INSERT INTO trace_logs (run_id, node_name, message, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![run_id.0, node_name, message, timestamp as i64],
        )?;

        Ok(TraceLogEntry {
            id: conn.last_insert_rowid(),
            run_id,
            node_name: node_name.to_string(),
            message: message.to_string(),
            timestamp,
        })
    }

    fn set_task(&self, run_id: RunId, current_task: &str) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        ensure_mutable(run_id, Self::status_of(&conn, run_id)?)?;

        conn.execute(
            "UPDATE extraction_runs SET current_task = ?1 WHERE id = ?2",
            params![current_task, run_id.0],
        )?;
        Ok(())
    }

    fn set_status(&self, run_id: RunId, status: RunStatus) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        ensure_mutable(run_id, Self::status_of(&conn, run_id)?)?;

        let end_time = status.is_terminal().then(|| now_millis() as i64);
        conn.execute(
            "UPDATE extraction_runs SET status = ?1, end_time = ?2 WHERE id = ?3",
            params![status.as_str(), end_time, run_id.0],
        )?;
        Ok(())
    }

    fn set_results(&self, run_id: RunId, results: &ResultAggregate) -> Result<(), Self::Error> {
        let conn = self.conn()?;
        ensure_mutable(run_id, Self::status_of(&conn, run_id)?)?;

        let existing: Option<String> = conn.query_row(
            "SELECT results FROM extraction_runs WHERE id = ?1",
            params![run_id.0],
            |row| row.get(0),
        )?;
        if existing.is_some() {
            return Err(StoreError::ResultsAlreadySet(run_id));
        }

        let json = serde_json::to_string(results)
            .map_err(|e| StoreError::InvalidData(format!("Failed to serialize results: {}", e)))?;
        conn.execute(
            "UPDATE extraction_runs SET results = ?1 WHERE id = ?2",
            params![json, run_id.0],
        )?;
        Ok(())
    }

    fn get_run(&self, run_id: RunId) -> Result<Option<RunRecord>, Self::Error> {
        let conn = self.conn()?;
        Self::load_run(&conn, run_id)
    }

    fn get_run_with_logs(&self, run_id: RunId) -> Result<Option<RunWithLogs>, Self::Error> {
        let conn = self.conn()?;
        let Some(run) = Self::load_run(&conn, run_id)? else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT id, run_id, node_name, message, timestamp
             FROM trace_logs WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let logs = stmt
            .query_map(params![run_id.0], |row| {
                Ok(TraceLogEntry {
                    id: row.get(0)?,
                    run_id: RunId(row.get(1)?),
                    node_name: row.get(2)?,
                    message: row.get(3)?,
                    timestamp: row.get::<_, i64>(4)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(RunWithLogs { run, logs }))
    }

    fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>, Self::Error> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM extraction_runs ORDER BY id DESC LIMIT ?1",
            RUN_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let runs = stmt
            .query_map(params![limit], Self::row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    fn delete_run(&self, run_id: RunId) -> Result<bool, Self::Error> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM extraction_runs WHERE id = ?1",
            params![run_id.0],
        )?;
        Ok(removed > 0)
    }
}
