//! Runs command implementation.

use crate::cli::RunsArgs;
use crate::error::Result;
use crate::output::Formatter;
use finsight_domain::traits::AuditStore;
use finsight_server::config::ServerConfig;
use finsight_store::SqliteAuditStore;

/// Execute the runs command.
pub async fn execute_runs(args: RunsArgs, config: &ServerConfig, formatter: &Formatter) -> Result<()> {
    let store = SqliteAuditStore::new(&config.database_path)?;
    let runs = store.list_runs(args.limit.max(1))?;

    println!("{}", formatter.format_runs(&runs)?);
    Ok(())
}
