//! Show command implementation.

use crate::cli::ShowArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use finsight_domain::traits::AuditStore;
use finsight_domain::RunId;
use finsight_server::config::ServerConfig;
use finsight_store::SqliteAuditStore;

/// Execute the show command.
pub async fn execute_show(args: ShowArgs, config: &ServerConfig, formatter: &Formatter) -> Result<()> {
    let store = SqliteAuditStore::new(&config.database_path)?;
    let run = store
        .get_run_with_logs(RunId(args.run_id))?
        .ok_or(CliError::RunNotFound(args.run_id))?;

    println!("{}", formatter.format_run(&run, !args.no_logs)?);
    Ok(())
}
