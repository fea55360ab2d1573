//! Run command implementation.

use crate::cli::RunArgs;
use crate::error::Result;
use crate::output::Formatter;
use finsight_server::{build_agent, config::ServerConfig};
use tracing::info;

/// Execute the run command.
///
/// Runs the queue in the foreground; per-task failures are part of the
/// outcome, only run-level faults are returned as errors.
pub async fn execute_run(args: RunArgs, config: &ServerConfig, formatter: &Formatter) -> Result<()> {
    let mut agent = build_agent(config)?;
    if !args.tasks.is_empty() {
        agent = agent.with_queue(args.tasks);
    }

    info!(filename = %args.filename, tasks = agent.queue().len(), "Starting run");
    let outcome = agent.run(&args.filename).await?;

    println!("{}", formatter.format_outcome(&outcome)?);
    Ok(())
}
