//! Serve command implementation.

use crate::error::Result;
use finsight_server::{config::ServerConfig, start_server};

/// Execute the serve command.
pub async fn execute_serve(config: ServerConfig) -> Result<()> {
    start_server(config).await?;
    Ok(())
}
