//! Index command implementation.

use crate::cli::IndexArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use finsight_domain::traits::CorpusProvider;
use finsight_server::config::ServerConfig;
use finsight_store::{FileCorpusProvider, VectorCorpus};

/// Execute the index command.
pub async fn execute_index(
    args: IndexArgs,
    config: &ServerConfig,
    formatter: &Formatter,
) -> Result<()> {
    let provider = FileCorpusProvider::new(&config.documents_dir, &config.corpus_dir);

    let corpora = provider
        .index(&args.filename)
        .await?
        .ok_or_else(|| CliError::DocumentNotFound(args.filename.clone()))?;

    let tables = corpora.table.as_ref().map_or(0, VectorCorpus::len);
    println!(
        "{}",
        formatter.success(&format!(
            "Indexed {}: {} text snippets, {} table snippets",
            args.filename,
            corpora.text.len(),
            tables
        ))
    );
    Ok(())
}
