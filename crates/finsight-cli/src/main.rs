//! Finsight CLI - Command-line interface for annual report extraction.

use anyhow::Context;
use clap::Parser;
use finsight_cli::commands;
use finsight_cli::{config, Cli, Command, Formatter};

#[tokio::main]
async fn main() {
    finsight_server::init_tracing();

    if let Err(e) = run().await {
        let formatter = Formatter::new(finsight_cli::OutputFormat::Table, false);
        eprintln!("{}", formatter.error(&format!("{:#}", e)));
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load(cli.config.as_deref()).context("could not load configuration")?;
    let formatter = Formatter::new(cli.format.into(), !cli.no_color);

    match cli.command {
        Command::Run(args) => {
            let filename = args.filename.clone();
            commands::execute_run(args, &config, &formatter)
                .await
                .with_context(|| format!("run on {} failed", filename))?;
        }
        Command::Index(args) => {
            commands::execute_index(args, &config, &formatter).await?;
        }
        Command::Show(args) => {
            commands::execute_show(args, &config, &formatter).await?;
        }
        Command::Runs(args) => {
            commands::execute_runs(args, &config, &formatter).await?;
        }
        Command::Rate => {
            commands::execute_rate(&config, &formatter).await?;
        }
        Command::Serve => {
            commands::execute_serve(config).await?;
        }
    }

    Ok(())
}
