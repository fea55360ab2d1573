//! Finsight server binary
//!
//! Starts the extraction HTTP service.

use finsight_server::{config::ServerConfig, init_tracing, start_server, ServerError};
use std::env;
use std::process;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ServerConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using defaults");
        eprintln!("Usage: finsight-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default()
    };

    start_server(config).await
}

fn print_help() {
    println!("Finsight Server - Annual report extraction service");
    println!();
    println!("USAGE:");
    println!("    finsight-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    bind_address, bind_port     Listener (default 127.0.0.1:8000)");
    println!("    database_path               SQLite audit database");
    println!("    documents_dir, corpus_dir   Prepared documents and built corpora");
    println!("    [llm] [currency] [extractor] [agent]");
    println!();
    println!("    Log level is read from RUST_LOG (default: info).");
    println!();
}
