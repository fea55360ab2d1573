//! Rate command implementation.

use crate::error::Result;
use crate::output::Formatter;
use finsight_server::{build_converter, config::ServerConfig};

/// Execute the rate command.
///
/// Falls back to the fixed rate when the source is unreachable, exactly as a
/// run would.
pub async fn execute_rate(config: &ServerConfig, formatter: &Formatter) -> Result<()> {
    let converter = build_converter(&config.currency)?;
    let rate = converter.rate().await;

    println!("{}", formatter.format_rate(rate));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[tokio::test]
    async fn test_rate_falls_back_when_source_is_unreachable() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServerConfig::default_test_config(dir.path());
        config.currency.endpoint = "http://127.0.0.1:9/latest/INR".to_string();
        config.currency.timeout_secs = 1;

        let converter = build_converter(&config.currency).unwrap();
        assert_eq!(converter.rate().await, 0.012);

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        execute_rate(&config, &formatter).await.unwrap();
    }
}
