//! Configuration file resolution for the CLI.
//!
//! The CLI reads the same `ServerConfig` file as the server. Lookup order:
//! `--config`, then `FINSIGHT_CONFIG` (both handled by clap), then
//! `~/.finsight/config.toml`. Without any file the defaults apply.

use crate::error::{CliError, Result};
use finsight_server::config::ServerConfig;
use std::path::{Path, PathBuf};

/// Get the default configuration file path.
pub fn default_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    Ok(home.join(".finsight").join("config.toml"))
}

/// Load the configuration named on the command line, or the default file.
///
/// An explicit path must exist; a missing default file yields the defaults.
pub fn load(explicit: Option<&str>) -> Result<ServerConfig> {
    match explicit {
        Some(path) => load_file(Path::new(path)),
        None => {
            let path = default_path()?;
            if path.exists() {
                load_file(&path)
            } else {
                Ok(ServerConfig::default())
            }
        }
    }
}

fn load_file(path: &Path) -> Result<ServerConfig> {
    ServerConfig::from_file(path)
        .map_err(|e| CliError::Config(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_default_path() {
        let path = default_path().unwrap();
        assert!(path.ends_with(".finsight/config.toml"));
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("finsight.toml");
        fs::write(&path, "bind_port = 9100\n[extractor]\ntop_k = 3\n").unwrap();

        let config = load(path.to_str()).unwrap();
        assert_eq!(config.bind_port, 9100);
        assert_eq!(config.extractor.top_k, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(matches!(load(path.to_str()), Err(CliError::Config(_))));
    }
}
