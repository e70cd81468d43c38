//! Command-line configuration.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;
use directories::BaseDirs;

use crate::api::{BooksApi, DEFAULT_BASE_URL};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".book-dashboard";
/// Log file name stored inside the application data directory.
const LOG_FILE_NAME: &str = "dashboard.log";

/// Terminal dashboard for a REST `/books` collection.
#[derive(Debug, Clone, Parser)]
#[command(name = "book-dashboard", version, about)]
pub struct Config {
    /// Collection endpoint serving GET/POST and PUT/DELETE on `{url}/{id}`.
    #[arg(long, default_value = DEFAULT_BASE_URL, value_parser = parse_base_url)]
    pub base_url: String,

    /// Where to write logs. Defaults to ~/.book-dashboard/dashboard.log.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log filter, e.g. `info` or `book_dashboard=debug`.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// The configured log file, or the default inside the user's home.
    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log_file {
            return Ok(path.clone());
        }
        let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
        Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(LOG_FILE_NAME))
    }
}

/// Reject a bad endpoint while parsing flags, before the terminal is taken over.
fn parse_base_url(raw: &str) -> Result<String, String> {
    BooksApi::new(raw)
        .map(|_| raw.to_string())
        .map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_service() {
        let config = Config::try_parse_from(["book-dashboard"]).unwrap();
        assert_eq!(config.base_url, "http://localhost:3001/books");
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "book-dashboard",
            "--base-url",
            "http://10.0.0.5:8080/books",
            "--log-file",
            "/tmp/books.log",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.5:8080/books");
        assert_eq!(config.log_path().unwrap(), PathBuf::from("/tmp/books.log"));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn unusable_base_url_is_a_usage_error() {
        for bad in ["ftp://example.com/books", "not a url", "mailto:books@example.com"] {
            let err = Config::try_parse_from(["book-dashboard", "--base-url", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation, "{bad}");
        }
    }
}
