//! Run configuration, read once from the environment

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::scraper::torrent_search::DEFAULT_SEARCH_URL;

pub const DEFAULT_FEED_URL: &str = "http://legendafacil.com/feed/";
pub const DEFAULT_DOWNLOAD_COMMAND: &str = "transmission-remote";
pub const DEFAULT_TRANSMISSION_HOST: &str = "127.0.0.1";
pub const DEFAULT_TRANSMISSION_PORT: u16 = 9091;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadClientKind {
    /// External `transmission-remote` style program
    Remote,
    /// Transmission JSON-RPC
    Rpc,
}

impl FromStr for DownloadClientKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(DownloadClientKind::Remote),
            "rpc" => Ok(DownloadClientKind::Rpc),
            other => bail!("Unknown download client '{}', expected 'remote' or 'rpc'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub home: PathBuf,
    pub database_path: PathBuf,
    pub feed_url: String,
    /// Search URL with a `{query}` placeholder
    pub torrent_search_url: String,
    pub download_client: DownloadClientKind,
    pub download_command: String,
    pub transmission_host: String,
    pub transmission_port: u16,
    /// Where Transmission should put new torrents; its own default when unset
    pub transmission_download_dir: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let home = PathBuf::from(var("ASSED_HOME").unwrap_or_else(|| ".".to_string()));
        let database_path = var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join("databases").join("assed.db"));

        let download_client = match var("DOWNLOAD_CLIENT") {
            Some(value) => value.parse()?,
            None => DownloadClientKind::Remote,
        };

        let transmission_port = match var("TRANSMISSION_PORT") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid TRANSMISSION_PORT '{}'", value))?,
            None => DEFAULT_TRANSMISSION_PORT,
        };

        let timeout_secs = match var("HTTP_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid HTTP_TIMEOUT_SECS '{}'", value))?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            home,
            database_path,
            feed_url: var("FEED_URL").unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
            torrent_search_url: var("TORRENT_SEARCH_URL")
                .unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            download_client,
            download_command: var("DOWNLOAD_COMMAND")
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_COMMAND.to_string()),
            transmission_host: var("TRANSMISSION_HOST")
                .unwrap_or_else(|| DEFAULT_TRANSMISSION_HOST.to_string()),
            transmission_port,
            transmission_download_dir: var("TRANSMISSION_DOWNLOAD_DIR"),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn databases_dir(&self) -> PathBuf {
        self.home.join("databases")
    }

    pub fn subtitles_dir(&self) -> PathBuf {
        self.home.join("subtitles")
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.home.join("downloads")
    }

    /// Where the download client leaves finished torrents
    pub fn completed_dir(&self) -> PathBuf {
        self.home.join("completed")
    }

    pub fn finalized_dir(&self) -> PathBuf {
        self.home.join("finalized")
    }

    pub fn transmission_rpc_url(&self) -> String {
        format!(
            "http://{}:{}/transmission/rpc",
            self.transmission_host, self.transmission_port
        )
    }

    /// Creates the working directories, plus the database's parent
    pub fn ensure_directories(&self) -> Result<()> {
        let mut dirs = vec![
            self.databases_dir(),
            self.subtitles_dir(),
            self.downloads_dir(),
            self.completed_dir(),
            self.finalized_dir(),
        ];
        if let Some(parent) = self.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            dirs.push(parent.to_path_buf());
        }

        for dir in &dirs {
            create_dir(dir)?;
        }

        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Unable to create directory {}", dir.display()))
}
