pub mod content;
pub mod feed;
pub mod subtitle;
pub mod torrent_search;
pub mod transmission;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

/// Builds the HTTP client shared by every fetcher of a run
///
/// Idle connections per host are limited to keep memory low on small
/// machines.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(2)
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}
