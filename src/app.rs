//! One invocation: bootstrap, acquire, finalize

use anyhow::Result;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::pipeline::finalizer::Finalizer;
use crate::pipeline::gate::ShowRegistry;
use crate::pipeline::matcher::ReleasePatterns;
use crate::pipeline::{DownloadTrigger, MagnetLookup, Pipeline, SubtitleFetcher};
use crate::scraper::content::fetch_release_page;
use crate::scraper::feed::fetch_feed;
use crate::scraper::subtitle::SubtitleDownloader;
use crate::scraper::torrent_search::TorrentSearch;
use crate::scraper::transmission::DownloadClient;
use crate::scraper::build_http_client;
use crate::storage::SubtitleStore;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries that ended with a download
    pub downloaded: usize,
    /// Video and subtitle pairs moved to the finalized directory
    pub finalized: usize,
}

/// Processes the feed, or the single release page at `url`, then finalizes
/// whatever the download client has completed
pub async fn run(config: &Config, url: Option<&str>, show: Option<&str>) -> Result<RunSummary> {
    config.ensure_directories()?;
    info!("- Directories OK");

    let conn = db::open_connection(&config.database_path)?;
    info!("- SQLite OK");

    let registry = ShowRegistry::new(db::get_all_shows(&conn)?);
    info!("- Shows List OK ({})", registry.len());

    let patterns = ReleasePatterns::from_rows(&db::get_release_patterns(&conn)?)?;
    info!("- Release patterns OK ({})", patterns.len());

    let client = build_http_client(config.http_timeout)?;
    let store = SubtitleStore::new(config.subtitles_dir());

    let pipeline = Pipeline {
        conn: &conn,
        registry: &registry,
        patterns: &patterns,
        store: &store,
        magnets: TorrentSearch::new(client.clone(), &config.torrent_search_url),
        subtitles: SubtitleDownloader::new(client.clone()),
        downloads: DownloadClient::from_config(config, client.clone()),
    };

    let downloaded = match url {
        Some(url) => process_from_url(&pipeline, &client, url, show).await?,
        None => process_from_feed(&pipeline, &client, &config.feed_url).await?,
    };

    let finalized =
        Finalizer::new(&store, config.finalized_dir()).finalize(&config.completed_dir());
    if finalized > 0 {
        info!("Finalized {} episode(s)", finalized);
    }

    Ok(RunSummary {
        downloaded,
        finalized,
    })
}

async fn process_from_feed<M, S, D>(
    pipeline: &Pipeline<'_, M, S, D>,
    client: &Client,
    feed_url: &str,
) -> Result<usize>
where
    M: MagnetLookup,
    S: SubtitleFetcher,
    D: DownloadTrigger,
{
    let entries = fetch_feed(client, feed_url).await?;
    info!("Feed has {} item(s)", entries.len());

    pipeline.handle_all(&entries).await
}

async fn process_from_url<M, S, D>(
    pipeline: &Pipeline<'_, M, S, D>,
    client: &Client,
    url: &str,
    show: Option<&str>,
) -> Result<usize>
where
    M: MagnetLookup,
    S: SubtitleFetcher,
    D: DownloadTrigger,
{
    let entry = fetch_release_page(client, url).await?;

    if entry.title.is_empty() {
        warn!("Unable to process subtitle URL {}", url);
        return Ok(0);
    }

    let outcome = pipeline.handle(&entry, show).await?;

    Ok(usize::from(outcome.downloaded()))
}
