//! Episode acquisition pipeline
//!
//! Feed entries go through the [`gate`], then the [`orchestrator`] picks a
//! release with the [`matcher`] and coordinates the fetchers. The
//! [`finalizer`] runs afterwards over the completed downloads.

pub mod finalizer;
pub mod gate;
pub mod matcher;
pub mod names;
pub mod orchestrator;

use std::future::Future;

use anyhow::Result;
use rusqlite::Connection;

use crate::storage::SubtitleStore;
use gate::{should_process, GateDecision, ShowRegistry};
use matcher::ReleasePatterns;
use names::strip_trailing_digits;

/// One subtitle release announcement, from the feed or a release page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeEntry {
    pub title: String,
    /// Category labels in document order, checked against the show registry
    pub categories: Vec<String>,
    /// Markup holding the table of candidate release links
    pub content: String,
}

/// A link to one video release group's subtitle for an episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRelease {
    pub display_name: String,
    /// Display name without the trailing size/seed annotation
    pub stripped_name: String,
    pub source_link: String,
}

impl CandidateRelease {
    pub fn new(display_name: &str, source_link: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            stripped_name: strip_trailing_digits(display_name.trim()).to_string(),
            source_link: source_link.to_string(),
        }
    }

    /// Stripped name without dangling separators, used for torrent search
    pub fn release_name(&self) -> &str {
        self.stripped_name
            .trim_matches(|c: char| c == '.' || c.is_whitespace())
    }
}

/// How one entry ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The show is not tracked
    Ignored,
    /// The title is already in the history
    AlreadyProcessed,
    /// Tracked show, but no candidate matched any release pattern
    Mismatched,
    /// Not recorded; the entry is retried on the next run
    MagnetNotFound { release: String },
    /// Not recorded; the entry is retried on the next run
    SubtitleUnavailable { release: String },
    Downloaded { release: String, magnet: String },
}

impl Outcome {
    pub fn matched(&self) -> bool {
        matches!(
            self,
            Outcome::MagnetNotFound { .. }
                | Outcome::SubtitleUnavailable { .. }
                | Outcome::Downloaded { .. }
        )
    }

    pub fn downloaded(&self) -> bool {
        matches!(self, Outcome::Downloaded { .. })
    }
}

/// Resolves a magnet link for a release name
pub trait MagnetLookup {
    fn find_magnet(&self, release_name: &str) -> impl Future<Output = Result<Option<String>>>;
}

/// Downloads the subtitle payload behind a release link
pub trait SubtitleFetcher {
    fn fetch(&self, source_link: &str) -> impl Future<Output = Result<Option<Vec<u8>>>>;
}

/// Hands a magnet link to the download client
pub trait DownloadTrigger {
    fn start(&self, magnet: &str) -> impl Future<Output = Result<()>>;
}

/// Everything one run needs, built once per invocation and borrowed here
pub struct Pipeline<'a, M, S, D> {
    pub conn: &'a Connection,
    pub registry: &'a ShowRegistry,
    pub patterns: &'a ReleasePatterns,
    pub store: &'a SubtitleStore,
    pub magnets: M,
    pub subtitles: S,
    pub downloads: D,
}

impl<M, S, D> Pipeline<'_, M, S, D>
where
    M: MagnetLookup,
    S: SubtitleFetcher,
    D: DownloadTrigger,
{
    /// Gates an entry and, if it passes, acquires it
    ///
    /// `show_override` is used when none of the entry's categories is
    /// tracked. Errors are fatal for the whole run.
    pub async fn handle(
        &self,
        entry: &EpisodeEntry,
        show_override: Option<&str>,
    ) -> Result<Outcome> {
        match should_process(self.conn, self.registry, entry, show_override)? {
            GateDecision::Ignored => Ok(Outcome::Ignored),
            GateDecision::AlreadyProcessed => Ok(Outcome::AlreadyProcessed),
            GateDecision::Proceed(show) => self.process(entry, show).await,
        }
    }

    /// Handles a batch of entries, returning how many were downloaded
    pub async fn handle_all(&self, entries: &[EpisodeEntry]) -> Result<usize> {
        let mut count = 0;

        for entry in entries {
            if self.handle(entry, None).await?.downloaded() {
                count += 1;
            }
        }

        Ok(count)
    }
}
