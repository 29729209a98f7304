//! Acquisition of a gated-in episode
//!
//! Nothing is written to disk or history until both the magnet and the
//! subtitle are in hand. A missing magnet or subtitle abandons the entry for
//! this run without trying the next candidate.

use anyhow::Result;

use super::{DownloadTrigger, EpisodeEntry, MagnetLookup, Outcome, Pipeline, SubtitleFetcher};
use crate::db::{self, models::Show};
use crate::scraper::content::extract_candidates;

impl<M, S, D> Pipeline<'_, M, S, D>
where
    M: MagnetLookup,
    S: SubtitleFetcher,
    D: DownloadTrigger,
{
    /// Matches, fetches, records and triggers one episode of `show`
    pub async fn process(&self, entry: &EpisodeEntry, show: &Show) -> Result<Outcome> {
        let candidates = extract_candidates(&entry.content);
        tracing::debug!(
            "{} candidate release(s) for '{}'",
            candidates.len(),
            entry.title
        );

        let Some(selected) = self.patterns.select(&candidates) else {
            tracing::info!("{} ... no release matched this episode", entry.title);
            db::record_mismatch(self.conn, &entry.title, show.id, db::now_timestamp())?;
            return Ok(Outcome::Mismatched);
        };

        let release = selected.candidate.release_name().to_string();
        tracing::debug!(
            "'{}' matched pattern #{} '{}'",
            release,
            selected.priority,
            selected.pattern.as_str()
        );

        let Some(magnet) = self.magnets.find_magnet(&release).await? else {
            tracing::info!(
                "{} ... matched release {} ... magnet not found",
                entry.title,
                release
            );
            return Ok(Outcome::MagnetNotFound { release });
        };

        let payload = match self.subtitles.fetch(&selected.candidate.source_link).await? {
            Some(payload) if !payload.is_empty() => payload,
            _ => {
                tracing::info!(
                    "{} ... matched release {} ... subtitle download failed",
                    entry.title,
                    release
                );
                return Ok(Outcome::SubtitleUnavailable { release });
            }
        };

        // The subtitle is only written once the title is claimed
        let identifier = selected.identifier();
        let recorded = db::record_download(
            self.conn,
            show.id,
            &entry.title,
            &magnet,
            db::now_timestamp(),
            || {
                let path = self.store.save(&identifier, &payload)?;
                tracing::debug!("Saved subtitle to {}", path.display());
                Ok(())
            },
        )?;

        if !recorded {
            tracing::info!("{} ... already processed", entry.title);
            return Ok(Outcome::AlreadyProcessed);
        }

        if let Err(e) = self.downloads.start(&magnet).await {
            tracing::warn!("Download client failed for '{}': {:#}", release, e);
        }

        tracing::info!("{} ... matched release {} ... OK", entry.title, release);

        Ok(Outcome::Downloaded { release, magnet })
    }
}
