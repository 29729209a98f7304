//! Subtitle files waiting for their video
//!
//! A flat directory of `<identifier>.srt` files written by the orchestrator
//! and consumed by the finalizer.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::pipeline::names::{same_identifier, subtitle_stem};

#[derive(Debug, Clone)]
pub struct SubtitleStore {
    dir: PathBuf,
}

impl SubtitleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes `<identifier>.srt`, replacing any previous file of that name
    ///
    /// The payload lands in a temporary file first so a finalizer running
    /// in parallel never sees a partial subtitle.
    pub fn save(&self, identifier: &str, payload: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(format!("{}.srt", identifier));
        let partial = self.dir.join(format!(".{}.srt.part", identifier));

        fs::write(&partial, payload)
            .with_context(|| format!("Unable to save subtitle file {}", partial.display()))?;
        fs::rename(&partial, &path)
            .with_context(|| format!("Unable to save subtitle file {}", path.display()))?;

        Ok(path)
    }

    /// Finds the stored subtitle whose normalized name equals `identifier`
    ///
    /// Separators and case are ignored, so "A.B.01" finds "a b 01.srt".
    /// An unreadable directory is treated as empty.
    pub fn find(&self, identifier: &str) -> Option<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Unable to list subtitles in {}: {}", self.dir.display(), e);
                return None;
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| !name.starts_with('.'))
            .collect();
        names.sort();

        names
            .into_iter()
            .find(|name| subtitle_stem(name).is_some_and(|stem| same_identifier(stem, identifier)))
            .map(|name| self.dir.join(name))
    }
}
