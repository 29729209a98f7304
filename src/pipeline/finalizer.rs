//! Pairs completed videos with stored subtitles
//!
//! Every failure here is logged and swallowed: files that could not be
//! moved stay where they are and are picked up by a later run.

use std::fs;
use std::path::{Path, PathBuf};

use super::names::{collapse_separators, split_video_name};
use crate::storage::SubtitleStore;

pub struct Finalizer<'a> {
    store: &'a SubtitleStore,
    destination: PathBuf,
}

impl<'a> Finalizer<'a> {
    pub fn new(store: &'a SubtitleStore, destination: impl Into<PathBuf>) -> Self {
        Self {
            store,
            destination: destination.into(),
        }
    }

    /// Walks the completed-downloads tree, returning how many pairs moved
    pub fn finalize(&self, root: &Path) -> usize {
        self.walk(root, 0)
    }

    fn walk(&self, dir: &Path, depth: usize) -> usize {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Unable to list {}: {}", dir.display(), e);
                return 0;
            }
        };

        let mut entries: Vec<(String, bool)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let is_dir = entry.file_type().ok()?.is_dir();
                Some((entry.file_name().into_string().ok()?, is_dir))
            })
            .collect();
        entries.sort();

        let mut moved = 0;

        for (name, is_dir) in entries {
            let path = dir.join(&name);

            if is_dir {
                moved += self.walk(&path, depth + 1);
                continue;
            }

            let Some((stem, extension)) = split_video_name(&name) else {
                continue;
            };

            if self.finalize_video(dir, &path, stem, extension, depth) {
                moved += 1;
            }

            // A download directory holds one video of interest
            break;
        }

        moved
    }

    fn finalize_video(
        &self,
        dir: &Path,
        video: &Path,
        stem: &str,
        extension: &str,
        depth: usize,
    ) -> bool {
        let identifier = collapse_separators(stem);

        let Some(subtitle) = self.store.find(&identifier) else {
            tracing::debug!("No subtitle yet for {}", video.display());
            return false;
        };

        let video_target = self
            .destination
            .join(format!("{}.{}", identifier, extension));

        if let Err(e) = fs::rename(video, &video_target) {
            tracing::warn!(
                "Unable to move {} to {}: {}",
                video.display(),
                video_target.display(),
                e
            );
            return false;
        }

        let subtitle_target = self.destination.join(format!("{}.srt", identifier));
        if let Err(e) = fs::rename(&subtitle, &subtitle_target) {
            tracing::warn!(
                "Unable to move {} to {}: {}",
                subtitle.display(),
                subtitle_target.display(),
                e
            );
        }

        if depth > 0 {
            if let Err(e) = fs::remove_dir_all(dir) {
                tracing::warn!("Unable to remove {}: {}", dir.display(), e);
            }
        }

        tracing::info!("Finalized {}", identifier);

        true
    }
}
