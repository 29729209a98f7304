//! Release selection by ordered release-group patterns

use anyhow::{Context, Result};
use regex::Regex;

use super::names::release_identifier;
use super::CandidateRelease;
use crate::db::models::ReleasePatternRow;

/// One compiled release-group preference
#[derive(Debug, Clone)]
pub struct ReleasePattern {
    source: String,
    regex: Regex,
}

impl ReleasePattern {
    /// Compiles a pattern; matching is always case-insensitive
    pub fn new(source: &str) -> Result<Self> {
        let regex = Regex::new(&format!("(?i){}", source))
            .with_context(|| format!("Invalid release pattern '{}'", source))?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }
}

/// Release-group patterns in priority order, most wanted first
#[derive(Debug, Clone, Default)]
pub struct ReleasePatterns {
    patterns: Vec<ReleasePattern>,
}

impl ReleasePatterns {
    pub fn compile<I, S>(sources: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = sources
            .into_iter()
            .map(|s| ReleasePattern::new(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Builds the list from database rows, already sorted by position
    pub fn from_rows(rows: &[ReleasePatternRow]) -> Result<Self> {
        Self::compile(rows.iter().map(|row| row.pattern.as_str()))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReleasePattern> {
        self.patterns.iter()
    }

    pub fn select<'p, 'c>(
        &'p self,
        candidates: &'c [CandidateRelease],
    ) -> Option<ReleaseMatch<'p, 'c>> {
        select_release(candidates, self)
    }
}

/// The winning candidate and the pattern that picked it
#[derive(Debug, Clone, Copy)]
pub struct ReleaseMatch<'p, 'c> {
    pub candidate: &'c CandidateRelease,
    pub pattern: &'p ReleasePattern,
    /// Index of the pattern in the preference list
    pub priority: usize,
}

impl ReleaseMatch<'_, '_> {
    /// Name the subtitle is stored under and the video is finalized as
    pub fn identifier(&self) -> String {
        release_identifier(&self.candidate.stripped_name, self.pattern.regex())
    }
}

/// Picks the best release among an episode's candidates
///
/// Patterns are tried in priority order and, for each, candidates in
/// document order; the first hit wins. `None` means no pattern matched any
/// candidate.
pub fn select_release<'p, 'c>(
    candidates: &'c [CandidateRelease],
    patterns: &'p ReleasePatterns,
) -> Option<ReleaseMatch<'p, 'c>> {
    for (priority, pattern) in patterns.iter().enumerate() {
        if let Some(candidate) = candidates
            .iter()
            .find(|c| pattern.is_match(&c.stripped_name))
        {
            return Some(ReleaseMatch {
                candidate,
                pattern,
                priority,
            });
        }
    }

    None
}
