//! Release and file name transforms
//!
//! Every name that reaches the filesystem or the torrent search goes through
//! these small pure steps, so a subtitle saved from a feed link and a video
//! finished by the download client end up with the same identifier.

use std::sync::LazyLock;

use regex::Regex;

static SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s.]+").expect("separator regex is valid"));

static VIDEO_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.+)\.(mkv|avi|mp4|mpe?g)$").expect("video regex is valid")
});

static SUBTITLE_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+)\.srt$").expect("subtitle regex is valid"));

/// Removes one trailing run of ASCII digits
///
/// Feed link texts end with a size/seed annotation glued to the release name.
///
/// # Examples
/// - "Release.720p.DIMENSION.12345" -> "Release.720p.DIMENSION."
/// - "Release.720p.ASAP" -> "Release.720p.ASAP" (unchanged)
pub fn strip_trailing_digits(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Collapses runs of whitespace and dots into a single dot
///
/// Leading and trailing separators are dropped: "Show Name  01." -> "Show.Name.01"
pub fn collapse_separators(name: &str) -> String {
    SEPARATOR_RUN
        .replace_all(name, ".")
        .trim_matches('.')
        .to_string()
}

/// Joins the two groups captured by a release pattern with a dash
///
/// Subtitle sites write "x264.DIMENSION" where torrents use "x264-DIMENSION".
/// Patterns without two capture groups leave the name alone.
pub fn canonical_group_separator(name: &str, pattern: &Regex) -> String {
    if pattern.captures_len() < 3 {
        return name.to_string();
    }

    pattern.replace_all(name, "${1}-${2}").into_owned()
}

/// Filesystem-safe identifier for a matched release
pub fn release_identifier(stripped_name: &str, pattern: &Regex) -> String {
    collapse_separators(&canonical_group_separator(stripped_name, pattern))
}

/// Splits a video file name into stem and extension
pub fn split_video_name(file_name: &str) -> Option<(&str, &str)> {
    let caps = VIDEO_FILE.captures(file_name)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Stem of a subtitle file name, if it is one
pub fn subtitle_stem(file_name: &str) -> Option<&str> {
    SUBTITLE_FILE
        .captures(file_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Compares two names after collapsing separators, ignoring case
pub fn same_identifier(a: &str, b: &str) -> bool {
    collapse_separators(a).to_lowercase() == collapse_separators(b).to_lowercase()
}
