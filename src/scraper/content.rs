//! Release page and entry markup parsing
//!
//! Subtitle posts carry a table whose first column links every release
//! group's subtitle; the link text is the release name.

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::pipeline::{CandidateRelease, EpisodeEntry};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts candidate releases from an entry's markup, in document order
pub fn extract_candidates(markup: &str) -> Vec<CandidateRelease> {
    let fragment = Html::parse_fragment(markup);
    let links = selector("table tbody td:first-child a");

    fragment
        .select(&links)
        .filter_map(|link| {
            let name = link.text().collect::<String>();
            if name.trim().is_empty() {
                return None;
            }
            let href = link.value().attr("href").unwrap_or_default();
            Some(CandidateRelease::new(&name, href))
        })
        .collect()
}

/// Fetches a single subtitle release page
///
/// Network failures are fatal for the run; a page without a title comes
/// back as an entry with an empty title.
pub async fn fetch_release_page(client: &Client, url: &str) -> Result<EpisodeEntry> {
    tracing::debug!("Fetching release page: {}", url);

    let html = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Unable to retrieve url {}", url))?
        .text()
        .await
        .with_context(|| format!("Unable to read body of {}", url))?;

    Ok(parse_release_page(&html))
}

/// Builds an entry from a release page: `h1` title, `.item-cat` categories,
/// `.post_content` markup
pub fn parse_release_page(html: &str) -> EpisodeEntry {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("h1"))
        .next()
        .map(element_text)
        .unwrap_or_default();

    let categories = document
        .select(&selector(".item-cat a"))
        .map(element_text)
        .filter(|category| !category.is_empty())
        .collect();

    let content = document
        .select(&selector(".post_content"))
        .next()
        .map(|element| element.inner_html())
        .unwrap_or_default();

    EpisodeEntry {
        title,
        categories,
        content,
    }
}
