//! Subtitle release feed
//!
//! A WordPress-style RSS feed: one `item` per subtitle post, with the show
//! among its `category` labels and the release table in `content:encoded`.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;

use crate::pipeline::EpisodeEntry;

/// Fetches and parses the subtitle feed
///
/// Both an unreachable feed and malformed XML abort the run.
pub async fn fetch_feed(client: &Client, url: &str) -> Result<Vec<EpisodeEntry>> {
    tracing::debug!("Fetching subtitle feed: {}", url);

    let xml = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Unable to retrieve url {}", url))?
        .text()
        .await
        .with_context(|| format!("Unable to read body of {}", url))?;

    parse_feed_xml(&xml).context("Unable to parse subtitles feed")
}

/// Parses RSS XML into entries, keeping feed order
pub fn parse_feed_xml(xml: &str) -> Result<Vec<EpisodeEntry>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut current_item: Option<FeedItemBuilder> = None;
    let mut current_element: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                match name.as_str() {
                    "item" => {
                        current_item = Some(FeedItemBuilder::default());
                    }
                    _ => {
                        current_element = Some(name);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                if name == "item" {
                    if let Some(builder) = current_item.take() {
                        if let Some(entry) = builder.build() {
                            entries.push(entry);
                        }
                    }
                }
                current_element = None;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(item), Some(element)) = (&mut current_item, &current_element) {
                    let text = e
                        .unescape()
                        .with_context(|| {
                            format!("Bad escape in feed at position {}", reader.buffer_position())
                        })?
                        .to_string();
                    item.push(element, &text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(item), Some(element)) = (&mut current_item, &current_element) {
                    let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                    item.push(element, &text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Error parsing feed XML at position {}: {:?}",
                    reader.buffer_position(),
                    e
                ));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

/// Collects the fields of one feed item
#[derive(Default)]
struct FeedItemBuilder {
    title: Option<String>,
    categories: Vec<String>,
    content: String,
}

impl FeedItemBuilder {
    fn push(&mut self, element: &str, text: &str) {
        if text.is_empty() {
            return;
        }

        match element {
            "title" => self.title.get_or_insert_with(String::new).push_str(text),
            "category" => self.categories.push(text.trim().to_string()),
            // Content may arrive split over several text and CDATA events
            "content:encoded" => self.content.push_str(text),
            _ => {}
        }
    }

    fn build(self) -> Option<EpisodeEntry> {
        let title = self.title?.trim().to_string();
        if title.is_empty() {
            return None;
        }

        Some(EpisodeEntry {
            title,
            categories: self.categories,
            content: self.content,
        })
    }
}
