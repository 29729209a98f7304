use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};

use crate::pipeline::MagnetLookup;

/// Search page sorted by seeders; `{query}` is replaced with the release name
pub const DEFAULT_SEARCH_URL: &str =
    "https://kickass.to/usearch/{query}/?field=seeders&sorder=desc";

/// Magnet lookup through a torrent site's search page
pub struct TorrentSearch {
    client: Client,
    url_template: String,
}

impl TorrentSearch {
    pub fn new(client: Client, url_template: &str) -> Self {
        Self {
            client,
            url_template: url_template.to_string(),
        }
    }

    pub fn search_url(&self, release_name: &str) -> String {
        self.url_template
            .replace("{query}", &urlencoding::encode(release_name))
    }
}

impl MagnetLookup for TorrentSearch {
    /// Transport failures are fatal; a results page without a magnet is `None`.
    /// The status code is not checked since some sites answer "no results"
    /// with a 404 page.
    async fn find_magnet(&self, release_name: &str) -> Result<Option<String>> {
        let url = self.search_url(release_name);
        tracing::debug!("Searching torrents: {}", url);

        let html = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Unable to retrieve torrents page {}", url))?
            .text()
            .await
            .with_context(|| format!("Unable to read torrents page {}", url))?;

        Ok(parse_magnet(&html))
    }
}

/// First magnet link on a search results page
pub fn parse_magnet(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector_magnet =
        Selector::parse("a.imagnet, a[href^='magnet:']").expect("static selector is valid");

    document
        .select(&selector_magnet)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULTS: &str = r#"
        <table class="data">
          <tr><td>
            <a class="imagnet icon16" href="magnet:?xt=urn:btih:AAA&amp;dn=The.Good.Wife">magnet</a>
            <a href="magnet:?xt=urn:btih:BBB">other</a>
          </td></tr>
        </table>"#;

    #[test]
    fn test_parse_magnet_first_link() {
        assert_eq!(
            parse_magnet(RESULTS).as_deref(),
            Some("magnet:?xt=urn:btih:AAA&dn=The.Good.Wife")
        );
    }

    #[test]
    fn test_parse_magnet_plain_href() {
        let html = r#"<a href="/torrent/1">t</a><a href="magnet:?xt=urn:btih:CCC">m</a>"#;
        assert_eq!(parse_magnet(html).as_deref(), Some("magnet:?xt=urn:btih:CCC"));
    }

    #[test]
    fn test_parse_magnet_none() {
        assert_eq!(parse_magnet("<p>Nothing found!</p>"), None);
    }

    #[test]
    fn test_search_url_encodes_release() {
        let search = TorrentSearch::new(Client::new(), "https://t.example/s/{query}/");
        assert_eq!(
            search.search_url("Show S01E01 x264-LOL"),
            "https://t.example/s/Show%20S01E01%20x264-LOL/"
        );
    }

    #[tokio::test]
    async fn test_find_magnet_from_search_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/usearch/Show.S01E01.720p-DIMENSION/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS))
            .expect(1)
            .mount(&server)
            .await;

        let template = format!("{}/usearch/{{query}}/", server.uri());
        let search = TorrentSearch::new(Client::new(), &template);
        let magnet = search.find_magnet("Show.S01E01.720p-DIMENSION").await.unwrap();

        assert!(magnet.unwrap().starts_with("magnet:?xt=urn:btih:AAA"));
    }

    #[tokio::test]
    async fn test_find_magnet_not_found_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Nothing found!</h1>"))
            .mount(&server)
            .await;

        let template = format!("{}/usearch/{{query}}/", server.uri());
        let search = TorrentSearch::new(Client::new(), &template);
        assert_eq!(search.find_magnet("Unknown.Release").await.unwrap(), None);
    }
}
