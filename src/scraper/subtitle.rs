//! Subtitle download behind a release link
//!
//! The release link leads to a page that embeds the real download URL,
//! recognizable by its `edmc` query parameter. That URL only answers to
//! requests that look like a browser coming from the page.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::header::{REFERER, USER_AGENT};
use reqwest::Client;

use crate::pipeline::SubtitleFetcher;

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_10; rv:33.0) Gecko/20100101 Firefox/33.0";

static DOWNLOAD_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^?\s"'<>]+\?edmc=[0-9]+"#).expect("download url regex is valid")
});

/// Replaces a leading `https` scheme with `http`
pub fn downgrade_scheme(url: &str) -> String {
    match url.strip_prefix("https") {
        Some(rest) => format!("http{}", rest),
        None => url.to_string(),
    }
}

/// First embedded download URL in a subtitle page
pub fn find_download_url(body: &str) -> Option<&str> {
    DOWNLOAD_URL.find(body).map(|m| m.as_str())
}

pub struct SubtitleDownloader {
    client: Client,
    user_agent: String,
}

impl SubtitleDownloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl SubtitleFetcher for SubtitleDownloader {
    /// Transport failures are fatal; a page without a download URL, an error
    /// status or an empty body is `None`.
    async fn fetch(&self, source_link: &str) -> Result<Option<Vec<u8>>> {
        let page_url = downgrade_scheme(source_link);
        tracing::debug!("Fetching subtitle page: {}", page_url);

        let body = self
            .client
            .get(&page_url)
            .send()
            .await
            .with_context(|| format!("Unable to retrieve url {}", page_url))?
            .text()
            .await
            .with_context(|| format!("Unable to read body of {}", page_url))?;

        let Some(download_url) = find_download_url(&body) else {
            tracing::debug!("No subtitle download link in {}", page_url);
            return Ok(None);
        };

        tracing::debug!("Downloading subtitle: {}", download_url);

        let response = self
            .client
            .get(download_url)
            .header(REFERER, &page_url)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .context("Unable to retrieve subtitle file")?;

        if !response.status().is_success() {
            tracing::warn!(
                "Subtitle download from {} returned {}",
                download_url,
                response.status()
            );
            return Ok(None);
        }

        let payload = response
            .bytes()
            .await
            .context("Unable to read subtitle file")?;

        Ok((!payload.is_empty()).then(|| payload.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SRT: &[u8] = b"1\n00:00:01,000 --> 00:00:03,000\nBom dia.\n";

    #[test]
    fn test_downgrade_scheme() {
        assert_eq!(downgrade_scheme("https://l.example/d/1"), "http://l.example/d/1");
        assert_eq!(downgrade_scheme("http://l.example/d/1"), "http://l.example/d/1");
        assert_eq!(downgrade_scheme("ftp://l.example"), "ftp://l.example");
    }

    #[test]
    fn test_find_download_url() {
        let body = "<script>\nvar x = 1;\n\
                    window.location = 'http://dl.example/get/abc?edmc=4521';\n</script>";
        assert_eq!(find_download_url(body), Some("http://dl.example/get/abc?edmc=4521"));
    }

    #[test]
    fn test_find_download_url_requires_marker() {
        assert_eq!(find_download_url("<a href=\"http://dl.example/get/abc?id=1\">x</a>"), None);
        assert_eq!(find_download_url("http://dl.example/get/abc?edmc=x"), None);
    }

    #[tokio::test]
    async fn test_fetch_follows_embedded_link() {
        let server = MockServer::start().await;
        let page_url = format!("{}/legenda/42", server.uri());
        let page = format!(
            r#"<html><body><a href="{}/download/42?edmc=777">Baixar</a></body></html>"#,
            server.uri()
        );

        Mock::given(method("GET"))
            .and(path("/legenda/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/download/42"))
            .and(query_param("edmc", "777"))
            .and(header("referer", page_url.as_str()))
            .and(header("user-agent", BROWSER_USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(SRT.to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = SubtitleDownloader::new(Client::new());
        let payload = fetcher.fetch(&page_url).await.unwrap();

        assert_eq!(payload.as_deref(), Some(SRT));
    }

    #[tokio::test]
    async fn test_fetch_page_without_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/legenda/43"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>removida</p>"))
            .mount(&server)
            .await;

        let fetcher = SubtitleDownloader::new(Client::new());
        let payload = fetcher
            .fetch(&format!("{}/legenda/43", server.uri()))
            .await
            .unwrap();

        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_fetch_download_error_status() {
        let server = MockServer::start().await;
        let page = format!(r#"<a href="{}/download/44?edmc=1">x</a>"#, server.uri());

        Mock::given(method("GET"))
            .and(path("/legenda/44"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/download/44"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let fetcher = SubtitleDownloader::new(Client::new());
        let payload = fetcher
            .fetch(&format!("{}/legenda/44", server.uri()))
            .await
            .unwrap();

        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_fetch_unreachable_is_error() {
        let fetcher = SubtitleDownloader::new(Client::new());
        assert!(fetcher.fetch("http://127.0.0.1:1/legenda/1").await.is_err());
    }
}
