//! Automatic subtitle and episode downloader
//!
//! Watches a subtitle release feed, picks the preferred video release for
//! every tracked show, fetches its subtitle and magnet link, starts the
//! torrent and finally pairs finished videos with their subtitles.
//!
//! - [`db`] - SQLite history, tracked shows and release patterns
//! - [`pipeline`] - gate, matcher, orchestrator and finalizer
//! - [`scraper`] - feed, release page, torrent search, subtitle and download clients
//! - [`storage`] - subtitle files waiting for their video

pub mod app;
pub mod config;
pub mod db;
pub mod pipeline;
pub mod scraper;
pub mod storage;
