//! Page fetchers: plain HTTP (C5) and headless browser (C6).

pub mod browser;
pub mod http;

/// What a fetch returned, independent of which fetcher produced it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub final_url: String,
    pub html: String,
    pub status: u16,
    pub links: Vec<String>,
}
