//! Plain data shapes for the external crawl/scrape request surface (§6).
//!
//! These are deliberately dumb `serde` structs with no behavior — an outer
//! HTTP layer (out of scope for this crate) is responsible for routing,
//! authentication, and packaging results. Named `api::CrawlRequest` to avoid
//! colliding with [`crate::runtime::CrawlRequest`], the internal
//! oneshot-channel handle a single browser crawl returns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TraversalStrategy {
    #[default]
    Bfs,
    Dfs,
    BestFirst,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ExtractorFormat {
    #[default]
    Markdown,
    Html,
    Text,
}

/// A single scripted browser action for [`ScraperOptions::actions`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BrowserAction {
    Click { selector: String, optional: bool },
    Scroll { selector: Option<String>, amount: Option<i64>, optional: bool },
    Wait { milliseconds: u64 },
    Fill { selector: String, value: String, optional: bool },
    Select { selector: String, value: String, optional: bool },
}

impl BrowserAction {
    pub fn is_optional(&self) -> bool {
        match self {
            BrowserAction::Click { optional, .. }
            | BrowserAction::Scroll { optional, .. }
            | BrowserAction::Fill { optional, .. }
            | BrowserAction::Select { optional, .. } => *optional,
            BrowserAction::Wait { .. } => true,
        }
    }
}

/// Per-page scrape options (§6 `ScraperOptions`). Unknown fields are
/// rejected so a caller typo surfaces immediately instead of being silently
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct ScraperOptions {
    pub use_browser: bool,
    pub only_main_content: bool,
    pub extractor_format: ExtractorFormat,
    pub wait_for_selector: Option<String>,
    pub actions: Vec<BrowserAction>,
    pub proxy: Option<String>,
    pub cookies: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub skip_cache: bool,
    pub cache_ttl_secs: Option<i64>,
    pub skip_tls_verification: bool,
    pub block_ads: bool,
    pub block_resources: Vec<String>,
    pub max_scrolls: Option<u32>,
    pub min_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff_factor: Option<f64>,
    pub rotate_user_agent: bool,
    pub ignore_robots_txt: bool,
    pub timeout_secs: Option<u64>,
}

/// A crawl submission (§6 `CrawlRequest`). Named to avoid clashing with the
/// internal browser-crawl channel handle of the same short name.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
pub struct CrawlRequest {
    pub url: String,
    pub max_depth: Option<u32>,
    pub limit: Option<usize>,
    pub strategy: TraversalStrategy,
    pub include_paths: Vec<String>,
    pub exclude_paths: Vec<String>,
    pub regex_on_full_url: bool,
    pub allow_backward_crawling: bool,
    pub allow_external_content_links: bool,
    pub allow_subdomains: bool,
    pub discovery_limit: Option<usize>,
    pub max_discovery_depth: Option<u32>,
    pub webhook: Option<String>,
    pub scraper_options: ScraperOptions,
}

/// Crawl/page lifecycle states reported by the controller (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CrawlState {
    Scraping,
    Completed,
    Cancelled,
}

/// Hook for an optional post-processing pass over a cleaned/converted page
/// (the LLM extraction/summarize stage is explicitly out of this crate's
/// scope — this trait is the seam an outer collaborator plugs into). The
/// default implementation is a no-op pass-through.
pub trait ExtractionPlugin: Send + Sync {
    fn process(&self, markdown: &str) -> String {
        markdown.to_string()
    }
}

/// The no-op default used when no plugin is configured.
pub struct NoopExtractionPlugin;

impl ExtractionPlugin for NoopExtractionPlugin {}
