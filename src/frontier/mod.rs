//! Traversal frontier: scope admission, dedup/lock tracking, and ordering.
//!
//! Generalizes `crawl_engine::crawler::should_visit_url`'s scope-filter
//! predicate chain into a [`Scope`] that doesn't require a full `CrawlConfig`,
//! and adds the admission checks that function didn't have: include
//! patterns, depth limit, subdomain/external-domain allowances, backward
//! crawling, binary-extension rejection, and robots.

use crate::robots::RobotsPolicy;
use crate::url_normalizer::{self, SimilarityClass};
use dashmap::DashSet;
use std::sync::Arc;

/// Keywords that suggest a page is reference/how-to content, worth visiting
/// sooner under the best-first strategy.
const TOPIC_KEYWORDS: &[&str] = &["docs", "guide", "tutorial", "about"];

/// Keywords that suggest a page is transactional (login/checkout flows)
/// rather than content, worth deferring under the best-first strategy.
const TRANSACTIONAL_KEYWORDS: &[&str] = &["login", "signup", "cart", "checkout"];

/// Extensions whose targets are never HTML/text content worth fetching.
const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".pdf", ".zip", ".gz", ".tar",
    ".mp4", ".mp3", ".avi", ".mov", ".woff", ".woff2", ".ttf", ".eot", ".exe", ".dmg", ".bin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalStrategy {
    Bfs,
    Dfs,
    BestFirst,
}

/// Scope/admission rules for one crawl, independent of `CrawlConfig` so the
/// frontier can be exercised without constructing a full browser-crawl
/// configuration.
#[derive(Debug, Clone)]
pub struct Scope {
    pub seed: url::Url,
    pub max_depth: u32,
    pub include_patterns: Vec<regex::Regex>,
    pub exclude_patterns: Vec<regex::Regex>,
    pub regex_on_full_url: bool,
    pub allow_subdomains: bool,
    pub allow_external_content_links: bool,
    pub allow_backward_crawling: bool,
    pub ignore_robots: bool,
}

impl Scope {
    fn host_allowed(&self, candidate_host: &str) -> bool {
        let seed_host = self.seed.host_str().unwrap_or_default();
        if candidate_host == seed_host {
            return true;
        }
        if self.allow_subdomains && candidate_host.ends_with(&format!(".{seed_host}")) {
            return true;
        }
        self.allow_external_content_links
    }

    fn path_allowed(&self, candidate_path: &str) -> bool {
        let seed_path = self.seed.path().trim_end_matches('/');
        if seed_path.is_empty() {
            return true;
        }
        let candidate = candidate_path.trim_end_matches('/');
        let under_seed = candidate == seed_path || candidate.starts_with(&format!("{seed_path}/"));
        under_seed || self.allow_backward_crawling
    }

    fn pattern_allowed(&self, url: &url::Url) -> bool {
        let target = if self.regex_on_full_url {
            url.as_str()
        } else {
            url.path()
        };
        if !self.include_patterns.is_empty()
            && !self.include_patterns.iter().any(|r| r.is_match(target))
        {
            return false;
        }
        if self.exclude_patterns.iter().any(|r| r.is_match(target)) {
            return false;
        }
        true
    }

    fn extension_allowed(url: &url::Url) -> bool {
        let path = url.path().to_ascii_lowercase();
        !BINARY_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }
}

/// Admits or rejects a candidate URL at a given depth, checking everything
/// except robots (robots requires an async fetch; see
/// [`Frontier::admit_with_robots`]).
pub fn admit_scope(candidate: &str, depth: u32, scope: &Scope) -> bool {
    let Ok(url) = url::Url::parse(candidate) else {
        return false;
    };
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }
    if depth > scope.max_depth {
        return false;
    }
    let Some(host) = url.host_str() else {
        return false;
    };
    if !scope.host_allowed(host) {
        return false;
    }
    if !scope.path_allowed(url.path()) {
        return false;
    }
    if !scope.pattern_allowed(&url) {
        return false;
    }
    if !Scope::extension_allowed(&url) {
        return false;
    }
    true
}

#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub score: f64,
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.score == other.score
    }
}
impl Eq for FrontierEntry {}
impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .partial_cmp(&other.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// Scores `url` for the best-first strategy: topic keywords in the path add
/// weight, path depth and query-string length subtract it, and a
/// transactional keyword in the path is a heavy penalty. Higher scores
/// dequeue first.
pub fn best_first_score(url: &url::Url) -> f64 {
    let path = url.path().to_ascii_lowercase();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut score = 0.0;
    for keyword in TOPIC_KEYWORDS {
        if segments.iter().any(|s| s.contains(keyword)) {
            score += 5.0;
        }
    }
    for keyword in TRANSACTIONAL_KEYWORDS {
        if segments.iter().any(|s| s.contains(keyword)) {
            score -= 10.0;
        }
    }
    score -= segments.len() as f64;
    score -= url.query().map(str::len).unwrap_or(0) as f64 * 0.1;
    score
}

/// Scope admission plus visited/lock tracking (keyed by similarity class so
/// cosmetically different URLs for the same resource are treated as one).
/// Ordering of admitted URLs is a separate concern, owned by each crawl's
/// job queue (`job_store::PageOrder`) — a controller holds one `Frontier`
/// per crawl (shared, `&self` throughout) and admission here only decides
/// whether a URL is ever dispatched, not in what order.
pub struct Frontier {
    visited: DashSet<SimilarityClass>,
    scope: Scope,
    robots: Option<Arc<RobotsPolicy>>,
}

impl Frontier {
    pub fn new(scope: Scope, robots: Option<Arc<RobotsPolicy>>) -> Self {
        Self {
            visited: DashSet::new(),
            scope,
            robots,
        }
    }

    /// Marks `url` visited/locked if it both passes scope and hasn't been
    /// seen before, returning the [`FrontierEntry`] to enqueue on success.
    pub fn try_admit(&self, url: &str, depth: u32, score: f64) -> Option<FrontierEntry> {
        if !admit_scope(url, depth, &self.scope) {
            return None;
        }
        let class = url_normalizer::similarity_class(url).ok()?;
        if !self.visited.insert(class) {
            return None;
        }
        Some(FrontierEntry {
            url: url.to_string(),
            depth,
            score,
        })
    }

    pub fn is_visited(&self, url: &str) -> bool {
        match url_normalizer::similarity_class(url) {
            Ok(class) => self.visited.contains(&class),
            Err(_) => false,
        }
    }

    /// Marks `url` visited/locked without requiring it to pass scope
    /// checks (used when the seed URL itself is enqueued).
    pub fn mark_visited(&self, url: &str) -> bool {
        match url_normalizer::similarity_class(url) {
            Ok(class) => self.visited.insert(class),
            Err(_) => false,
        }
    }

    pub fn admits(&self, url: &str, depth: u32) -> bool {
        admit_scope(url, depth, &self.scope) && !self.is_visited(url)
    }

    /// Robots-aware admission: call only once scope/dedup have already
    /// passed, since it does network I/O.
    pub async fn admit_with_robots(&self, url: &url::Url) -> bool {
        match &self.robots {
            Some(robots) => robots.allowed(url).await,
            None => true,
        }
    }
}
