//! Robots.txt fetching, caching, and policy evaluation.

use dashmap::DashMap;
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Robots user-agent token presented both in the `User-Agent` request header
/// and matched against `robots.txt` group directives. Canonicalized to a
/// single name; do not introduce a second token elsewhere in the crate.
pub const ROBOTS_USER_AGENT: &str = "WebcrawlEngine";

const ROBOTS_CACHE_TTL: Duration = Duration::from_secs(3600);

/// A parsed robots record for one origin.
#[derive(Debug, Clone)]
pub struct RobotsRecord {
    body: Option<String>,
    crawl_delay: Option<Duration>,
    fetched_at: Instant,
}

impl RobotsRecord {
    /// A permissive record used when `robots.txt` could not be fetched, or
    /// when the caller has opted out of robots enforcement.
    pub fn allow_all() -> Self {
        Self {
            body: None,
            crawl_delay: None,
            fetched_at: Instant::now(),
        }
    }

    fn from_body(body: String) -> Self {
        let crawl_delay = extract_crawl_delay(&body);
        Self {
            body: Some(body),
            crawl_delay,
            fetched_at: Instant::now(),
        }
    }

    pub fn is_allowed(&self, user_agent: &str, url: &str) -> bool {
        match &self.body {
            None => true,
            Some(body) => {
                DefaultMatcher::default().one_agent_allowed_by_robots(body, user_agent, url)
            }
        }
    }

    pub fn crawl_delay(&self) -> Option<Duration> {
        self.crawl_delay
    }

    fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() > ROBOTS_CACHE_TTL
    }
}

/// Naively scans for a `Crawl-delay: <seconds>` directive. `robots.txt` is
/// small and line-oriented; a full directive-group parser isn't warranted
/// just to pull this one value out.
fn extract_crawl_delay(body: &str) -> Option<Duration> {
    for line in body.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(rest) = lower.strip_prefix("crawl-delay:") {
            if let Ok(secs) = rest.trim().parse::<f64>() {
                return Some(Duration::from_secs_f64(secs));
            }
        }
    }
    None
}

/// Per-origin robots.txt cache plus policy evaluation.
pub struct RobotsPolicy {
    cache: DashMap<String, Arc<RobotsRecord>>,
    client: reqwest::Client,
    ignore_robots: bool,
}

impl RobotsPolicy {
    pub fn new(client: reqwest::Client, ignore_robots: bool) -> Self {
        Self {
            cache: DashMap::new(),
            client,
            ignore_robots,
        }
    }

    /// Returns the robots record for `url`'s origin, fetching and caching it
    /// if necessary. A fetch failure of any kind yields `allow_all` — robots
    /// unavailability never fails a crawl.
    pub async fn record_for(&self, url: &url::Url) -> Arc<RobotsRecord> {
        if self.ignore_robots {
            return Arc::new(RobotsRecord::allow_all());
        }

        let origin = origin_key(url);

        if let Some(existing) = self.cache.get(&origin) {
            if !existing.is_stale() {
                return existing.clone();
            }
        }

        let robots_url = format!("{origin}/robots.txt");
        let record = Arc::new(self.fetch(&robots_url).await);
        self.cache.insert(origin, record.clone());
        record
    }

    async fn fetch(&self, robots_url: &str) -> RobotsRecord {
        match self.client.get(robots_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(body) => RobotsRecord::from_body(body),
                Err(e) => {
                    log::warn!("robots.txt body read failed for {robots_url}: {e}");
                    RobotsRecord::allow_all()
                }
            },
            Ok(resp) => {
                log::debug!("robots.txt at {robots_url} returned {}", resp.status());
                RobotsRecord::allow_all()
            }
            Err(e) => {
                log::warn!("robots.txt fetch failed for {robots_url}: {e}");
                RobotsRecord::allow_all()
            }
        }
    }

    /// Checks whether `url` may be crawled per the cached robots record.
    pub async fn allowed(&self, url: &url::Url) -> bool {
        if self.ignore_robots {
            return true;
        }
        let record = self.record_for(url).await;
        record.is_allowed(ROBOTS_USER_AGENT, url.as_str())
    }
}

fn origin_key(url: &url::Url) -> String {
    match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), url.host_str().unwrap_or(""), port),
        None => format!("{}://{}", url.scheme(), url.host_str().unwrap_or("")),
    }
}
