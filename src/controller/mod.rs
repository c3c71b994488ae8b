//! Crawl lifecycle controller (C10).
//!
//! Tracks active crawls the way a connection-scoped session registry would
//! (`ActiveCrawlSession`-style records keyed by crawl id, a `ConfigSummary`
//! taken from the originating request) but driven by [`crate::job_store`]
//! instead of an in-process `HashMap`.

use crate::api::{CrawlRequest, CrawlState as ApiCrawlState};
use crate::frontier::{self, Frontier, Scope, TraversalStrategy};
use crate::job_store::{CrawlState, Job, JobPriority, JobStore};
use crate::robots::RobotsPolicy;
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::sync::Arc;

/// One completed page job, as returned in a [`CrawlStatusReport`]'s results
/// page.
#[derive(Debug, Clone)]
pub struct CompletedResult {
    pub job_id: String,
    pub url: String,
    pub final_url: String,
    pub exported_file: Option<String>,
}

/// Snapshot returned by [`Controller::status`].
#[derive(Debug, Clone)]
pub struct CrawlStatusReport {
    pub crawl_id: String,
    pub state: ApiCrawlState,
    pub pages_done: usize,
    pub pages_queued: usize,
    pub error: Option<String>,
    pub results: Vec<CompletedResult>,
}

/// Per-crawl state a worker needs once it pulls a job off the queue: the
/// original request (for `use_browser`/scraper options) and the frontier
/// that admits newly discovered links.
pub struct CrawlSession {
    pub request: CrawlRequest,
    pub frontier: Frontier,
    pub discovery_cap: (usize, u32),
}

/// Orchestrates one process's worth of crawls: starting, tracking, and
/// cancelling them against a shared [`JobStore`].
pub struct Controller {
    store: Arc<JobStore>,
    robots: Arc<RobotsPolicy>,
    http: reqwest::Client,
    sessions: DashMap<String, Arc<CrawlSession>>,
}

impl Controller {
    pub fn new(store: Arc<JobStore>, robots: Arc<RobotsPolicy>, http: reqwest::Client) -> Self {
        Self {
            store,
            robots,
            http,
            sessions: DashMap::new(),
        }
    }

    /// Looks up the session a worker needs to process a job for `crawl_id`.
    pub fn session(&self, crawl_id: &str) -> Option<Arc<CrawlSession>> {
        self.sessions.get(crawl_id).map(|s| s.clone())
    }

    /// Allocates a crawl id, persists the descriptor, best-effort warms the
    /// robots cache for the seed origin, and enqueues the kickoff job.
    /// Returns the new crawl id.
    pub async fn start(&self, request: &CrawlRequest) -> Result<String> {
        let seed = url::Url::parse(&request.url).context("invalid seed URL")?;
        let crawl_id = self
            .store
            .create_crawl(request.url.clone(), self.strategy(request));

        if !request.scraper_options.ignore_robots_txt {
            // Best-effort: a robots fetch failure never blocks crawl start,
            // it just falls back to allow-all for the first requests.
            let _ = self.robots.allowed(&seed).await;
        }

        let scope = self.build_scope(request, &seed)?;
        let robots = (!request.scraper_options.ignore_robots_txt).then(|| self.robots.clone());
        let frontier = Frontier::new(scope, robots);
        self.sessions.insert(
            crawl_id.clone(),
            Arc::new(CrawlSession {
                request: request.clone(),
                frontier,
                discovery_cap: self.discovery_cap(request),
            }),
        );

        self.store
            .enqueue(Job {
                id: uuid::Uuid::new_v4().to_string(),
                crawl_id: crawl_id.clone(),
                priority: JobPriority::Kickoff,
                url: request.url.clone(),
                depth: 0,
                score: 0.0,
                created_at: chrono::Utc::now(),
            })
            .await;

        Ok(crawl_id)
    }

    pub fn cancel(&self, crawl_id: &str) {
        self.store.cancel(crawl_id);
    }

    /// Reports `crawl_id`'s counts plus a bounded page of its completed
    /// results (§4.10), skipping `skip` and returning at most `limit`.
    pub async fn status(&self, crawl_id: &str, skip: usize, limit: usize) -> Option<CrawlStatusReport> {
        let record = self.store.record(crawl_id).await?;
        let state = match self.store.state(crawl_id)? {
            CrawlState::Scraping => ApiCrawlState::Scraping,
            CrawlState::Completed => ApiCrawlState::Completed,
            CrawlState::Cancelled => ApiCrawlState::Cancelled,
        };
        let results = self
            .store
            .list_by_crawl(crawl_id, skip, limit)
            .await
            .into_iter()
            .map(|record| CompletedResult {
                job_id: record.job.id,
                url: record.job.url,
                final_url: record
                    .result
                    .as_ref()
                    .map(|r| r.final_url.clone())
                    .unwrap_or_default(),
                exported_file: record.result.and_then(|r| r.exported_file),
            })
            .collect();
        Some(CrawlStatusReport {
            crawl_id: crawl_id.to_string(),
            state,
            pages_done: record.pages_done,
            pages_queued: record.pages_queued,
            error: record.error,
            results,
        })
    }

    /// Builds the frontier [`Scope`] for a request and the bounded
    /// discovery cap, per the `discovery_limit ∩ max_discovery_depth` Open
    /// Question resolution.
    pub fn build_scope(&self, request: &CrawlRequest, seed: &url::Url) -> Result<Scope> {
        let compile = |patterns: &[String]| -> Result<Vec<regex::Regex>> {
            patterns
                .iter()
                .map(|p| regex::Regex::new(p).context("invalid pattern"))
                .collect()
        };
        Ok(Scope {
            seed: seed.clone(),
            max_depth: request.max_depth.unwrap_or(2),
            include_patterns: compile(&request.include_paths)?,
            exclude_patterns: compile(&request.exclude_paths)?,
            regex_on_full_url: request.regex_on_full_url,
            allow_subdomains: request.allow_subdomains,
            allow_external_content_links: request.allow_external_content_links,
            allow_backward_crawling: request.allow_backward_crawling,
            ignore_robots: request.scraper_options.ignore_robots_txt,
        })
    }

    pub fn discovery_cap(&self, request: &CrawlRequest) -> (usize, u32) {
        (
            request.discovery_limit.unwrap_or(usize::MAX),
            request
                .max_discovery_depth
                .unwrap_or(request.max_depth.unwrap_or(2)),
        )
    }

    pub fn strategy(&self, request: &CrawlRequest) -> TraversalStrategy {
        match request.strategy {
            crate::api::TraversalStrategy::Bfs => TraversalStrategy::Bfs,
            crate::api::TraversalStrategy::Dfs => TraversalStrategy::Dfs,
            crate::api::TraversalStrategy::BestFirst => TraversalStrategy::BestFirst,
        }
    }

    /// Runs the discovery pass: seeds the frontier with the crawl's start
    /// URL, admits `links` breadth-first up to the discovery cap, and
    /// enqueues one page job per admitted URL. Called by the kickoff
    /// worker once it has fetched the seed page and extracted its links.
    pub async fn enqueue_discovered(
        &self,
        crawl_id: &str,
        frontier: &Frontier,
        links: impl IntoIterator<Item = (String, u32)>,
        cap: (usize, u32),
    ) -> Result<usize> {
        let (max_count, max_depth) = cap;
        let mut enqueued = 0usize;
        for (link, depth) in links {
            if enqueued >= max_count || depth > max_depth {
                continue;
            }
            let score = url::Url::parse(&link)
                .map(|u| frontier::best_first_score(&u))
                .unwrap_or(0.0);
            if let Some(entry) = frontier.try_admit(&link, depth, score) {
                self.store
                    .enqueue(Job {
                        id: uuid::Uuid::new_v4().to_string(),
                        crawl_id: crawl_id.to_string(),
                        priority: JobPriority::Page,
                        url: entry.url,
                        depth: entry.depth,
                        score: entry.score,
                        created_at: chrono::Utc::now(),
                    })
                    .await;
                enqueued += 1;
            }
        }
        Ok(enqueued)
    }

    pub async fn finish(&self, crawl_id: &str, error: Option<String>, webhook: Option<&str>) {
        self.store.finish(crawl_id, error.clone()).await;
        self.sessions.remove(crawl_id);
        if let (Some(url), Some(err)) = (webhook, &error) {
            let body = serde_json::json!({ "crawlId": crawl_id, "status": "failed", "error": err });
            let _ = self.http.post(url).json(&body).send().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ScraperOptions;

    fn controller() -> Controller {
        Controller::new(
            Arc::new(JobStore::new()),
            Arc::new(RobotsPolicy::new(reqwest::Client::new(), true)),
            reqwest::Client::new(),
        )
    }

    fn request(url: &str) -> CrawlRequest {
        CrawlRequest {
            url: url.to_string(),
            scraper_options: ScraperOptions {
                ignore_robots_txt: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn start_then_status_reports_scraping() {
        let controller = controller();
        let crawl_id = controller.start(&request("https://example.com")).await.unwrap();
        let status = controller.status(&crawl_id, 0, 10).await.unwrap();
        assert_eq!(status.state, ApiCrawlState::Scraping);
        assert_eq!(status.pages_queued, 1);
        assert!(status.results.is_empty());
    }

    #[tokio::test]
    async fn cancel_reflects_in_status() {
        let controller = controller();
        let crawl_id = controller.start(&request("https://example.com")).await.unwrap();
        controller.cancel(&crawl_id);
        let status = controller.status(&crawl_id, 0, 10).await.unwrap();
        assert_eq!(status.state, ApiCrawlState::Cancelled);
    }

    #[tokio::test]
    async fn dfs_strategy_governs_page_job_dispatch_order() {
        let controller = controller();
        let req = CrawlRequest {
            strategy: crate::api::TraversalStrategy::Dfs,
            ..request("https://example.com")
        };
        let crawl_id = controller.start(&req).await.unwrap();
        // Drain the kickoff job so only page jobs remain.
        controller.store.dequeue(&crawl_id).await;

        let scope = controller
            .build_scope(&req, &url::Url::parse("https://example.com").unwrap())
            .unwrap();
        let frontier = Frontier::new(scope, None);
        let links = vec![
            ("https://example.com/a".to_string(), 1),
            ("https://example.com/b".to_string(), 1),
        ];
        controller
            .enqueue_discovered(&crawl_id, &frontier, links, (usize::MAX, 3))
            .await
            .unwrap();

        let first = controller.store.dequeue(&crawl_id).await.unwrap();
        assert_eq!(first.url, "https://example.com/b");
    }

    #[tokio::test]
    async fn best_first_strategy_scores_discovered_links() {
        let controller = controller();
        let req = CrawlRequest {
            strategy: crate::api::TraversalStrategy::BestFirst,
            ..request("https://example.com")
        };
        let crawl_id = controller.start(&req).await.unwrap();
        controller.store.dequeue(&crawl_id).await;

        let scope = controller
            .build_scope(&req, &url::Url::parse("https://example.com").unwrap())
            .unwrap();
        let frontier = Frontier::new(scope, None);
        let links = vec![
            ("https://example.com/checkout".to_string(), 1),
            ("https://example.com/guide".to_string(), 1),
        ];
        controller
            .enqueue_discovered(&crawl_id, &frontier, links, (usize::MAX, 3))
            .await
            .unwrap();

        let first = controller.store.dequeue(&crawl_id).await.unwrap();
        assert_eq!(first.url, "https://example.com/guide");
    }

    #[tokio::test]
    async fn discovery_cap_intersects_count_and_depth() {
        let controller = controller();
        let req = CrawlRequest {
            discovery_limit: Some(2),
            max_discovery_depth: Some(1),
            ..request("https://example.com")
        };
        let crawl_id = controller.start(&req).await.unwrap();
        let scope = controller
            .build_scope(&req, &url::Url::parse("https://example.com").unwrap())
            .unwrap();
        let frontier = Frontier::new(scope, None);
        let cap = controller.discovery_cap(&req);
        let links = vec![
            ("https://example.com/a".to_string(), 1),
            ("https://example.com/b".to_string(), 1),
            ("https://example.com/c".to_string(), 2),
        ];
        let count = controller
            .enqueue_discovered(&crawl_id, &frontier, links, cap)
            .await
            .unwrap();
        assert_eq!(count, 2);
    }
}
