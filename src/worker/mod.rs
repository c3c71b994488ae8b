//! Semaphore-bounded worker pool draining [`JobStore`] (§5 concurrency
//! model), grounded on `crawl_engine::core::crawl_pages`'s
//! `FuturesUnordered` + `Semaphore` loop but driven by jobs instead of an
//! in-memory `VecDeque`, and by [`Controller::session`] instead of a single
//! `CrawlConfig`.

use crate::cache::{fingerprint, Fingerprint, FingerprintInputs, ResponseCache};
use crate::content_saver::markdown_converter::{convert_html_to_markdown, ConversionOptions};
use crate::controller::Controller;
use crate::crawl_engine::rate_limit::{FetchOutcome, RateLimitPolicy};
use crate::fetch::{browser, http, FetchedPage};
use crate::job_store::{Job, JobPriority, JobResult, JobStore};
use anyhow::Result;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// One processed page's markdown/plain-text/HTML body, cached by
/// [`WorkerPool::cache`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ExtractedPage {
    pub final_url: String,
    pub body: String,
}

/// Drains one [`JobStore`] to completion for every crawl started through a
/// shared [`Controller`]: fetches each job's URL (browser or plain HTTP,
/// per that crawl's `use_browser` option), converts and caches the body,
/// admits discovered links into the crawl's frontier, and enqueues page
/// jobs for them.
pub struct WorkerPool {
    store: Arc<JobStore>,
    controller: Arc<Controller>,
    rate_limit: Arc<RateLimitPolicy>,
    browser_pool: Option<Arc<crate::browser_pool::BrowserPool>>,
    cache: Arc<ResponseCache<ExtractedPage>>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(
        store: Arc<JobStore>,
        controller: Arc<Controller>,
        rate_limit: Arc<RateLimitPolicy>,
        browser_pool: Option<Arc<crate::browser_pool::BrowserPool>>,
        cache: Arc<ResponseCache<ExtractedPage>>,
        concurrency: usize,
    ) -> Self {
        Self {
            store,
            controller,
            rate_limit,
            browser_pool,
            cache,
            concurrency,
        }
    }

    /// Runs until the queue is drained and every in-flight task completes,
    /// then marks `crawl_id` finished. One call drives exactly one crawl to
    /// completion; callers spawn one `run` per started crawl.
    pub async fn run(&self, crawl_id: &str) {
        let mut active = FuturesUnordered::new();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let failure: Arc<std::sync::Mutex<Option<String>>> = Arc::new(std::sync::Mutex::new(None));

        loop {
            while active.len() < self.concurrency {
                if self.store.is_cancelled(crawl_id) {
                    break;
                }
                let Some(job) = self.next_job_for(crawl_id).await else {
                    break;
                };
                let permit = match permits.clone().acquire_owned().await {
                    Ok(p) => p,
                    Err(_) => break,
                };
                let failure = failure.clone();
                active.push(self.process_job(job, permit, failure));
            }

            if active.is_empty() {
                if self.store.is_cancelled(crawl_id) || self.next_job_for(crawl_id).await.is_none()
                {
                    break;
                }
                continue;
            }

            active.next().await;
        }

        let error = failure.lock().ok().and_then(|g| g.clone());
        self.controller.finish(crawl_id, error, None).await;
    }

    async fn next_job_for(&self, crawl_id: &str) -> Option<Job> {
        self.store.dequeue(crawl_id).await
    }

    async fn process_job(
        &self,
        job: Job,
        _permit: tokio::sync::OwnedSemaphorePermit,
        failure: Arc<std::sync::Mutex<Option<String>>>,
    ) {
        let Some(session) = self.controller.session(&job.crawl_id) else {
            self.store
                .fail(&job.crawl_id, &job.id, "crawl session no longer active".to_string())
                .await;
            return;
        };

        let max_retries = session.request.scraper_options.max_retries.unwrap_or(2);
        let use_browser = session.request.scraper_options.use_browser;

        let mut attempt = 0u32;
        let outcome = loop {
            let slot = self.rate_limit.acquire(&job.url).await;
            let fetched = if use_browser {
                self.fetch_with_browser(&job, &session.request).await
            } else {
                let options = self.build_http_options(&session.request.scraper_options);
                http::fetch(&job.url, &options).await.map_err(anyhow::Error::from)
            };

            match fetched {
                Ok(page) => {
                    self.rate_limit.release(slot, FetchOutcome::Success);
                    break Ok(page);
                }
                Err(e) => {
                    self.rate_limit.release(slot, FetchOutcome::Failure);
                    let kind = crate::crawl_engine::crawl_types::FailureKind::classify(&e);
                    if attempt >= max_retries || !kind.is_retryable() {
                        break Err(e);
                    }
                    attempt += 1;
                    tracing::debug!(url = %job.url, attempt, ?kind, "retrying fetch");
                }
            }
        };

        match outcome {
            Ok(page) => {
                let result = match self.handle_page(&job, &session, &page).await {
                    Ok(exported_file) => JobResult { final_url: page.final_url.clone(), exported_file },
                    Err(e) => {
                        tracing::warn!(url = %job.url, error = %e, "post-fetch processing failed");
                        JobResult { final_url: page.final_url.clone(), exported_file: None }
                    }
                };
                self.store.complete(&job.crawl_id, &job.id, result).await;
            }
            Err(e) => {
                tracing::warn!(url = %job.url, error = %e, "fetch failed");
                if job.priority == JobPriority::Kickoff {
                    if let Ok(mut guard) = failure.lock() {
                        *guard = Some(e.to_string());
                    }
                }
                self.store.fail(&job.crawl_id, &job.id, e.to_string()).await;
            }
        }
    }

    /// Builds per-request fetch options from a crawl's scraper options,
    /// honoring its timeout, TLS bypass, caller-supplied headers, and
    /// (when enabled) a rotated user agent from [`RateLimitPolicy`].
    fn build_http_options(&self, options: &crate::api::ScraperOptions) -> http::HttpFetchOptions {
        let rotated = options.rotate_user_agent.then(|| self.rate_limit.next_user_agent());
        http::HttpFetchOptions::from_scraper_options(options, rotated)
    }

    async fn fetch_with_browser(
        &self,
        job: &Job,
        request: &crate::api::CrawlRequest,
    ) -> Result<FetchedPage> {
        let pool = self
            .browser_pool
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("browser fetch requested but no browser pool configured"))?;
        let options = browser::BrowserFetchOptions {
            wait_for_selector: request.scraper_options.wait_for_selector.clone(),
            actions: request.scraper_options.actions.clone(),
            max_scrolls: request.scraper_options.max_scrolls.unwrap_or(0),
            block_resources: request.scraper_options.block_resources.clone(),
            timeout: request.scraper_options.timeout_secs.map(std::time::Duration::from_secs),
            ecommerce_priming: false,
        };
        browser::fetch(pool, &job.url, &options)
            .await
            .map_err(anyhow::Error::from)
    }

    /// Renders and caches the page body, admits its links into the crawl's
    /// frontier, and returns the exported file path, if any (this crate
    /// keeps rendered bodies in the response cache rather than writing them
    /// to an output directory, so this is always `None` today).
    async fn handle_page(
        &self,
        job: &Job,
        session: &crate::controller::CrawlSession,
        page: &FetchedPage,
    ) -> Result<Option<String>> {
        let key = self.cache_key(job, session);
        let html = page.html.clone();
        let only_main = session.request.scraper_options.only_main_content;
        let format = format!("{:?}", session.request.scraper_options.extractor_format);
        self.cache
            .get_or_build(key, &job.url, || async move {
                let body = render_body(&html, only_main, &format).await?;
                Ok((
                    ExtractedPage {
                        final_url: page.final_url.clone(),
                        body,
                    },
                    "text/markdown".to_string(),
                ))
            })
            .await?;

        let depth = job.depth + 1;
        let candidates = page.links.iter().cloned().map(|link| (link, depth));
        self.controller
            .enqueue_discovered(&job.crawl_id, &session.frontier, candidates, session.discovery_cap)
            .await?;
        Ok(None)
    }

    fn cache_key(&self, job: &Job, session: &crate::controller::CrawlSession) -> Fingerprint {
        fingerprint(&FingerprintInputs {
            url: job.url.clone(),
            use_browser: session.request.scraper_options.use_browser,
            only_main_content: session.request.scraper_options.only_main_content,
            extractor_format: Some(format!("{:?}", session.request.scraper_options.extractor_format)),
            wait_for_selector: session.request.scraper_options.wait_for_selector.clone(),
        })
    }
}

pub(crate) async fn render_body(html: &str, only_main: bool, format: &str) -> Result<String> {
    if format == "Html" {
        return Ok(html.to_string());
    }
    let options = if only_main {
        ConversionOptions::minimal()
    } else {
        ConversionOptions::default()
    };
    if format == "Text" {
        return Ok(strip_markdown_punctuation(&convert_html_to_markdown(html, &ConversionOptions::text_only()).await?));
    }
    convert_html_to_markdown(html, &options).await
}

fn strip_markdown_punctuation(markdown: &str) -> String {
    markdown
        .chars()
        .filter(|c| !matches!(c, '#' | '*' | '_' | '`'))
        .collect()
}

/// Reports whether `crawl_id` has fully finished, for callers polling
/// outside [`WorkerPool::run`]'s own completion.
pub fn is_complete(store: &JobStore, crawl_id: &str) -> bool {
    matches!(store.state(crawl_id), Some(state) if state != crate::job_store::CrawlState::Scraping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_body_returns_raw_html_for_html_format() {
        let html = "<html><body><p>hi</p></body></html>";
        let body = render_body(html, false, "Html").await.unwrap();
        assert_eq!(body, html);
    }

    #[tokio::test]
    async fn render_body_strips_markdown_punctuation_for_text_format() {
        let html = "<h1>Title</h1><p>Some <strong>bold</strong> text</p>";
        let body = render_body(html, false, "Text").await.unwrap();
        assert!(!body.contains('#'));
        assert!(!body.contains('*'));
    }

    #[tokio::test]
    async fn render_body_defaults_to_markdown() {
        let html = "<h1>Title</h1>";
        let body = render_body(html, false, "Markdown").await.unwrap();
        assert!(body.contains("Title"));
    }

    #[test]
    fn strip_markdown_punctuation_removes_emphasis_markers() {
        let out = strip_markdown_punctuation("# Title\n**bold** and `code`");
        assert_eq!(out, " Title\nbold and code");
    }

    #[tokio::test]
    async fn is_complete_false_while_scraping() {
        let store = JobStore::new();
        let crawl_id = store.create_crawl(
            "https://example.com".into(),
            crate::frontier::TraversalStrategy::Bfs,
        );
        assert!(!is_complete(&store, &crawl_id));
        store.finish(&crawl_id, None).await;
        assert!(is_complete(&store, &crawl_id));
    }

    fn pool() -> WorkerPool {
        WorkerPool::new(
            Arc::new(JobStore::new()),
            Arc::new(Controller::new(
                Arc::new(JobStore::new()),
                Arc::new(crate::robots::RobotsPolicy::new(reqwest::Client::new(), true)),
                reqwest::Client::new(),
            )),
            Arc::new(RateLimitPolicy::new(
                4,
                1.0,
                Duration::from_millis(10),
                Duration::from_secs(1),
                Vec::new(),
            )),
            None,
            Arc::new(ResponseCache::new(std::env::temp_dir(), 3600)),
            2,
        )
    }

    #[test]
    fn build_http_options_honors_timeout_tls_and_headers() {
        let options = crate::api::ScraperOptions {
            timeout_secs: Some(5),
            skip_tls_verification: true,
            headers: vec![("X-Test".to_string(), "1".to_string())],
            ..Default::default()
        };
        let fetch_options = pool().build_http_options(&options);
        assert_eq!(fetch_options.timeout, Duration::from_secs(5));
        assert!(fetch_options.skip_tls_verification);
        assert_eq!(fetch_options.headers, vec![("X-Test".to_string(), "1".to_string())]);
    }

    #[test]
    fn build_http_options_rotates_user_agent_when_enabled() {
        let options = crate::api::ScraperOptions {
            rotate_user_agent: true,
            ..Default::default()
        };
        let worker = pool();
        let first = worker.build_http_options(&options).user_agent;
        let second = worker.build_http_options(&options).user_agent;
        assert!(crate::crawl_engine::rate_limit::USER_AGENT_POOL.contains(&first.as_str()));
        assert_ne!(first, second);
    }

    #[test]
    fn build_http_options_uses_explicit_user_agent_without_rotation() {
        let options = crate::api::ScraperOptions {
            user_agent: Some("custom-agent/1.0".to_string()),
            ..Default::default()
        };
        assert_eq!(pool().build_http_options(&options).user_agent, "custom-agent/1.0");
    }
}
