//! Rate-limit + UA/proxy rotation contract (C7).
//!
//! Extends [`super::rate_limiter::CrawlRateLimiter`] (lock-free per-domain
//! token bucket) and [`super::domain_limiter::DomainLimiter`] (per-domain
//! concurrency semaphore) with the `acquire`/`release`/UA/proxy rotation
//! contract: `acquire` waits for both a concurrency permit and the
//! minimum-interval pacing; `release` on failure doubles the host's backoff
//! (capped at `max_delay`), and resets to `min_delay` on success.

use super::domain_limiter::DomainLimiter;
use super::rate_limiter::{extract_domain, CrawlRateLimiter};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OwnedSemaphorePermit;

/// Desktop user agent strings cycled round-robin when UA rotation is on.
pub const USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Failure,
}

/// A held slot for one host: the concurrency permit plus the backoff state
/// needed to report the outcome back via [`RateLimitPolicy::release`].
pub struct AcquiredSlot {
    permit: OwnedSemaphorePermit,
    host: String,
}

struct Backoff {
    current: AtomicU64, // millis
}

/// Combines per-domain pacing/concurrency with UA/proxy round-robin
/// rotation. One instance is shared across all fetchers in a crawl.
pub struct RateLimitPolicy {
    limiter: CrawlRateLimiter,
    concurrency: DomainLimiter,
    backoffs: DashMap<String, Arc<Backoff>>,
    min_delay: Duration,
    max_delay: Duration,
    rate_rps: f64,
    user_agents: Vec<String>,
    ua_cursor: AtomicUsize,
    proxies: Vec<String>,
    proxy_cursor: AtomicUsize,
}

impl RateLimitPolicy {
    pub fn new(
        max_per_domain: usize,
        rate_rps: f64,
        min_delay: Duration,
        max_delay: Duration,
        proxies: Vec<String>,
    ) -> Self {
        Self {
            limiter: CrawlRateLimiter::new(),
            concurrency: DomainLimiter::new(max_per_domain),
            backoffs: DashMap::new(),
            min_delay,
            max_delay,
            rate_rps,
            user_agents: USER_AGENT_POOL.iter().map(|s| s.to_string()).collect(),
            ua_cursor: AtomicUsize::new(0),
            proxies,
            proxy_cursor: AtomicUsize::new(0),
        }
    }

    /// Waits for a concurrency permit and the domain's minimum-interval
    /// pacing (token bucket plus any accumulated backoff), then returns the
    /// slot to release once the fetch completes.
    pub async fn acquire(&self, url: &str) -> AcquiredSlot {
        let host = extract_domain(url).unwrap_or_default();
        let permit = self.concurrency.acquire(host.clone()).await;

        loop {
            use super::rate_limiter::RateLimitDecision;
            match self.limiter.check(url, self.rate_rps).await {
                RateLimitDecision::Allow => break,
                RateLimitDecision::Deny { retry_after } => {
                    tokio::time::sleep(retry_after).await;
                }
            }
        }

        let backoff = self.backoff_state(&host);
        let wait = Duration::from_millis(backoff.current.load(Ordering::Relaxed));
        if wait > Duration::ZERO {
            tokio::time::sleep(wait).await;
        }

        AcquiredSlot { permit, host }
    }

    /// Reports how the fetch went: success resets backoff to `min_delay`,
    /// failure doubles it (capped at `max_delay`).
    pub fn release(&self, slot: AcquiredSlot, outcome: FetchOutcome) {
        let backoff = self.backoff_state(&slot.host);
        match outcome {
            FetchOutcome::Success => {
                backoff
                    .current
                    .store(self.min_delay.as_millis() as u64, Ordering::Relaxed);
            }
            FetchOutcome::Failure => {
                let max = self.max_delay.as_millis() as u64;
                let min = self.min_delay.as_millis().max(1) as u64;
                backoff
                    .current
                    .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                        Some((current.max(min) * 2).min(max))
                    })
                    .ok();
            }
        }
        drop(slot.permit);
    }

    fn backoff_state(&self, host: &str) -> Arc<Backoff> {
        self.backoffs
            .entry(host.to_string())
            .or_insert_with(|| {
                Arc::new(Backoff {
                    current: AtomicU64::new(self.min_delay.as_millis() as u64),
                })
            })
            .clone()
    }

    /// Returns the next user agent in round-robin order.
    pub fn next_user_agent(&self) -> &str {
        if self.user_agents.is_empty() {
            return "";
        }
        let idx = self.ua_cursor.fetch_add(1, Ordering::Relaxed) % self.user_agents.len();
        &self.user_agents[idx]
    }

    /// Returns the next proxy in round-robin order, or `None` if no proxy
    /// list was configured.
    pub fn next_proxy(&self) -> Option<&str> {
        if self.proxies.is_empty() {
            return None;
        }
        let idx = self.proxy_cursor.fetch_add(1, Ordering::Relaxed) % self.proxies.len();
        Some(&self.proxies[idx])
    }
}
