//! Crawl engine support modules: rate limiting, circuit breaking, retry
//! queueing, and the shared failure-classification/queue types the
//! [`crate::worker`] pool and [`crate::controller`] build on.

// Sub-modules
pub mod circuit_breaker;
pub mod crawl_types;
pub mod domain_limiter;
pub mod page_timeout;
pub mod rate_limit;
pub mod rate_limiter;
pub mod retry_queue;

// Re-export rate limiter types
pub use rate_limiter::{check_crawl_rate_limit, check_http_rate_limit, RateLimitDecision};

// Re-export the acquire/release/UA/proxy rotation policy built on top
pub use rate_limit::{AcquiredSlot, FetchOutcome, RateLimitPolicy};

// Re-export circuit breaker types
pub use circuit_breaker::{extract_domain, CircuitBreaker, CircuitState, DomainHealth};

// Re-export domain limiter
pub use domain_limiter::DomainLimiter;

// Re-export crawl types
pub use crawl_types::{CrawlError, CrawlQueue, CrawlResult, FailureKind};

// Re-export retry queue
pub use retry_queue::RetryQueue;
