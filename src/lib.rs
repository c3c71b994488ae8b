#![feature(integer_atomics)]

pub mod api;
pub mod browser_pool;
pub mod browser_profile;
pub mod browser_setup;
pub mod cache;
pub mod config;
pub mod content_saver;
pub mod controller;
pub mod crawl_engine;
pub mod crawl_events;
pub mod errors;
pub mod fetch;
pub mod frontier;
pub mod imurl;
pub mod job_store;
pub mod kromekover;
pub mod page_extractor;
pub mod robots;
pub mod runtime;
pub mod scrape;
pub mod url_normalizer;
pub mod utils;
pub mod worker;

pub use browser_pool::{BrowserPool, BrowserPoolConfig, PooledBrowserGuard};
pub use browser_setup::{
    apply_stealth_measures, download_managed_browser, find_browser_executable, launch_browser,
};
pub use cache::{CacheEntry, Fingerprint, ResponseCache};
pub use config::ProcessConfig;
pub use content_saver::{CacheMetadata, save_json_data};
pub use controller::{CompletedResult, Controller, CrawlStatusReport};
pub use crawl_engine::{CrawlError, CrawlQueue, CrawlResult, FailureKind, RateLimitPolicy};
pub use errors::{CoreError, CoreResult};
pub use frontier::{Frontier, Scope, TraversalStrategy};
pub use imurl::ImUrl;
pub use job_store::{Job, JobStore};
pub use scrape::{scrape, ScrapeOutcome};
pub use page_extractor::schema::*;
pub use robots::RobotsPolicy;
pub use runtime::{AsyncJsonSave, AsyncStream, BrowserAction, CrawlRequest};
pub use utils::{get_mirror_path, get_uri_from_path};
pub use worker::WorkerPool;

/// Macro for handling streaming data chunks with safe unwrapping
#[macro_export]
macro_rules! on_chunk {
    ($closure:expr) => {
        move |chunk| match chunk {
            Ok(data) => $closure(data),
            Err(e) => {
                tracing::warn!(error = ?e, "Chunk processing error");
            }
        }
    };
}

/// Macro for handling errors with safe unwrapping
#[macro_export]
macro_rules! on_error {
    ($closure:expr) => {
        move |error| match error {
            Some(e) => $closure(e),
            None => {
                tracing::error!("Unknown error occurred in event handler");
            }
        }
    };
}
