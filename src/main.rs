//! Demo entrypoint: runs a single crawl against a seed URL passed on the
//! command line, draining the job queue with a [`WorkerPool`] until the
//! crawl finishes, then prints a status summary.
//!
//! This binary is a thin driver over the library's public API
//! (`Controller`, `JobStore`, `WorkerPool`) — an HTTP/tool-server surface
//! sitting in front of this crate is out of scope; an outer collaborator
//! owns routing, auth, and packaging.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use webcrawl_engine::api::CrawlRequest;
use webcrawl_engine::cache::ResponseCache;
use webcrawl_engine::config::ProcessConfig;
use webcrawl_engine::controller::Controller;
use webcrawl_engine::crawl_engine::RateLimitPolicy;
use webcrawl_engine::job_store::JobStore;
use webcrawl_engine::robots::RobotsPolicy;
use webcrawl_engine::worker::WorkerPool;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let process_config = ProcessConfig::from_env();
    tracing::info!(log_level = %process_config.log_level, "starting webcrawl-engine");

    let url = std::env::args()
        .nth(1)
        .context("usage: webcrawl-engine <url>")?;

    let http_client = reqwest::Client::new();
    let store = Arc::new(JobStore::new());
    let robots = Arc::new(RobotsPolicy::new(http_client.clone(), false));
    let controller = Arc::new(Controller::new(store.clone(), robots, http_client));

    let rate_limit = Arc::new(RateLimitPolicy::new(
        4,
        1.0,
        Duration::from_millis(250),
        Duration::from_secs(5),
        Vec::new(),
    ));
    let cache_dir = process_config
        .cache_directory
        .clone()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    let cache = Arc::new(ResponseCache::new(cache_dir, process_config.cache_ttl_secs));
    let worker_pool = WorkerPool::new(store.clone(), controller.clone(), rate_limit, None, cache, 4);

    let request = CrawlRequest {
        url: url.clone(),
        ..Default::default()
    };

    let crawl_id = controller.start(&request).await?;
    tracing::info!(%crawl_id, "crawl started");

    worker_pool.run(&crawl_id).await;

    let status = controller
        .status(&crawl_id, 0, 20)
        .await
        .context("crawl status missing after finish")?;
    println!(
        "crawl {} state={:?} pages_done={} pages_queued={}",
        status.crawl_id, status.state, status.pages_done, status.pages_queued
    );
    for result in &status.results {
        println!("  {} -> {}", result.url, result.final_url);
    }

    Ok(())
}
