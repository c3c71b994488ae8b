//! Plain HTTP fetcher (C5): no browser, just `reqwest` + link extraction.
//!
//! Grounded on `examples/aichat-bot-crawly`'s `Crawler::crawl` request/robots
//! flow (`reqwest::Client`, `scraper::Html`/`Selector` for `<a href>`
//! extraction, cf-mitigation header check) generalized to this crate's
//! `CoreError`/fetch-options shape instead of that crate's own recursive
//! crawl loop.

use crate::errors::{CoreError, CoreResult};
use crate::fetch::FetchedPage;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use std::time::Duration;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

#[derive(Debug, Clone)]
pub struct HttpFetchOptions {
    pub timeout: Duration,
    pub skip_tls_verification: bool,
    pub user_agent: String,
    pub max_redirects: usize,
    pub headers: Vec<(String, String)>,
}

impl Default for HttpFetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            skip_tls_verification: false,
            user_agent: crate::robots::ROBOTS_USER_AGENT.to_string(),
            max_redirects: 10,
            headers: Vec::new(),
        }
    }
}

impl HttpFetchOptions {
    /// Builds fetch options from a caller-supplied [`crate::api::ScraperOptions`],
    /// honoring its timeout, TLS bypass, and headers (§4.5). Pass
    /// `rotated_user_agent` when `rotate_user_agent` is set so the caller's
    /// round-robin choice wins over an explicit `user_agent`.
    pub fn from_scraper_options(
        options: &crate::api::ScraperOptions,
        rotated_user_agent: Option<&str>,
    ) -> Self {
        let mut fetch_options = Self {
            timeout: options
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(Duration::from_secs(30)),
            skip_tls_verification: options.skip_tls_verification,
            headers: options.headers.clone(),
            ..Default::default()
        };
        if options.rotate_user_agent {
            if let Some(ua) = rotated_user_agent {
                fetch_options.user_agent = ua.to_string();
            }
        } else if let Some(user_agent) = &options.user_agent {
            fetch_options.user_agent = user_agent.clone();
        }
        fetch_options
    }
}

fn build_client(options: &HttpFetchOptions) -> CoreResult<reqwest::Client> {
    let mut header_map = reqwest::header::HeaderMap::new();
    for (name, value) in &options.headers {
        let Ok(name) = reqwest::header::HeaderName::from_bytes(name.as_bytes()) else {
            continue;
        };
        let Ok(value) = reqwest::header::HeaderValue::from_str(value) else {
            continue;
        };
        header_map.insert(name, value);
    }
    reqwest::Client::builder()
        .timeout(options.timeout)
        .danger_accept_invalid_certs(options.skip_tls_verification)
        .redirect(reqwest::redirect::Policy::limited(options.max_redirects))
        .user_agent(options.user_agent.clone())
        .default_headers(header_map)
        .build()
        .map_err(|e| CoreError::NavigationFailure(format!("client build failed: {e}")))
}

/// Fetches `url`, following redirects, and returns the final URL, status,
/// raw HTML, and every `<a href>` target resolved against the final URL.
pub async fn fetch(url: &str, options: &HttpFetchOptions) -> CoreResult<FetchedPage> {
    let client = build_client(options)?;
    fetch_with_client(&client, url).await
}

pub async fn fetch_with_client(client: &reqwest::Client, url: &str) -> CoreResult<FetchedPage> {
    let response = tokio::time::timeout(Duration::from_secs(60), client.get(url).send())
        .await
        .map_err(|_| CoreError::Timeout(url.to_string()))?
        .map_err(|e| CoreError::classify(url, &anyhow::anyhow!(e)))?;

    if response
        .headers()
        .get("cf-mitigated")
        .is_some_and(|v| v.as_bytes() == b"challenge")
    {
        return Err(CoreError::BlockedByBot);
    }

    let status = response.status();
    let final_url = response.url().to_string();
    if !status.is_success() {
        return Err(CoreError::HttpStatus {
            code: status.as_u16(),
            url: final_url,
        });
    }

    let html = response
        .text()
        .await
        .map_err(|e| CoreError::classify(&final_url, &anyhow::anyhow!(e)))?;

    let links = extract_links(&html, &final_url);

    Ok(FetchedPage {
        final_url,
        html,
        status: status.as_u16(),
        links,
    })
}

/// Extracts every `<a href>` target, resolved against `base`. Relative/
/// malformed hrefs that don't resolve are silently skipped.
pub fn extract_links(html: &str, base: &str) -> Vec<String> {
    let Ok(base_url) = url::Url::parse(base) else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| base_url.join(href).ok())
        .map(|u| u.to_string())
        .collect()
}
