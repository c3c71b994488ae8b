//! URL normalization and similarity classing.
//!
//! Canonicalizes URLs for storage/dedup keys and buckets near-duplicate URLs
//! (trailing slash, `www.` prefix, query parameter order) into the same
//! similarity class so the frontier doesn't re-crawl cosmetically-different
//! variants of the same resource.

use crate::imurl::ImUrl;
use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

/// Query parameters stripped during normalization because they carry no
/// resource-identity information (tracking/session noise).
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_cid", "mc_eid"];

static UTM_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^utm_[a-z_]+$").expect("BUG: invalid utm_ regex"));

static SESSION_PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(jsessionid|phpsessid|sid|sessionid)$").expect("BUG: invalid session regex")
});

static INDEX_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/index\.(html?|php)$").expect("BUG: invalid index-path regex")
});

fn is_noise_param(key: &str) -> bool {
    UTM_PARAM.is_match(key) || SESSION_PARAM.is_match(key) || TRACKING_PARAMS.contains(&key)
}

/// A canonical string form of a URL, suitable for use as a cache/visited key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct CanonicalUrl(pub String);

impl std::fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A coarser key than `CanonicalUrl`: URLs whose similarity class matches are
/// treated as the same page for visited/lock tracking even though their
/// canonical forms might differ in parameter order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SimilarityClass(pub String);

fn collect_sorted_query(url: &url::Url) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| !is_noise_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort();
    pairs
}

/// Canonicalizes a URL: lowercases scheme/host, strips default ports and the
/// `www.` prefix, drops the fragment, collapses `/index.{html,htm,php}` to
/// `/`, strips tracking/session query parameters, and sorts the remaining
/// query parameters.
pub fn normalize(input: &str) -> Result<CanonicalUrl> {
    let parsed = ImUrl::parse(input)?;
    let mut url: url::Url = (*parsed).clone();

    let scheme = url.scheme().to_ascii_lowercase();
    let _ = url.set_scheme(&scheme);

    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        let stripped = lower.strip_prefix("www.").unwrap_or(&lower).to_string();
        let _ = url.set_host(Some(&stripped));
    }

    let default_port = match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    if url.port() == default_port {
        let _ = url.set_port(None);
    }

    url.set_fragment(None);

    let path = INDEX_PATH.replace(url.path(), "/").into_owned();
    url.set_path(&path);

    let sorted = collect_sorted_query(&url);
    if sorted.is_empty() {
        url.set_query(None);
    } else {
        let query = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        url.set_query(Some(&query));
    }

    Ok(CanonicalUrl(url.as_str().to_string()))
}

/// Buckets near-duplicate URLs together: differs from `normalize` by also
/// ignoring trailing-slash presence on non-root paths, so `/docs` and
/// `/docs/` land in the same class.
pub fn similarity_class(input: &str) -> Result<SimilarityClass> {
    let canonical = normalize(input)?;
    let mut url = url::Url::parse(&canonical.0)?;
    let trimmed_path = {
        let p = url.path();
        if p.len() > 1 {
            p.trim_end_matches('/').to_string()
        } else {
            p.to_string()
        }
    };
    url.set_path(&trimmed_path);
    Ok(SimilarityClass(url.as_str().to_string()))
}

/// Resolves a possibly-relative URL against a base URL.
pub fn resolve(base: &str, relative: &str) -> Result<CanonicalUrl> {
    let base_url = ImUrl::parse(base)?;
    let resolved = (*base_url).join(relative)?;
    normalize(resolved.as_str())
}

/// Returns `true` if normalizing `input` twice yields the same result
/// (idempotence, checked in tests rather than asserted here).
pub fn is_normalized(input: &str) -> bool {
    match normalize(input) {
        Ok(once) => matches!(normalize(&once.0), Ok(twice) if twice == once),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_default_port_and_www() {
        let n = normalize("HTTPS://WWW.Example.com:443/Path/").unwrap();
        assert_eq!(n.0, "https://example.com/Path/");
    }

    #[test]
    fn drops_fragment_and_tracking_params() {
        let n = normalize("https://example.com/page?utm_source=x&id=1#section").unwrap();
        assert_eq!(n.0, "https://example.com/page?id=1");
    }

    #[test]
    fn sorts_query_params() {
        let n = normalize("https://example.com/p?b=2&a=1").unwrap();
        assert_eq!(n.0, "https://example.com/p?a=1&b=2");
    }

    #[test]
    fn collapses_index_html() {
        let n = normalize("https://example.com/docs/index.html").unwrap();
        assert_eq!(n.0, "https://example.com/docs/");
    }

    #[test]
    fn similarity_class_ignores_trailing_slash() {
        let a = similarity_class("https://example.com/docs").unwrap();
        let b = similarity_class("https://example.com/docs/").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn resolve_relative_against_base() {
        let r = resolve("https://example.com/a/b", "../c").unwrap();
        assert_eq!(r.0, "https://example.com/c");
    }

    #[test]
    fn normalize_is_idempotent() {
        assert!(is_normalized("https://WWW.Example.com:443/a/?b=1&a=2#x"));
    }
}
