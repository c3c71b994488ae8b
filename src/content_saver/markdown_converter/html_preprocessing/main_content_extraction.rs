//! Main content extraction from HTML documents.
//!
//! Three-tier strategy, tried in order until one produces a qualifying
//! candidate (at least 300 characters of text, or at least one heading):
//! 1. Selector strategy — semantic containers in priority order (`<main>`,
//!    `<article>`, content-specific divs/ids, ...).
//! 2. Text-density strategy — score `div`/`section`/`article` descendants by
//!    `text_len + 1000 * heading_count` and take the highest scorer.
//! 3. Heading-reconstruction strategy — walk `h1`/`h2` nodes in document
//!    order and synthesize a container from the sibling run up to the next
//!    same-or-higher heading.
//!
//! If none of the three produce a candidate, falls back to `<body>`, then to
//! the raw input. Element filtering (nav, header, footer, sidebars, etc.) is
//! handled by htmd handlers downstream, not here.

use anyhow::Result;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

/// Maximum HTML input size to prevent memory exhaustion attacks (10 MB).
pub(super) const MAX_HTML_SIZE: usize = 10 * 1024 * 1024;

/// Minimum text length (in characters) a candidate container must have to
/// be accepted without at least one heading.
const MIN_QUALIFYING_TEXT_LEN: usize = 300;

// ============================================================================
// CSS Selectors
// ============================================================================

static MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main").expect("BUG: hardcoded CSS selector 'main' is invalid")
});
static ARTICLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("article").expect("BUG: hardcoded CSS selector 'article' is invalid")
});
static ROLE_MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[role='main']")
        .expect("BUG: hardcoded CSS selector \"[role='main']\" is invalid")
});
static MAIN_CONTENT_ID_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#main-content")
        .expect("BUG: hardcoded CSS selector '#main-content' is invalid")
});
static MAIN_CONTENT_CLASS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".main-content")
        .expect("BUG: hardcoded CSS selector '.main-content' is invalid")
});
static CONTENT_ID_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("#content").expect("BUG: hardcoded CSS selector '#content' is invalid")
});
static CONTENT_CLASS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".content").expect("BUG: hardcoded CSS selector '.content' is invalid")
});
static POST_CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".post-content")
        .expect("BUG: hardcoded CSS selector '.post-content' is invalid")
});
static ENTRY_CONTENT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".entry-content")
        .expect("BUG: hardcoded CSS selector '.entry-content' is invalid")
});
static ARTICLE_BODY_ITEMPROP_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[itemprop='articleBody']")
        .expect("BUG: hardcoded CSS selector \"[itemprop='articleBody']\" is invalid")
});
static ARTICLE_BODY_CLASS_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".article-body")
        .expect("BUG: hardcoded CSS selector '.article-body' is invalid")
});
static STORY_BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".story-body").expect("BUG: hardcoded CSS selector '.story-body' is invalid")
});
static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});
static DENSITY_CANDIDATE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div, section, article")
        .expect("BUG: hardcoded CSS selector 'div, section, article' is invalid")
});
static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6")
        .expect("BUG: hardcoded CSS selector 'h1, h2, h3, h4, h5, h6' is invalid")
});
static TOP_HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2").expect("BUG: hardcoded CSS selector 'h1, h2' is invalid")
});

/// Which of the three tiers (or fallbacks) produced the returned fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    Selector,
    TextDensity,
    HeadingReconstruction,
    BodyFallback,
    RawFallback,
}

/// Diagnostics about how `extract_main_content_with_stats` arrived at its
/// result, useful for the invariant checks in tests.
#[derive(Debug, Clone)]
pub struct CleanStats {
    pub strategy: ExtractionStrategy,
    pub heading_count: usize,
    pub text_len: usize,
}

fn heading_count(element: ElementRef) -> usize {
    element.select(&HEADING_SELECTOR).count()
}

fn text_len(element: ElementRef) -> usize {
    element.text().map(str::len).sum()
}

fn qualifies(element: ElementRef) -> bool {
    heading_count(element) >= 1 || text_len(element) >= MIN_QUALIFYING_TEXT_LEN
}

/// Extract main content container from HTML by identifying semantic
/// containers, falling back through text-density scoring, heading
/// reconstruction, `<body>`, and finally the raw input.
pub fn extract_main_content(html: &str) -> Result<String> {
    Ok(extract_main_content_with_stats(html)?.0)
}

/// As [`extract_main_content`], but also returns which strategy fired and
/// basic size diagnostics.
pub fn extract_main_content_with_stats(html: &str) -> Result<(String, CleanStats)> {
    if html.len() > MAX_HTML_SIZE {
        return Err(anyhow::anyhow!(
            "HTML input too large: {} bytes ({:.2} MB). Maximum allowed: {} bytes ({} MB). \
             This protects against memory exhaustion attacks.",
            html.len(),
            html.len() as f64 / 1_000_000.0,
            MAX_HTML_SIZE,
            MAX_HTML_SIZE / (1024 * 1024)
        ));
    }

    let document = Html::parse_document(html);

    let content_selectors = [
        &*MAIN_SELECTOR,
        &*ARTICLE_SELECTOR,
        &*ROLE_MAIN_SELECTOR,
        &*MAIN_CONTENT_ID_SELECTOR,
        &*MAIN_CONTENT_CLASS_SELECTOR,
        &*CONTENT_ID_SELECTOR,
        &*CONTENT_CLASS_SELECTOR,
        &*POST_CONTENT_SELECTOR,
        &*ENTRY_CONTENT_SELECTOR,
        &*ARTICLE_BODY_ITEMPROP_SELECTOR,
        &*ARTICLE_BODY_CLASS_SELECTOR,
        &*STORY_BODY_SELECTOR,
    ];

    // Tier 1: selector strategy. First candidate that qualifies wins; if a
    // selector matches but the content is too thin, fall through to later
    // selectors and then later tiers rather than giving up immediately.
    for selector in content_selectors {
        if let Some(element) = document.select(selector).next() {
            if qualifies(element) {
                return Ok((
                    element.html(),
                    CleanStats {
                        strategy: ExtractionStrategy::Selector,
                        heading_count: heading_count(element),
                        text_len: text_len(element),
                    },
                ));
            }
        }
    }

    // Tier 2: text-density strategy.
    if let Some(element) = highest_density_candidate(&document) {
        if qualifies(element) {
            return Ok((
                element.html(),
                CleanStats {
                    strategy: ExtractionStrategy::TextDensity,
                    heading_count: heading_count(element),
                    text_len: text_len(element),
                },
            ));
        }
    }

    // Tier 3: heading-reconstruction strategy.
    if let Some((fragment, stats)) = reconstruct_from_headings(&document) {
        return Ok((fragment, stats));
    }

    // Fall back to <body>.
    if let Some(body) = document.select(&BODY_SELECTOR).next() {
        return Ok((
            body.html(),
            CleanStats {
                strategy: ExtractionStrategy::BodyFallback,
                heading_count: heading_count(body),
                text_len: text_len(body),
            },
        ));
    }

    // Last resort: return the whole input unchanged.
    Ok((
        html.to_string(),
        CleanStats {
            strategy: ExtractionStrategy::RawFallback,
            heading_count: 0,
            text_len: html.len(),
        },
    ))
}

fn density_score(element: ElementRef) -> usize {
    text_len(element) + 1000 * heading_count(element)
}

fn highest_density_candidate(document: &Html) -> Option<ElementRef<'_>> {
    document
        .select(&DENSITY_CANDIDATE_SELECTOR)
        .max_by_key(|el| density_score(*el))
}

/// Walks `h1`/`h2` nodes in document order and slices the following sibling
/// run, up to the next `h1` or `h2`, into a synthetic container. Returns the
/// highest-scoring such section.
fn reconstruct_from_headings(document: &Html) -> Option<(String, CleanStats)> {
    let headings: Vec<ElementRef<'_>> = document.select(&TOP_HEADING_SELECTOR).collect();
    if headings.is_empty() {
        return None;
    }

    let mut best: Option<(String, CleanStats)> = None;

    for (i, heading) in headings.iter().enumerate() {
        let mut buf = String::new();
        buf.push_str(&heading.html());

        let mut node = heading.next_sibling();
        while let Some(current) = node {
            if let Some(el) = ElementRef::wrap(current) {
                if matches!(el.value().name(), "h1" | "h2") {
                    break;
                }
                buf.push_str(&el.html());
            } else if let Node::Text(text) = current.value() {
                buf.push_str(text);
            }
            node = current.next_sibling();
        }

        let wrapped = format!("<div>{buf}</div>");
        let fragment_doc = Html::parse_fragment(&wrapped);
        let div_selector = Selector::parse("div").expect("BUG: invalid 'div' selector");
        if let Some(container) = fragment_doc.select(&div_selector).next() {
            let heads = heading_count(container);
            let chars = text_len(container);
            if heads >= 1 || chars >= MIN_QUALIFYING_TEXT_LEN {
                let score = chars + 1000 * heads;
                let replace = match &best {
                    Some((_, prev)) => score > (prev.text_len + 1000 * prev.heading_count),
                    None => true,
                };
                if replace {
                    best = Some((
                        wrapped.clone(),
                        CleanStats {
                            strategy: ExtractionStrategy::HeadingReconstruction,
                            heading_count: heads,
                            text_len: chars,
                        },
                    ));
                }
            }
        }
        let _ = i;
    }

    best
}

// ============================================================================
// TESTS
// ============================================================================
