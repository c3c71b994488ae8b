//! Crate-level typed error surface.
//!
//! Internal plumbing keeps returning `anyhow::Result` where the teacher does
//! (browser setup, page extraction); subsystem boundaries (fetch, cache,
//! controller) convert into `CoreError`, which carries the small set of
//! caller-facing error tags a crawl/scrape result can report.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("robots.txt disallows this URL")]
    RobotsDisallowed,

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("HTTP status {code} for {url}")]
    HttpStatus { code: u16, url: String },

    #[error("navigation failed: {0}")]
    NavigationFailure(String),

    #[error("TLS failure: {0}")]
    TlsFailure(String),

    #[error("request blocked by anti-bot protection")]
    BlockedByBot,

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("content cleaning failed: {0}")]
    CleanError(String),

    #[error("markdown/text transform failed: {0}")]
    TransformError(String),

    #[error("cache I/O failed: {0}")]
    CacheIoFailure(String),

    #[error("cancelled by user")]
    CancelledByUser,
}

impl CoreError {
    /// Classifies a lower-level error (from reqwest/chromiumoxide/etc.) into
    /// a `CoreError` tag using the same message-pattern heuristic the
    /// teacher's `FailureKind::classify` uses, generalized to the broader
    /// tag set this crate exposes to callers.
    pub fn classify(context: &str, err: &anyhow::Error) -> Self {
        let msg = err.to_string().to_lowercase();
        if msg.contains("timeout") || msg.contains("timed out") {
            CoreError::Timeout(context.to_string())
        } else if msg.contains("tls") || msg.contains("certificate") {
            CoreError::TlsFailure(context.to_string())
        } else if msg.contains("403") || msg.contains("captcha") || msg.contains("cf-mitigated") {
            CoreError::BlockedByBot
        } else if msg.contains("navigation") || msg.contains("goto") {
            CoreError::NavigationFailure(context.to_string())
        } else {
            CoreError::NavigationFailure(format!("{context}: {err}"))
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
