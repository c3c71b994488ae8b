//! Process-level ambient configuration read once at startup, independent of
//! any single crawl's [`crate::api::CrawlRequest`].

use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub cache_enabled: bool,
    pub cache_ttl_secs: i64,
    pub cache_directory: Option<String>,
    pub redis_host: Option<String>,
    pub redis_port: Option<u16>,
    pub log_level: String,
    /// `LLM_*` vars, stored opaquely — no LLM client lives in this crate; an
    /// outer collaborator reads these through [`Self::llm_vars`].
    llm_vars: HashMap<String, String>,
}

impl ProcessConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()),
            api_key: std::env::var("API_KEY").ok(),
            cache_enabled: std::env::var("CACHE_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            cache_ttl_secs: std::env::var("CACHE_TTL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3600),
            cache_directory: std::env::var("CACHE_DIRECTORY").ok(),
            redis_host: std::env::var("REDIS_HOST").ok(),
            redis_port: std::env::var("REDIS_PORT").ok().and_then(|v| v.parse().ok()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            llm_vars: std::env::vars().filter(|(k, _)| k.starts_with("LLM_")).collect(),
        }
    }

    pub fn llm_vars(&self) -> &HashMap<String, String> {
        &self.llm_vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_env_unset() {
        // SAFETY: test-only process-wide env mutation; no other test in this
        // crate reads these specific keys concurrently.
        unsafe {
            std::env::remove_var("CACHE_ENABLED");
            std::env::remove_var("CACHE_TTL");
            std::env::remove_var("LOG_LEVEL");
        }
        let config = ProcessConfig::from_env();
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl_secs, 3600);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn collects_llm_prefixed_vars_opaquely() {
        // SAFETY: see above.
        unsafe {
            std::env::set_var("LLM_API_KEY", "secret");
        }
        let config = ProcessConfig::from_env();
        assert_eq!(
            config.llm_vars().get("LLM_API_KEY").map(String::as_str),
            Some("secret")
        );
        unsafe {
            std::env::remove_var("LLM_API_KEY");
        }
    }
}
