use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RedmineError, Result};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for a Redmine instance.
///
/// Both the URL and the API key are optional here; their absence is only an
/// error once a request actually needs them.
#[derive(Debug, Clone)]
pub struct RedmineConfig {
    /// Base URL of the tracker, without a trailing slash
    pub base_url: Option<String>,
    /// Value sent in the `X-Redmine-API-Key` header
    pub api_key: Option<String>,
    /// Location of the metadata cache file
    pub cache_file: PathBuf,
    /// Per-request timeout applied by the HTTP client
    pub timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates
    pub insecure: bool,
}

impl Default for RedmineConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            cache_file: default_cache_file(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure: false,
        }
    }
}

impl RedmineConfig {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.and_then(|url| normalize_base_url(&url)),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            ..Self::default()
        }
    }

    pub fn with_cache_file(mut self, path: PathBuf) -> Self {
        self.cache_file = path;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// The configured base URL, or a configuration error.
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| RedmineError::Config("Missing REDMINE_URL environment variable".to_string()))
    }

    /// The configured API key, or a configuration error.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            RedmineError::Config("Missing REDMINE_API_KEY environment variable".to_string())
        })
    }
}

/// `$HOME/.cache/redmine_mcp/cache.json`, falling back to the working
/// directory when no home directory is known.
pub fn default_cache_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join("redmine_mcp")
        .join("cache.json")
}

fn normalize_base_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
