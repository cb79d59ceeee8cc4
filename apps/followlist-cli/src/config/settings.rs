//! CLI settings persisted as config.json

use crate::config::ConfigPaths;
use crate::error::CliResult;
use followlist_core::fetch::{DEFAULT_MAX_ITEMS, DEFAULT_MAX_PAGES, MAX_PAGE_SIZE};
use followlist_core::recent::DEFAULT_RECENT_LIMIT;
use followlist_core::reference::DEFAULT_WEB_HOSTS;
use followlist_core::PaginationLimits;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding `handle_resolver`
pub const HANDLE_RESOLVER_ENV: &str = "FOLLOWLIST_HANDLE_RESOLVER";

/// Environment variable overriding `client_id`
pub const CLIENT_ID_ENV: &str = "FOLLOWLIST_CLIENT_ID";

/// CLI configuration
///
/// Every field has a default so a partial (or missing) config.json is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service used to resolve handles before login
    pub handle_resolver: String,

    /// PLC directory for `did:plc` documents
    pub plc_directory: String,

    /// Service the PDS proxies `app.bsky.*` reads to
    pub appview: String,

    /// Hosted client-metadata URL; local development identity when unset
    pub client_id: Option<String>,

    /// Loopback port receiving the authorization redirect
    pub callback_port: u16,

    /// Items requested per page (1..=100)
    pub page_size: u32,

    /// Upper bound on pages drained from one collection
    pub max_pages: u32,

    /// Upper bound on items drained from one collection
    pub max_items: usize,

    /// Pause between page requests, in milliseconds
    pub page_delay_ms: u64,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,

    /// How long to wait for the browser sign-in, in seconds
    pub login_timeout_secs: u64,

    /// How many recent handles to remember
    pub recent_handles_limit: usize,

    /// Hosts whose list URLs are accepted
    pub web_hosts: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            handle_resolver: "https://bsky.social".to_string(),
            plc_directory: "https://plc.directory".to_string(),
            appview: "did:web:api.bsky.app#bsky_appview".to_string(),
            client_id: None,
            callback_port: 5173,
            page_size: MAX_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_items: DEFAULT_MAX_ITEMS,
            page_delay_ms: 50,
            timeout_secs: 30,
            login_timeout_secs: 300,
            recent_handles_limit: DEFAULT_RECENT_LIMIT,
            web_hosts: DEFAULT_WEB_HOSTS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

impl Config {
    /// Load config.json (defaults when absent), then apply environment overrides
    pub fn load(paths: &ConfigPaths) -> CliResult<Self> {
        let mut config = if paths.config_file.exists() {
            let content = std::fs::read_to_string(&paths.config_file)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides(|key| std::env::var(key).ok());
        debug!(
            handle_resolver = %config.handle_resolver,
            hosted = config.client_id.is_some(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Apply overrides from a variable lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(resolver) = lookup(HANDLE_RESOLVER_ENV).filter(|v| !v.trim().is_empty()) {
            self.handle_resolver = resolver;
        }
        if let Some(client_id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.client_id = Some(client_id);
        }
    }

    /// Pagination bounds for collection drains
    pub fn pagination_limits(&self) -> CliResult<PaginationLimits> {
        Ok(PaginationLimits::new(
            self.page_size,
            self.max_pages,
            self.max_items,
            Duration::from_millis(self.page_delay_ms),
        )?)
    }

    /// HTTP request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Browser sign-in timeout
    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.handle_resolver, "https://bsky.social");
        assert_eq!(config.callback_port, 5173);
        assert_eq!(config.page_size, 100);
        assert_eq!(config.recent_handles_limit, 5);
        assert!(config.client_id.is_none());
        assert_eq!(config.web_hosts, vec!["bsky.app", "www.bsky.app"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{"page_size": 25}"#).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_pages, 1000);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::in_dir(temp.path());
        std::fs::write(&paths.config_file, r#"{"callback_port": 8123, "max_items": 500}"#).unwrap();

        let loaded = Config::load(&paths).unwrap();
        assert_eq!(loaded.callback_port, 8123);
        assert_eq!(loaded.max_items, 500);
        assert_eq!(loaded.page_size, 100);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| match key {
            HANDLE_RESOLVER_ENV => Some("https://resolver.example".to_string()),
            CLIENT_ID_ENV => Some("https://app.example/api/client-metadata".to_string()),
            _ => None,
        });
        assert_eq!(config.handle_resolver, "https://resolver.example");
        assert_eq!(
            config.client_id.as_deref(),
            Some("https://app.example/api/client-metadata")
        );
    }

    #[test]
    fn test_blank_env_override_ignored() {
        let mut config = Config::default();
        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.handle_resolver, "https://bsky.social");
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_invalid_page_size_rejected() {
        let config = Config {
            page_size: 500,
            ..Config::default()
        };
        assert!(config.pagination_limits().is_err());
    }
}
