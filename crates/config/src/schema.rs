//! Config schema types (server, browser automation, key store).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarbleConfig {
    pub server: ServerConfig,
    pub browser: BrowserConfig,
    pub auth: AuthConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on. Defaults to 3000.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Browser automation configuration, shared by every session the registry
/// provisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run Chrome headless. Defaults to true; set to false for visual mode.
    pub headless: bool,
    /// Explicit Chrome/Chromium executable. Autodetected when unset.
    pub executable: Option<PathBuf>,
    /// Base URL of the automated site, stored without a trailing slash.
    pub base_url: String,
    /// User-agent override. Unset means the built-in desktop emulation
    /// profile.
    pub user_agent: Option<String>,
    /// Viewport override. Unset means the built-in desktop emulation profile.
    pub viewport_width: Option<u32>,
    pub viewport_height: Option<u32>,
    /// Selector-wait polling interval in milliseconds. Defaults to 100.
    pub wait_poll_ms: u64,
    /// Selector-wait timeout in milliseconds. 0 waits forever. Defaults to
    /// 30000.
    pub wait_timeout_ms: u64,
    /// Stylesheet URLs (substring match) exempt from request filtering.
    pub stylesheet_allowlist: Vec<String>,
    /// Maximum number of concurrently live sessions (one browser each).
    pub max_sessions: usize,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            base_url: "https://twitter.com".into(),
            user_agent: None,
            viewport_width: None,
            viewport_height: None,
            wait_poll_ms: 100,
            wait_timeout_ms: 30_000,
            stylesheet_allowlist: vec!["twitter_core.bundle.css".into()],
            max_sessions: 8,
        }
    }
}

/// Capability key store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Pre-seeded API key, useful for development setups. Unset in
    /// production: keys are issued over HTTP instead.
    pub dev_key: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = WarbleConfig::default();
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.server.port, 3000);
        assert!(cfg.browser.headless);
        assert_eq!(cfg.browser.base_url, "https://twitter.com");
        assert_eq!(cfg.browser.wait_poll_ms, 100);
        assert_eq!(cfg.browser.wait_timeout_ms, 30_000);
        assert_eq!(
            cfg.browser.stylesheet_allowlist,
            vec!["twitter_core.bundle.css".to_string()]
        );
        assert_eq!(cfg.browser.max_sessions, 8);
        assert!(cfg.auth.dev_key.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let cfg: WarbleConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [browser]
            headless = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert!(!cfg.browser.headless);
        assert_eq!(cfg.browser.base_url, "https://twitter.com");
    }
}
