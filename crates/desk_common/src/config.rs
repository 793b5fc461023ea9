//! Desk configuration.
//!
//! Configuration lives in /etc/desk/config.toml (system installs) or
//! ~/.config/desk/config.toml, overridable via the DESK_CONFIG
//! environment variable. Every section has defaults; `load()` never
//! fails — a missing or unparsable file yields the default config with
//! a warning, so the daemon always comes up.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

const CONFIG_FILE: &str = "config.toml";

/// Caller role, decides the dashboard payload shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Director,
    Admin,
    Agent,
    #[default]
    Viewer,
}

impl Role {
    /// Director and admin sessions see the strategic dashboard block
    pub fn sees_strategic(&self) -> bool {
        matches!(self, Self::Director | Self::Admin)
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address; localhost only by default
    pub bind_addr: String,
    /// SQLite database path
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7810".to_string(),
            db_path: PathBuf::from("/var/lib/desk/desk.db"),
        }
    }
}

/// One configured API token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiToken {
    pub token: String,
    pub user: String,
    #[serde(default)]
    pub role: Role,
}

/// Session-token auth settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
}

/// Inbound webhook validation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Shared secret expected in X-Webhook-Token or ?token=
    pub secret: String,
    /// Optional HMAC-SHA256 signing key; when set, X-Hub-Signature-256
    /// is required and verified over the raw body
    pub signing_key: Option<String>,
    /// Empty list = any caller IP
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    /// Sliding 1-minute window budget per caller IP
    pub rate_limit_per_minute: u32,
    /// Capacity bound for the per-IP tracking store
    pub max_tracked_ips: usize,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            signing_key: None,
            allowed_ips: Vec::new(),
            rate_limit_per_minute: 60,
            max_tracked_ips: 1000,
        }
    }
}

/// Client-side retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay_ms: 500,
            timeout_ms: 10_000,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeskConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl DeskConfig {
    /// Resolve the config path: DESK_CONFIG, then /etc/desk, then the
    /// user config directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("DESK_CONFIG") {
            return PathBuf::from(path);
        }
        let system = PathBuf::from("/etc/desk").join(CONFIG_FILE);
        if system.exists() {
            return system;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("desk")
            .join(CONFIG_FILE)
    }

    /// Load from the default path, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::default_path())
    }

    /// Load from an explicit path, falling back to defaults.
    pub fn load_from(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Unparsable config at {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Look up a configured token; `None` means unauthenticated.
    pub fn resolve_token(&self, token: &str) -> Option<&ApiToken> {
        self.auth.tokens.iter().find(|t| t.token == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = DeskConfig::default();
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.webhook.rate_limit_per_minute, 60);
        assert_eq!(config.webhook.max_tracked_ips, 1000);
        assert!(config.auth.tokens.is_empty());
    }

    #[test]
    fn toml_round_trip_keeps_sections() {
        let config = DeskConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[webhook]"));
        assert!(toml_str.contains("[retry]"));
        let back: DeskConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.server.bind_addr, config.server.bind_addr);
    }

    #[test]
    fn partial_file_fills_missing_sections_with_defaults() {
        let partial = r#"
            [server]
            bind_addr = "0.0.0.0:9000"
            db_path = "/tmp/desk-test.db"

            [[auth.tokens]]
            token = "t-123"
            user = "dana"
            role = "director"
        "#;
        let config: DeskConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.retry.max_retries, 2);

        let token = config.resolve_token("t-123").unwrap();
        assert_eq!(token.user, "dana");
        assert!(token.role.sees_strategic());
        assert!(config.resolve_token("nope").is_none());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let config = DeskConfig::load_from(std::path::Path::new("/nonexistent/desk.toml"));
        assert_eq!(config.server.bind_addr, ServerConfig::default().bind_addr);
    }

    #[test]
    fn file_on_disk_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[webhook]\nsecret = \"s3cret\"\nrate_limit_per_minute = 120\nmax_tracked_ips = 500\n",
        )
        .unwrap();

        let config = DeskConfig::load_from(&path);
        assert_eq!(config.webhook.secret, "s3cret");
        assert_eq!(config.webhook.rate_limit_per_minute, 120);
        assert_eq!(config.webhook.max_tracked_ips, 500);
    }

    #[test]
    fn unparsable_file_degrades_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not toml").unwrap();

        let config = DeskConfig::load_from(&path);
        assert_eq!(config.retry.max_retries, RetryConfig::default().max_retries);
    }

    #[test]
    fn viewer_does_not_see_strategic() {
        assert!(Role::Director.sees_strategic());
        assert!(Role::Admin.sees_strategic());
        assert!(!Role::Agent.sees_strategic());
        assert!(!Role::Viewer.sees_strategic());
    }
}
