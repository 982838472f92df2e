use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::auth::ClientKeys;
use crate::provider::cloudflare::CLOUDFLARE_API_BASE;

pub const CLIENT_KEYS_ENV: &str = "CLIENT_KEYS";

pub const DEFAULT_IP_HEADERS: [&str; 2] = ["x-forwarded-for", "cf-connecting-ip"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client_keys: ClientKeys,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub whoiam: WhoiamConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// Falls back to the port of the service being run
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: None,
            log_level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self, default_port: u16) -> String {
        format!("{}:{}", self.host, self.port.unwrap_or(default_port))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// No client-side timeout unless set
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_base() -> String {
    CLOUDFLARE_API_BASE.to_string()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WhoiamConfig {
    /// Trusted proxy headers, highest priority first
    #[serde(default = "default_ip_headers")]
    pub ip_headers: Vec<String>,
}

fn default_ip_headers() -> Vec<String> {
    DEFAULT_IP_HEADERS.iter().map(|h| h.to_string()).collect()
}

impl Default for WhoiamConfig {
    fn default() -> Self {
        Self {
            ip_headers: default_ip_headers(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `CLIENT_KEYS` replaces whatever the file configured.
    pub fn with_env_overrides(self) -> Self {
        self.with_client_keys_override(std::env::var(CLIENT_KEYS_ENV).ok().as_deref())
    }

    fn with_client_keys_override(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            self.client_keys = ClientKeys::from_csv(raw);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_file() {
        let config: Config = toml::from_str(
            r#"
            client_keys = ["k0", "k1"]

            [server]
            host = "127.0.0.1"
            port = 8080
            log_level = "debug"

            [upstream]
            api_base = "http://localhost:9999"
            timeout_secs = 5

            [whoiam]
            ip_headers = ["x-real-ip"]
            "#,
        )
        .unwrap();

        assert_eq!(config.client_keys.len(), 2);
        assert!(config.client_keys.validate(Some("1"), Some("k1")).is_ok());
        assert_eq!(config.server.bind_addr(12322), "127.0.0.1:8080");
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.upstream.api_base, "http://localhost:9999");
        assert_eq!(config.upstream.timeout_secs, Some(5));
        assert_eq!(config.whoiam.ip_headers, vec!["x-real-ip"]);
    }

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.client_keys.is_empty());
        assert_eq!(config.server.bind_addr(12321), "0.0.0.0:12321");
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.upstream.api_base, CLOUDFLARE_API_BASE);
        assert_eq!(config.upstream.timeout_secs, None);
        assert_eq!(
            config.whoiam.ip_headers,
            vec!["x-forwarded-for", "cf-connecting-ip"]
        );
    }

    #[test]
    fn client_keys_override_replaces_file_keys() {
        let config: Config = toml::from_str(r#"client_keys = ["from-file"]"#).unwrap();

        let kept = config.clone().with_client_keys_override(None);
        assert!(kept.client_keys.validate(Some("0"), Some("from-file")).is_ok());

        let replaced = config.with_client_keys_override(Some("a,b"));
        assert_eq!(replaced.client_keys.len(), 2);
        assert!(replaced.client_keys.validate(Some("0"), Some("from-file")).is_err());
        assert!(replaced.client_keys.validate(Some("1"), Some("b")).is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Config::load("/nonexistent/ddns-edge.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
