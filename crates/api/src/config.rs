//! Application configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use gateway::GatewayConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `3000`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `GATEWAY_BASE_URL` — payment provider API base
/// - `GATEWAY_CHANNEL_ID` — provider-assigned channel id (`cid`)
/// - `GATEWAY_SECRET` — shared secret for the Authorization header
/// - `GATEWAY_TIMEOUT_MS` — provider call timeout (default: `5000`)
/// - `PUBLIC_BASE_URL` — externally reachable base for provider callbacks
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub gateway_base_url: String,
    pub gateway_channel_id: String,
    pub gateway_secret: String,
    pub gateway_timeout_ms: u64,
    pub public_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            gateway_base_url: std::env::var("GATEWAY_BASE_URL")
                .unwrap_or_else(|_| "https://pay.example.com".to_string()),
            gateway_channel_id: std::env::var("GATEWAY_CHANNEL_ID")
                .unwrap_or_else(|_| "CH-TEST".to_string()),
            gateway_secret: std::env::var("GATEWAY_SECRET").unwrap_or_default(),
            gateway_timeout_ms: std::env::var("GATEWAY_TIMEOUT_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(5000),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Builds the gateway client configuration, deriving the three provider
    /// callback URLs from the public base URL.
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.gateway_base_url.clone(),
            channel_id: self.gateway_channel_id.clone(),
            secret: self.gateway_secret.clone(),
            timeout: Duration::from_millis(self.gateway_timeout_ms),
            approval_url: format!("{}/pays/success", self.public_base_url),
            cancel_url: format!("{}/pays/cancel", self.public_base_url),
            fail_url: format!("{}/pays/fail", self.public_base_url),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            gateway_base_url: "https://pay.example.com".to_string(),
            gateway_channel_id: "CH-TEST".to_string(),
            gateway_secret: String::new(),
            gateway_timeout_ms: 5000,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("log_level", &self.log_level)
            .field("gateway_base_url", &self.gateway_base_url)
            .field("gateway_channel_id", &self.gateway_channel_id)
            .field("gateway_secret", &"<redacted>")
            .field("gateway_timeout_ms", &self.gateway_timeout_ms)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.gateway_timeout_ms, 5000);
    }

    #[test]
    fn addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn gateway_config_derives_callback_urls() {
        let config = Config {
            public_base_url: "https://shop.example.com".to_string(),
            ..Config::default()
        };
        let gateway = config.gateway_config();
        assert_eq!(gateway.approval_url, "https://shop.example.com/pays/success");
        assert_eq!(gateway.cancel_url, "https://shop.example.com/pays/cancel");
        assert_eq!(gateway.fail_url, "https://shop.example.com/pays/fail");
    }

    #[test]
    fn debug_redacts_gateway_secret() {
        let config = Config {
            gateway_secret: "top-secret".to_string(),
            ..Config::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("top-secret"));
    }
}
