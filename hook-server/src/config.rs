//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup; the resulting `Config` is
//! immutable after the server starts listening.

use std::env;
use tracing::warn;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host address to bind the listener to
    pub host: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Optional shared secret compared against the `secret` query parameter.
    /// When unset, the secret check is skipped entirely.
    pub secret: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            host: env::var("GITHOOK_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),

            port: parse_port("GITHOOK_PORT", 9001),

            secret: env::var("GITHOOK_SECRET").ok().filter(|s| !s.is_empty()),
        }
    }

    /// Whether a shared secret is configured.
    pub fn secret_required(&self) -> bool {
        self.secret.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 9001,
            secret: None,
        }
    }
}

/// Parse a port number from an environment variable, falling back on the
/// default when unset or unparseable.
fn parse_port(name: &str, default: u16) -> u16 {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<u16>() {
        Ok(port) => port,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid port value, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_valid() {
        env::set_var("TEST_GITHOOK_PORT", "8080");
        let result = parse_port("TEST_GITHOOK_PORT", 9001);
        assert_eq!(result, 8080);
        env::remove_var("TEST_GITHOOK_PORT");
    }

    #[test]
    fn test_parse_port_default() {
        let result = parse_port("NONEXISTENT_VAR", 9001);
        assert_eq!(result, 9001);
    }

    #[test]
    fn test_parse_port_invalid() {
        env::set_var("TEST_GITHOOK_PORT_BAD", "not-a-port");
        let result = parse_port("TEST_GITHOOK_PORT_BAD", 9001);
        assert_eq!(result, 9001);
        env::remove_var("TEST_GITHOOK_PORT_BAD");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9001);
        assert!(!config.secret_required());
    }
}
