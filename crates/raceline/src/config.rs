//! Environment-driven server configuration.
//!
//! Read once at startup (after `dotenvy` has loaded any `.env` file):
//!
//! - `PORT` — WebSocket listen port, default 3000
//! - `HTTP_PORT` — status surface port, default `PORT + 1`
//! - `HOST` — bind address, default `0.0.0.0`

use std::env;

use tracing::warn;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Listen configuration for both server surfaces.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub http_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            http_port: DEFAULT_PORT + 1,
        }
    }
}

impl ServerConfig {
    /// Builds the config from process environment variables, falling back
    /// to defaults (with a warning) on unparseable values.
    pub fn from_env() -> Self {
        let port = parse_port(env::var("PORT").ok(), "PORT", DEFAULT_PORT);
        let http_port = parse_port(
            env::var("HTTP_PORT").ok(),
            "HTTP_PORT",
            port.wrapping_add(1),
        );
        let host =
            env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        Self {
            host,
            port,
            http_port,
        }
    }

    /// The WebSocket bind address.
    pub fn ws_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The HTTP status surface bind address.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.http_port)
    }
}

fn parse_port(raw: Option<String>, var: &str, default: u16) -> u16 {
    match raw {
        None => default,
        Some(s) => match s.parse() {
            Ok(port) => port,
            Err(_) => {
                warn!(%var, value = %s, default, "unparseable port, using default");
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.ws_addr(), "0.0.0.0:3000");
        assert_eq!(cfg.http_addr(), "0.0.0.0:3001");
    }

    #[test]
    fn test_parse_port_accepts_valid_value() {
        assert_eq!(parse_port(Some("8080".into()), "PORT", 3000), 8080);
    }

    #[test]
    fn test_parse_port_falls_back_on_garbage() {
        assert_eq!(parse_port(Some("yes".into()), "PORT", 3000), 3000);
        assert_eq!(parse_port(Some("99999".into()), "PORT", 3000), 3000);
        assert_eq!(parse_port(None, "PORT", 3000), 3000);
    }
}
