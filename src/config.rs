//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`).

use std::net::SocketAddr;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-field lines.
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:4000`).
    pub listen_addr: SocketAddr,

    /// Largest inbound WebSocket message accepted, in bytes.
    pub max_frame_bytes: usize,

    /// Largest chat text accepted, in bytes.
    pub max_chat_bytes: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 4000)),
            max_frame_bytes: 64 * 1024,
            max_chat_bytes: 4096,
            log_format: LogFormat::Pretty,
        }
    }
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. `PORT`, when
    /// set, overrides the port of `LISTEN_ADDR`.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` is set but cannot be parsed as
    /// a [`SocketAddr`].
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `LISTEN_ADDR` cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mut listen_addr = match lookup("LISTEN_ADDR") {
            Some(addr) => addr.parse::<SocketAddr>()?,
            None => defaults.listen_addr,
        };
        if let Some(port) = lookup("PORT").and_then(|p| p.parse::<u16>().ok()) {
            listen_addr.set_port(port);
        }

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("json") | Some("JSON") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            listen_addr,
            max_frame_bytes: parse_value(&lookup, "MAX_FRAME_BYTES", defaults.max_frame_bytes),
            max_chat_bytes: parse_value(&lookup, "MAX_CHAT_BYTES", defaults.max_chat_bytes),
            log_format,
        })
    }
}

/// Parses a looked-up value as `T`, returning `default` on missing or
/// invalid values.
fn parse_value<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
