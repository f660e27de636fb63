//! Configuration module for environment variables and application settings

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::access::{AccessPolicy, DEFAULT_LINK_TTL_HOURS};

const DEV_JWT_SECRET: &str = "my-meal-planner-secret-key";

/// Upper bound for token and share link lifetimes (ten years)
const MAX_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,

    /// Session token configuration
    pub auth: AuthConfig,

    /// Google OAuth client configuration
    pub google: GoogleConfig,

    /// Meal plan sharing configuration
    pub sharing: SharingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
    /// Directory of the built frontend, served as the router fallback
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    /// Where the OAuth callback sends the browser once a token is issued
    pub frontend_url: String,
    pub http_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SharingConfig {
    /// TTL applied when a share link request carries none
    pub default_link_ttl_hours: i64,
    pub policy: AccessPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                cors_origins: vec!["http://localhost:5173".to_string()],
                static_dir: None,
            },
            auth: AuthConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                token_ttl_hours: 24 * 7,
            },
            google: GoogleConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_url: "http://localhost:8080/auth/google/callback".to_string(),
                frontend_url: "http://localhost:5173".to_string(),
                http_timeout_secs: 10,
            },
            sharing: SharingConfig {
                default_link_ttl_hours: DEFAULT_LINK_TTL_HOURS,
                policy: AccessPolicy::Strict,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(host) = env::var("SERVER_HOST") {
            config.server.host = host;
        }
        config.server.port = parse_or("PORT", config.server.port);
        if let Ok(origins) = env::var("CORS_ORIGINS") {
            config.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        config.server.static_dir = env::var("STATIC_DIR").ok().map(PathBuf::from);

        match env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => config.auth.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set, using the development secret"),
        }
        config.auth.token_ttl_hours = ttl_hours_or("TOKEN_TTL_HOURS", config.auth.token_ttl_hours);

        config.google.client_id = env::var("GOOGLE_CLIENT_ID").unwrap_or_default();
        config.google.client_secret = env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default();
        if let Ok(url) = env::var("OAUTH_REDIRECT_URL") {
            if !url.is_empty() {
                config.google.redirect_url = url;
            }
        }
        if let Ok(url) = env::var("FRONTEND_URL") {
            if !url.is_empty() {
                config.google.frontend_url = url;
            }
        }
        config.google.http_timeout_secs =
            parse_or("OAUTH_HTTP_TIMEOUT_SECS", config.google.http_timeout_secs);

        config.sharing.default_link_ttl_hours =
            ttl_hours_or("SHARE_LINK_TTL_HOURS", config.sharing.default_link_ttl_hours);
        let strict = parse_or("STRICT_ROLE_ENFORCEMENT", true);
        config.sharing.policy = if strict {
            AccessPolicy::Strict
        } else {
            AccessPolicy::Permissive
        };

        if config.google.client_id.is_empty() {
            tracing::warn!("GOOGLE_CLIENT_ID not set, Google login will be unavailable");
        }

        Ok(config)
    }

    /// Socket address the HTTP listener binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .with_context(|| {
                format!("Invalid bind address {}:{}", self.server.host, self.server.port)
            })
    }
}

fn parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn ttl_hours_or(key: &str, default: i64) -> i64 {
    bounded_ttl(key, parse_or(key, default), default)
}

/// Lifetimes must be positive and at most `MAX_TTL_HOURS`
fn bounded_ttl(key: &str, hours: i64, default: i64) -> i64 {
    if (1..=MAX_TTL_HOURS).contains(&hours) {
        hours
    } else {
        tracing::warn!(key, hours, "TTL out of range, using default");
        default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.token_ttl_hours, 168);
        assert_eq!(config.sharing.default_link_ttl_hours, 168);
        assert_eq!(config.sharing.policy, AccessPolicy::Strict);
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_ttl_outside_range_falls_back_to_default() {
        assert_eq!(bounded_ttl("SHARE_LINK_TTL_HOURS", 0, 168), 168);
        assert_eq!(bounded_ttl("SHARE_LINK_TTL_HOURS", -5, 168), 168);
        assert_eq!(bounded_ttl("TOKEN_TTL_HOURS", 2_000_000_000_000, 168), 168);
        assert_eq!(bounded_ttl("TOKEN_TTL_HOURS", 24, 168), 24);
        assert_eq!(bounded_ttl("TOKEN_TTL_HOURS", MAX_TTL_HOURS, 168), MAX_TTL_HOURS);
    }

    #[test]
    fn test_bind_addr_rejects_garbage_host() {
        let mut config = Config::default();
        config.server.host = "not a host".to_string();
        assert!(config.bind_addr().is_err());
    }
}
