// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module loads gateway configuration from the environment at startup.
//! Every value is resolved and validated once, before the listener binds;
//! an invalid or missing value aborts the process with a descriptive error.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `GATEWAY_TOKEN_SECRET` | Shared HS256 secret for token verification | Required |
//! | `GATEWAY_TOKEN_ISSUER` | Expected `iss` claim | Optional (not checked) |
//! | `GATEWAY_TOKEN_AUDIENCE` | Expected `aud` claim | Optional (not checked) |
//! | `GATEWAY_ALLOW_EPHEMERAL` | Accept prefixed short-lived test credentials | `false` |
//! | `RATE_LIMIT_MAX_REQUESTS` | Requests admitted per client per window | `100` |
//! | `RATE_LIMIT_WINDOW_SECS` | Rate-limit window length in seconds | `900` |
//! | `AUTH_SERVICE_URL` | Auth service base URL | `http://localhost:3001` |
//! | `GAME_SERVICE_URL` | Game service base URL | `http://localhost:3002` |
//! | `PROFILE_SERVICE_URL` | Profile service base URL | `http://localhost:3003` |
//! | `PROXY_TIMEOUT_SECS` | Total downstream request timeout in seconds | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::proxy::{RouteRule, RouteTable};
use crate::rate_limit::RateLimitSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Token verification settings consumed by the claim resolver.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Shared HS256 secret. Signed tokens not minted with this secret are
    /// rejected as invalid.
    pub secret: String,
    /// When set, the `iss` claim must match exactly.
    pub issuer: Option<String>,
    /// When set, the `aud` claim must match exactly.
    pub audience: Option<String>,
    /// Whether prefixed ephemeral credentials resolve to the fixed test
    /// identity. Off by default; production deployments leave it off.
    pub allow_ephemeral: bool,
}

/// Fully resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthSettings,
    pub rate_limit: RateLimitSettings,
    pub proxy_timeout: Duration,
    pub auth_service_url: Url,
    pub game_service_url: Url,
    pub profile_service_url: Url,
}

impl GatewayConfig {
    /// Loads and validates every setting from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("HOST", "0.0.0.0");
        let port = env_parse("PORT", 8080u16)?;

        let auth = AuthSettings {
            secret: env_required("GATEWAY_TOKEN_SECRET")?,
            issuer: env_optional("GATEWAY_TOKEN_ISSUER"),
            audience: env_optional("GATEWAY_TOKEN_AUDIENCE"),
            allow_ephemeral: env_flag("GATEWAY_ALLOW_EPHEMERAL", false)?,
        };

        let max_requests = env_parse("RATE_LIMIT_MAX_REQUESTS", 100u32)?;
        if max_requests == 0 {
            return Err(ConfigError::InvalidVar {
                name: "RATE_LIMIT_MAX_REQUESTS",
                reason: "must be at least 1".to_string(),
            });
        }
        let window_secs = env_parse("RATE_LIMIT_WINDOW_SECS", 900u64)?;
        if window_secs == 0 {
            return Err(ConfigError::InvalidVar {
                name: "RATE_LIMIT_WINDOW_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        let proxy_timeout_secs = env_parse("PROXY_TIMEOUT_SECS", 30u64)?;
        if proxy_timeout_secs == 0 {
            return Err(ConfigError::InvalidVar {
                name: "PROXY_TIMEOUT_SECS",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(GatewayConfig {
            host,
            port,
            auth,
            rate_limit: RateLimitSettings {
                max_requests,
                window: Duration::from_secs(window_secs),
            },
            proxy_timeout: Duration::from_secs(proxy_timeout_secs),
            auth_service_url: env_url("AUTH_SERVICE_URL", "http://localhost:3001")?,
            game_service_url: env_url("GAME_SERVICE_URL", "http://localhost:3002")?,
            profile_service_url: env_url("PROFILE_SERVICE_URL", "http://localhost:3003")?,
        })
    }

    /// Address the listener binds to.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidVar {
                name: "HOST",
                reason: format!("{}:{} is not a valid socket address", self.host, self.port),
            })
    }

    /// The static routing table: auth routes are public (they issue the
    /// tokens the other services require), game and profile need a resolved
    /// identity before dispatch.
    pub fn route_table(&self) -> RouteTable {
        RouteTable::new(vec![
            RouteRule::new("auth", "/api/auth", self.auth_service_url.clone(), false),
            RouteRule::new("game", "/api/game", self.game_service_url.clone(), true),
            RouteRule::new(
                "profile",
                "/api/profile",
                self.profile_service_url.clone(),
                true,
            ),
        ])
    }
}

fn env_optional(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

fn env_required(name: &'static str) -> Result<String, ConfigError> {
    env_optional(name).ok_or(ConfigError::MissingVar(name))
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_optional(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            name,
            reason: e.to_string(),
        }),
    }
}

fn env_flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env_optional(name) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidVar {
                name,
                reason: format!("expected a boolean, got {other:?}"),
            }),
        },
    }
}

fn env_url(name: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env_or_default(name, default);
    Url::parse(&raw).map_err(|e| ConfigError::InvalidVar {
        name,
        reason: format!("{raw}: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_accepts_common_truthy_and_falsy_spellings() {
        std::env::set_var("TEST_FLAG_TRUTHY", "YES");
        assert!(env_flag("TEST_FLAG_TRUTHY", false).unwrap());
        std::env::set_var("TEST_FLAG_FALSY", "off");
        assert!(!env_flag("TEST_FLAG_FALSY", true).unwrap());
        std::env::remove_var("TEST_FLAG_TRUTHY");
        std::env::remove_var("TEST_FLAG_FALSY");
    }

    #[test]
    fn flag_rejects_garbage() {
        std::env::set_var("TEST_FLAG_GARBAGE", "maybe");
        let err = env_flag("TEST_FLAG_GARBAGE", false).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVar { .. }));
        std::env::remove_var("TEST_FLAG_GARBAGE");
    }

    #[test]
    fn unset_values_fall_back_to_defaults() {
        std::env::remove_var("TEST_UNSET_PARSE");
        assert_eq!(env_parse("TEST_UNSET_PARSE", 42u32).unwrap(), 42);
        assert_eq!(env_or_default("TEST_UNSET_PARSE", "fallback"), "fallback");
        assert!(env_optional("TEST_UNSET_PARSE").is_none());
    }

    #[test]
    fn whitespace_only_values_count_as_unset() {
        std::env::set_var("TEST_BLANK_VALUE", "   ");
        assert!(env_optional("TEST_BLANK_VALUE").is_none());
        assert_eq!(env_or_default("TEST_BLANK_VALUE", "fallback"), "fallback");
        std::env::remove_var("TEST_BLANK_VALUE");
    }

    #[test]
    fn parse_reports_invalid_numbers() {
        std::env::set_var("TEST_BAD_PORT", "not-a-port");
        let err = env_parse("TEST_BAD_PORT", 8080u16).unwrap_err();
        assert!(err.to_string().contains("TEST_BAD_PORT"));
        std::env::remove_var("TEST_BAD_PORT");
    }

    #[test]
    fn missing_secret_is_a_hard_error() {
        std::env::remove_var("TEST_REQUIRED_SECRET");
        let err = env_required("TEST_REQUIRED_SECRET").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn route_table_marks_auth_public_and_the_rest_protected() {
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            auth: AuthSettings {
                secret: "secret".to_string(),
                issuer: None,
                audience: None,
                allow_ephemeral: false,
            },
            rate_limit: RateLimitSettings::default(),
            proxy_timeout: Duration::from_secs(30),
            auth_service_url: Url::parse("http://localhost:3001").unwrap(),
            game_service_url: Url::parse("http://localhost:3002").unwrap(),
            profile_service_url: Url::parse("http://localhost:3003").unwrap(),
        };

        let table = config.route_table();
        assert!(!table.resolve("/api/auth/login").unwrap().requires_auth);
        assert!(table.resolve("/api/game/new").unwrap().requires_auth);
        assert!(table.resolve("/api/profile/me").unwrap().requires_auth);
        assert!(table.resolve("/api/unknown").is_none());
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            auth: AuthSettings {
                secret: "secret".to_string(),
                issuer: None,
                audience: None,
                allow_ephemeral: false,
            },
            rate_limit: RateLimitSettings::default(),
            proxy_timeout: Duration::from_secs(30),
            auth_service_url: Url::parse("http://localhost:3001").unwrap(),
            game_service_url: Url::parse("http://localhost:3002").unwrap(),
            profile_service_url: Url::parse("http://localhost:3003").unwrap(),
        };
        assert_eq!(config.bind_addr().unwrap().port(), 9090);
    }
}
