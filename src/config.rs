use dotenvy::dotenv;
use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::auth::roles::AccessPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where bearer tokens get their verification keys from.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKeySource {
    /// OIDC discovery against the issuer, keys from its `jwks_uri`.
    Issuer(String),
    /// Shared HS256 secret, for local development.
    Secret(String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub key_source: TokenKeySource,
    pub client_id: String,
    pub audience: Option<String>,
    pub jwks_cache_ttl: Duration,
    /// Minimum time between two JWKS fetches triggered by unknown key ids.
    pub jwks_min_refresh_interval: Duration,
    pub protected_queries: HashMap<String, String>,
    pub bind_addr: SocketAddr,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// ✅ Load environment variables and set defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env only once

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let mongodb_uri = var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;

        // The issuer wins when both are configured.
        let key_source = match (var("OIDC_ISSUER_URI"), var("JWT_SECRET")) {
            (Some(issuer), _) => TokenKeySource::Issuer(issuer.trim_end_matches('/').to_string()),
            (None, Some(secret)) => TokenKeySource::Secret(secret),
            (None, None) => return Err(ConfigError::Missing("OIDC_ISSUER_URI or JWT_SECRET")),
        };

        let seconds = |name: &'static str, default: u64| match var(name) {
            Some(raw) => raw.parse().map(Duration::from_secs).map_err(|_| ConfigError::Invalid {
                name,
                reason: format!("expected seconds, got {raw:?}"),
            }),
            None => Ok(Duration::from_secs(default)),
        };
        let jwks_cache_ttl = seconds("JWKS_CACHE_TTL_SECS", 300)?;
        let jwks_min_refresh_interval = seconds("JWKS_MIN_REFRESH_SECS", 30)?;

        let protected_queries = match var("GRAPHQL_PROTECTED_QUERIES") {
            Some(raw) => parse_protected_queries(&raw)?,
            None => AccessPolicy::default().rules().clone(),
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "127.0.0.1:3000".to_string());
        let bind_addr = bind_addr.parse().map_err(|_| ConfigError::Invalid {
            name: "BIND_ADDR",
            reason: format!("expected host:port, got {bind_addr:?}"),
        })?;

        Ok(Self {
            mongodb_uri,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "test".to_string()),
            key_source,
            client_id: var("OIDC_CLIENT_ID").unwrap_or_else(|| "demo".to_string()),
            audience: var("OIDC_AUDIENCE"),
            jwks_cache_ttl,
            jwks_min_refresh_interval,
            protected_queries,
            bind_addr,
            log_dir: var("LOG_DIR").map(PathBuf::from),
        })
    }

    /// The issuer tokens must carry, when verifying against an identity provider.
    pub fn issuer(&self) -> Option<&str> {
        match &self.key_source {
            TokenKeySource::Issuer(issuer) => Some(issuer),
            TokenKeySource::Secret(_) => None,
        }
    }

    pub fn access_policy(&self) -> AccessPolicy {
        AccessPolicy::new(self.protected_queries.clone())
    }
}

/// Parses `persons:ADMIN,reports:AUDITOR` into query → role rules.
fn parse_protected_queries(raw: &str) -> Result<HashMap<String, String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (query, role) = entry.split_once(':').ok_or_else(|| ConfigError::Invalid {
                name: "GRAPHQL_PROTECTED_QUERIES",
                reason: format!("expected query:ROLE, got {entry:?}"),
            })?;
            let (query, role) = (query.trim(), role.trim());
            if query.is_empty() || role.is_empty() {
                return Err(ConfigError::Invalid {
                    name: "GRAPHQL_PROTECTED_QUERIES",
                    reason: format!("empty query or role in {entry:?}"),
                });
            }
            Ok((query.to_string(), role.to_string()))
        })
        .collect()
}
