use std::sync::Arc;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet};
use moka::sync::Cache;
use serde::Deserialize;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use super::AuthError;

const DISCOVERY_PATH: &str = "/.well-known/openid-configuration";
const JWKS_CACHE_KEY: &str = "jwks";
/// Default floor between two fetches caused by unknown `kid`s.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Subset of the OpenID provider metadata document.
#[derive(Debug, Deserialize)]
struct ProviderMetadata {
    issuer: String,
    jwks_uri: String,
}

/// Fetches the issuer's signing keys through OIDC discovery and keeps the
/// key set in a TTL cache. A token naming an unknown `kid` forces a refetch,
/// which picks up rotated keys, at most once per `min_refresh_interval`.
/// Concurrent refreshes share one fetch.
pub struct JwksClient {
    http: reqwest::Client,
    issuer: String,
    jwks_uri: OnceCell<String>,
    cache: Cache<&'static str, Arc<JwkSet>>,
    last_refresh: Mutex<Option<Instant>>,
    min_refresh_interval: Duration,
}

impl JwksClient {
    pub fn new(issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            issuer: issuer.into().trim_end_matches('/').to_string(),
            jwks_uri: OnceCell::new(),
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            last_refresh: Mutex::new(None),
            min_refresh_interval: MIN_REFRESH_INTERVAL,
        }
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Signing key for `kid`. Without a `kid` the set must hold exactly one key.
    pub async fn key(&self, kid: Option<&str>) -> Result<Jwk, AuthError> {
        if let Some(cached) = self.cache.get(JWKS_CACHE_KEY) {
            if let Some(jwk) = select(&cached, kid) {
                return Ok(jwk);
            }
            debug!(?kid, "Signing key not in cached JWKS");
        }

        let jwks = self.refresh(kid).await?;
        select(&jwks, kid).ok_or_else(|| match kid {
            Some(kid) => AuthError::InvalidToken(format!("unknown signing key {kid}")),
            None => AuthError::InvalidToken("token has no kid and the issuer publishes several keys".into()),
        })
    }

    async fn refresh(&self, kid: Option<&str>) -> Result<Arc<JwkSet>, AuthError> {
        let mut last_refresh = self.last_refresh.lock().await;

        // Whoever held the lock before may already have fetched what this caller needs.
        if let Some(cached) = self.cache.get(JWKS_CACHE_KEY) {
            let recent = last_refresh.is_some_and(|at| at.elapsed() < self.min_refresh_interval);
            if recent || select(&cached, kid).is_some() {
                if recent {
                    debug!(?kid, "JWKS refreshed recently, not refetching");
                }
                return Ok(cached);
            }
        }

        let jwks_uri = self.jwks_uri.get_or_try_init(|| self.discover()).await?;

        let jwks: JwkSet = self
            .http
            .get(jwks_uri)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AuthError::KeyDiscovery(format!("GET {jwks_uri}: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::KeyDiscovery(format!("invalid JWKS from {jwks_uri}: {e}")))?;

        info!(keys = jwks.keys.len(), %jwks_uri, "Loaded signing keys");
        let jwks = Arc::new(jwks);
        self.cache.insert(JWKS_CACHE_KEY, jwks.clone());
        *last_refresh = Some(Instant::now());
        Ok(jwks)
    }

    async fn discover(&self) -> Result<String, AuthError> {
        let url = format!("{}{}", self.issuer, DISCOVERY_PATH);

        let metadata: ProviderMetadata = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| AuthError::KeyDiscovery(format!("GET {url}: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::KeyDiscovery(format!("invalid provider metadata from {url}: {e}")))?;

        if metadata.issuer.trim_end_matches('/') != self.issuer {
            warn!(expected = %self.issuer, advertised = %metadata.issuer, "Issuer mismatch in provider metadata");
            return Err(AuthError::KeyDiscovery(format!(
                "provider advertises issuer {} but {} is configured",
                metadata.issuer, self.issuer
            )));
        }

        Ok(metadata.jwks_uri)
    }
}

fn select(jwks: &JwkSet, kid: Option<&str>) -> Option<Jwk> {
    match kid {
        Some(kid) => jwks.find(kid).cloned(),
        None if jwks.keys.len() == 1 => jwks.keys.first().cloned(),
        None => None,
    }
}
