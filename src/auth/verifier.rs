use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};

use super::claims::VerifiedToken;
use super::jwks::JwksClient;
use super::AuthError;
use crate::config::{Config, TokenKeySource};

enum KeySource {
    Jwks(JwksClient),
    Secret(DecodingKey),
}

/// ✅ **Bearer token verification**: signature, expiry, issuer and (optionally) audience.
pub struct TokenVerifier {
    keys: KeySource,
    issuer: Option<String>,
    audience: Option<String>,
}

impl TokenVerifier {
    /// Verifies against keys published by `issuer` (OIDC discovery).
    pub fn with_issuer(issuer: &str, jwks_cache_ttl: std::time::Duration) -> Self {
        Self::with_jwks(JwksClient::new(issuer, jwks_cache_ttl))
    }

    /// Verifies against an already configured key client; its issuer becomes the required `iss`.
    pub fn with_jwks(client: JwksClient) -> Self {
        let issuer = client.issuer().to_string();
        Self {
            keys: KeySource::Jwks(client),
            issuer: Some(issuer),
            audience: None,
        }
    }

    /// Verifies HS256 tokens signed with a shared secret.
    pub fn with_secret(secret: &str) -> Self {
        Self {
            keys: KeySource::Secret(DecodingKey::from_secret(secret.as_bytes())),
            issuer: None,
            audience: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let verifier = match &config.key_source {
            TokenKeySource::Issuer(issuer) => Self::with_jwks(
                JwksClient::new(issuer, config.jwks_cache_ttl)
                    .with_min_refresh_interval(config.jwks_min_refresh_interval),
            ),
            TokenKeySource::Secret(secret) => Self::with_secret(secret),
        };
        verifier.with_audience(config.audience.clone())
    }

    pub fn with_audience(mut self, audience: Option<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Requires tokens to carry this `iss`. Issuer-backed verifiers set it already.
    pub fn with_required_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub async fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let header = decode_header(token)?;

        let (key, algorithm) = match &self.keys {
            KeySource::Secret(key) => (key.clone(), Algorithm::HS256),
            KeySource::Jwks(client) => {
                let jwk = client.key(header.kid.as_deref()).await?;
                let algorithm = match &jwk.common.key_algorithm {
                    Some(alg) => alg.to_string().parse::<Algorithm>().map_err(|_| {
                        AuthError::InvalidToken(format!("key algorithm {alg} cannot verify signatures"))
                    })?,
                    None => header.alg,
                };
                (DecodingKey::from_jwk(&jwk)?, algorithm)
            }
        };

        let mut validation = Validation::new(algorithm);
        if let Some(issuer) = &self.issuer {
            // `set_issuer` alone only compares `iss` when the token carries one.
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }
        match &self.audience {
            Some(audience) => validation.set_audience(&[audience]),
            // Access tokens from Keycloak carry `aud: account`; only check it when asked to.
            None => validation.validate_aud = false,
        }

        let data = decode::<Map<String, Value>>(token, &key, &validation)?;
        Ok(VerifiedToken::new(data.claims))
    }
}
