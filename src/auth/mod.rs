//! Bearer-token authentication and role-based authorization.
//!
//! - `verifier` / `jwks` check a token's signature, expiry and issuer
//! - `claims` turns verified claims into a [`RoleSet`]
//! - `roles` decides whether a role set may run a given query

pub mod claims;
pub mod jwks;
pub mod roles;
pub mod verifier;

use async_graphql::ErrorExtensions;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::utils::api_response::ApiResponse;

pub use claims::{extract_roles, VerifiedToken};
pub use roles::{AccessPolicy, RoleSet};
pub use verifier::TokenVerifier;

/// GraphQL error classification reported for denied queries.
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authorization header must use the Bearer scheme")]
    MissingBearer,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("Could not load signing keys: {0}")]
    KeyDiscovery(String),
    #[error("Token claims lack resource_access.{client}.roles: {reason}")]
    MalformedClaims { client: String, reason: String },
    #[error("Unauthorized")]
    Unauthorized,
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingBearer => StatusCode::BAD_REQUEST,
            AuthError::KeyDiscovery(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::InvalidToken(_) | AuthError::MalformedClaims { .. } => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::error(self.status(), self.to_string(), None).into_response()
    }
}

impl ErrorExtensions for AuthError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            let classification = match self {
                AuthError::Unauthorized => UNAUTHORIZED,
                _ => "INTERNAL_ERROR",
            };
            e.set("classification", classification);
            e.set("code", classification);
        })
    }
}

/// An authenticated caller: the verified token plus the roles derived from it.
#[derive(Clone, Debug)]
pub struct Principal {
    pub token: VerifiedToken,
    pub roles: RoleSet,
}

impl Principal {
    pub fn new(token: VerifiedToken, roles: RoleSet) -> Self {
        Self { token, roles }
    }

    pub fn username(&self) -> Option<String> {
        self.token.principal_username()
    }
}
