use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::roles::RoleSet;
use super::AuthError;

/// Claim carrying the caller's login name.
pub const PREFERRED_USERNAME: &str = "preferred_username";

/// Claims of a token whose signature, expiry and issuer were already checked.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VerifiedToken {
    claims: Map<String, Value>,
}

impl VerifiedToken {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    pub fn claims(&self) -> &Map<String, Value> {
        &self.claims
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// A claim rendered as a string. Strings come back as-is, other scalars
    /// are formatted, and `null`, objects and arrays give `None`.
    pub fn claim_as_string(&self, name: &str) -> Option<String> {
        match self.claim(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn principal_username(&self) -> Option<String> {
        self.claim_as_string(PREFERRED_USERNAME)
    }
}

/// `{ "resource_access": { "<client>": ... } }`. Entries stay raw so that
/// other clients' shapes never affect extraction.
#[derive(Deserialize)]
struct ResourceAccessClaims {
    resource_access: HashMap<String, Value>,
}

/// `{ "roles": ["ADMIN", ...] }`
#[derive(Deserialize)]
struct ClientAccess {
    roles: Vec<String>,
}

/// Derives `ROLE_`-prefixed authorities from `resource_access.<client_id>.roles`.
///
/// Fails with [`AuthError::MalformedClaims`] when any step of that path is
/// missing or has the wrong shape. A token without the path is a realm
/// configuration problem and is never read as "no roles".
pub fn extract_roles(token: &VerifiedToken, client_id: &str) -> Result<RoleSet, AuthError> {
    let malformed = |reason: String| AuthError::MalformedClaims {
        client: client_id.to_string(),
        reason,
    };

    let claims = Value::Object(token.claims().clone());
    let ResourceAccessClaims { mut resource_access } =
        ResourceAccessClaims::deserialize(&claims).map_err(|e| malformed(e.to_string()))?;

    let client = resource_access
        .remove(client_id)
        .ok_or_else(|| malformed(format!("no entry for client {client_id}")))?;

    let ClientAccess { roles } =
        serde_json::from_value(client).map_err(|e| malformed(e.to_string()))?;

    Ok(roles.into_iter().collect())
}
